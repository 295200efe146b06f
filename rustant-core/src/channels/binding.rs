//! Agent bindings — specificity-ordered matching of incoming context to an agent.
//!
//! Generalizes `routing::ChannelRouter`'s flat `priority: u32` rule list into
//! the fixed specificity tiers a session router needs: peer bindings always
//! outrank guild bindings, which always outrank a channel-wide default,
//! regardless of registration order within a tier.

use super::ChannelType;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A match rule for an `AgentBinding`, ordered here most-specific first.
/// `specificity_rank` reflects that order and is used to sort bindings
/// before resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BindingMatch {
    /// A specific DM peer on a specific channel.
    Peer { channel_type: ChannelType, peer_id: String },
    /// A peer within a specific parent/thread context (e.g. a DM that
    /// originated from a specific guild invite).
    PeerWithParent {
        channel_type: ChannelType,
        peer_id: String,
        parent_id: String,
    },
    /// A guild/team scoped to specific roles.
    GuildWithRoles {
        channel_type: ChannelType,
        guild_id: String,
        roles: Vec<String>,
    },
    /// Any member of a guild/team.
    GuildOrTeam { channel_type: ChannelType, guild_id: String },
    /// Any conversation under a specific account (e.g. a bot token/workspace).
    Account { channel_type: ChannelType, account_id: String },
    /// Any conversation on a channel type.
    Channel { channel_type: ChannelType },
    /// Matches anything; used as the final fallback.
    Default,
}

impl BindingMatch {
    /// Lower rank = more specific = tried first.
    fn specificity_rank(&self) -> u8 {
        match self {
            Self::Peer { .. } => 0,
            Self::PeerWithParent { .. } => 1,
            Self::GuildWithRoles { .. } => 2,
            Self::GuildOrTeam { .. } => 3,
            Self::Account { .. } => 4,
            Self::Channel { .. } => 5,
            Self::Default => 6,
        }
    }
}

/// A configured binding from a match rule to an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentBinding {
    pub agent_id: Uuid,
    pub match_rule: BindingMatch,
}

/// Context gathered from an inbound message, used to evaluate bindings.
#[derive(Debug, Clone, Default)]
pub struct RouteContext {
    pub channel_type: Option<ChannelType>,
    pub peer_id: Option<String>,
    pub parent_id: Option<String>,
    pub guild_id: Option<String>,
    pub roles: Vec<String>,
    pub account_id: Option<String>,
}

impl RouteContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel(mut self, ct: ChannelType) -> Self {
        self.channel_type = Some(ct);
        self
    }

    pub fn with_peer(mut self, peer_id: impl Into<String>) -> Self {
        self.peer_id = Some(peer_id.into());
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_guild(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.roles = roles;
        self
    }

    pub fn with_account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }
}

fn matches(rule: &BindingMatch, ctx: &RouteContext) -> bool {
    match rule {
        BindingMatch::Peer { channel_type, peer_id } => {
            ctx.channel_type.as_ref() == Some(channel_type) && ctx.peer_id.as_deref() == Some(peer_id.as_str())
        }
        BindingMatch::PeerWithParent {
            channel_type,
            peer_id,
            parent_id,
        } => {
            ctx.channel_type.as_ref() == Some(channel_type)
                && ctx.peer_id.as_deref() == Some(peer_id.as_str())
                && ctx.parent_id.as_deref() == Some(parent_id.as_str())
        }
        BindingMatch::GuildWithRoles {
            channel_type,
            guild_id,
            roles,
        } => {
            if roles.is_empty() {
                return false;
            }
            ctx.channel_type.as_ref() == Some(channel_type)
                && ctx.guild_id.as_deref() == Some(guild_id.as_str())
                && roles.iter().any(|r| ctx.roles.contains(r))
        }
        BindingMatch::GuildOrTeam { channel_type, guild_id } => {
            ctx.channel_type.as_ref() == Some(channel_type) && ctx.guild_id.as_deref() == Some(guild_id.as_str())
        }
        BindingMatch::Account { channel_type, account_id } => {
            ctx.channel_type.as_ref() == Some(channel_type) && ctx.account_id.as_deref() == Some(account_id.as_str())
        }
        BindingMatch::Channel { channel_type } => ctx.channel_type.as_ref() == Some(channel_type),
        BindingMatch::Default => true,
    }
}

/// Resolve the agent that should handle a given context, trying each
/// binding in specificity order (most specific first, stable within a tier).
pub fn resolve_binding(bindings: &[AgentBinding], ctx: &RouteContext) -> Option<Uuid> {
    let mut ordered: Vec<&AgentBinding> = bindings.iter().collect();
    ordered.sort_by_key(|b| b.match_rule.specificity_rank());
    ordered.iter().find(|b| matches(&b.match_rule, ctx)).map(|b| b.agent_id)
}
