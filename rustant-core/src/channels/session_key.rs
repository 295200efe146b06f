//! Canonical session keys — the routable identity of a conversation.
//!
//! A `SessionKey` is the string an `AgentBinding` resolves to and that the
//! cron scheduler's `session_target` and the reply dispatcher both key off
//! of. Construction is infallible: whatever scope/suffix is supplied
//! produces a valid key, so validation belongs at the caller (e.g. rejecting
//! an empty peer id before calling `SessionKey::new`).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a direct-message conversation maps onto a session key suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DmScope {
    /// One session per peer, shared across every channel/account they use.
    PerPeer,
    /// One session per (channel, peer) pair.
    PerChannelPeer,
    /// One session per (account, channel, peer) triple.
    PerAccountChannelPeer,
}

/// A canonical, opaque session identifier: `agent:<agent_id>:<suffix>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey(pub String);

impl SessionKey {
    /// Build a session key from its constituent parts.
    pub fn new(agent_id: Uuid, suffix: impl Into<String>) -> Self {
        Self(format!("agent:{}:{}", agent_id, suffix.into()))
    }

    /// Build the suffix for a direct-message conversation according to scope,
    /// using the literal suffix forms the canonical session key grammar
    /// mandates: `direct:<peerId>`, `<channel>:direct:<peerId>`, and
    /// `<channel>:<account>:direct:<peerId>`.
    pub fn dm_suffix(
        scope: DmScope,
        channel_type: &str,
        account_id: Option<&str>,
        peer_id: &str,
    ) -> String {
        match scope {
            DmScope::PerPeer => format!("direct:{peer_id}"),
            DmScope::PerChannelPeer => format!("{channel_type}:direct:{peer_id}"),
            DmScope::PerAccountChannelPeer => {
                let account = account_id.unwrap_or("default");
                format!("{channel_type}:{account}:direct:{peer_id}")
            }
        }
    }

    /// Build the suffix for a multi-party conversation, with an optional
    /// thread id appended as `:topic:<threadId>`. `kind` distinguishes an
    /// ad-hoc group (`<channel>:group:<id>`) from a named channel
    /// (`<channel>:channel:<id>`) — the two never share a suffix form, since
    /// the same id could otherwise collide across the two peer kinds.
    pub fn group_suffix(channel_type: &str, kind: GroupKind, id: &str, thread_id: Option<&str>) -> String {
        let marker = kind.as_str();
        match thread_id {
            Some(t) => format!("{channel_type}:{marker}:{id}:topic:{t}"),
            None => format!("{channel_type}:{marker}:{id}"),
        }
    }

    /// The session key's non-thread form, for a threaded group/channel
    /// suffix produced by `group_suffix`.
    pub fn parent_group_suffix(channel_type: &str, kind: GroupKind, id: &str) -> String {
        Self::group_suffix(channel_type, kind, id, None)
    }

    /// The well-known suffix for an agent's primary, non-scoped session.
    pub fn main_suffix() -> String {
        "main".to_string()
    }

    /// Suffix for a detached subagent session.
    pub fn subagent_suffix(subagent_id: &str) -> String {
        format!("subagent:{subagent_id}")
    }

    /// Suffix for a cron job's session, optionally scoped to one run.
    pub fn cron_suffix(job_id: &str, run_id: Option<&str>) -> String {
        match run_id {
            Some(r) => format!("cron:{job_id}:run:{r}"),
            None => format!("cron:{job_id}"),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Distinguishes an ad-hoc multi-party group from a named channel for
/// session-key suffix purposes (spec.md §4.1 step 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    Group,
    Channel,
}

impl GroupKind {
    fn as_str(self) -> &'static str {
        match self {
            GroupKind::Group => "group",
            GroupKind::Channel => "channel",
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maps an alias identity (e.g. a platform-specific user id) to the
/// canonical peer id it should route as.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityLink {
    pub alias_id: String,
    pub canonical_peer_id: String,
}

/// A flattened set of identity links, resolved once at construction so
/// lookups never chain through more than one hop.
#[derive(Debug, Clone, Default)]
pub struct IdentityLinks {
    links: std::collections::HashMap<String, String>,
}

impl IdentityLinks {
    pub fn new(links: Vec<IdentityLink>) -> Self {
        let mut map = std::collections::HashMap::new();
        for link in links {
            map.insert(link.alias_id, link.canonical_peer_id);
        }
        // Flatten any alias that itself points at another alias.
        let keys: Vec<String> = map.keys().cloned().collect();
        for key in keys {
            let mut target = map.get(&key).cloned().unwrap();
            let mut hops = 0;
            while let Some(next) = map.get(&target) {
                if *next == target || hops > 16 {
                    break;
                }
                target = next.clone();
                hops += 1;
            }
            map.insert(key, target);
        }
        Self { links: map }
    }

    /// Resolve a raw identity to its canonical peer id, or itself if unlinked.
    pub fn resolve<'a>(&'a self, raw_id: &'a str) -> &'a str {
        self.links.get(raw_id).map(|s| s.as_str()).unwrap_or(raw_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_dm_per_peer() {
        let agent = Uuid::new_v4();
        let suffix = SessionKey::dm_suffix(DmScope::PerPeer, "telegram", None, "u1");
        let key = SessionKey::new(agent, suffix);
        assert_eq!(key.as_str(), format!("agent:{}:direct:u1", agent));
    }

    #[test]
    fn test_session_key_dm_per_channel_peer() {
        let agent = Uuid::new_v4();
        let suffix = SessionKey::dm_suffix(DmScope::PerChannelPeer, "slack", None, "u1");
        let key = SessionKey::new(agent, suffix);
        assert_eq!(key.as_str(), format!("agent:{}:slack:direct:u1", agent));
    }

    #[test]
    fn test_session_key_dm_per_account_channel_peer() {
        let agent = Uuid::new_v4();
        let suffix =
            SessionKey::dm_suffix(DmScope::PerAccountChannelPeer, "discord", Some("acc1"), "u1");
        let key = SessionKey::new(agent, suffix);
        assert_eq!(key.as_str(), format!("agent:{}:discord:acc1:direct:u1", agent));
    }

    #[test]
    fn test_session_key_group_suffix_no_thread() {
        let suffix = SessionKey::group_suffix("mattermost", GroupKind::Group, "chan1", None);
        assert_eq!(suffix, "mattermost:group:chan1");
    }

    #[test]
    fn test_session_key_group_suffix_with_thread() {
        let suffix = SessionKey::group_suffix("mattermost", GroupKind::Group, "chan1", Some("root123"));
        assert_eq!(suffix, "mattermost:group:chan1:topic:root123");
    }

    #[test]
    fn test_session_key_channel_suffix_distinct_from_group() {
        let group = SessionKey::group_suffix("discord", GroupKind::Group, "id1", None);
        let channel = SessionKey::group_suffix("discord", GroupKind::Channel, "id1", None);
        assert_eq!(group, "discord:group:id1");
        assert_eq!(channel, "discord:channel:id1");
        assert_ne!(group, channel);
    }

    #[test]
    fn test_session_key_parent_group_suffix_drops_thread() {
        let threaded = SessionKey::group_suffix("slack", GroupKind::Channel, "c1", Some("t1"));
        let parent = SessionKey::parent_group_suffix("slack", GroupKind::Channel, "c1");
        assert_eq!(threaded, "slack:channel:c1:topic:t1");
        assert_eq!(parent, "slack:channel:c1");
    }

    #[test]
    fn test_session_key_main_subagent_cron_suffixes_share_namespace() {
        assert_eq!(SessionKey::main_suffix(), "main");
        assert_eq!(SessionKey::subagent_suffix("sub1"), "subagent:sub1");
        assert_eq!(SessionKey::cron_suffix("job1", None), "cron:job1");
        assert_eq!(SessionKey::cron_suffix("job1", Some("run1")), "cron:job1:run:run1");
    }

    #[test]
    fn test_identity_links_resolve_unlinked_passthrough() {
        let links = IdentityLinks::new(vec![]);
        assert_eq!(links.resolve("raw"), "raw");
    }

    #[test]
    fn test_identity_links_resolve_direct() {
        let links = IdentityLinks::new(vec![IdentityLink {
            alias_id: "slack:u1".into(),
            canonical_peer_id: "person:alice".into(),
        }]);
        assert_eq!(links.resolve("slack:u1"), "person:alice");
        assert_eq!(links.resolve("other"), "other");
    }

    #[test]
    fn test_identity_links_flatten_chain() {
        let links = IdentityLinks::new(vec![
            IdentityLink {
                alias_id: "a".into(),
                canonical_peer_id: "b".into(),
            },
            IdentityLink {
                alias_id: "b".into(),
                canonical_peer_id: "c".into(),
            },
        ]);
        assert_eq!(links.resolve("a"), "c");
        assert_eq!(links.resolve("b"), "c");
    }
}
