//! Reply dispatch — resolves a session key back to a channel/conversation so
//! both regular message replies and cron/heartbeat delivery callbacks can
//! reply through the same path.

use async_trait::async_trait;

use super::session_key::SessionKey;
use super::{ChannelManager, ChannelMessage, ChannelType, ChannelUser, MessageId};
use crate::error::{ChannelError, RustantError};

/// Destination a session key resolves to: enough to build a `ChannelMessage`
/// and to look it up in a `ChannelManager` (keyed by registered channel name,
/// not by `ChannelType` — an account may run several instances of one type).
#[derive(Debug, Clone)]
pub struct ReplyTarget {
    pub channel_name: String,
    pub channel_type: ChannelType,
    pub channel_id: String,
    pub thread_id: Option<super::ThreadId>,
}

/// Resolves session keys to reply targets. Implementations typically look up
/// a routing table maintained alongside `AgentBinding`s.
pub trait SessionKeyResolver: Send + Sync {
    fn resolve(&self, session_key: &SessionKey) -> Option<ReplyTarget>;
}

/// Dispatches replies/deliveries to a resolved channel destination via a
/// `ChannelManager`.
#[async_trait]
pub trait ReplyDispatcher: Send + Sync {
    async fn dispatch(&self, session_key: &SessionKey, text: &str) -> Result<MessageId, RustantError>;
}

/// Default dispatcher implementation backed by a `ChannelManager` and a
/// `SessionKeyResolver`.
pub struct ChannelReplyDispatcher<R: SessionKeyResolver> {
    manager: std::sync::Arc<ChannelManager>,
    resolver: R,
}

impl<R: SessionKeyResolver> ChannelReplyDispatcher<R> {
    pub fn new(manager: std::sync::Arc<ChannelManager>, resolver: R) -> Self {
        Self { manager, resolver }
    }
}

#[async_trait]
impl<R: SessionKeyResolver> ReplyDispatcher for ChannelReplyDispatcher<R> {
    async fn dispatch(&self, session_key: &SessionKey, text: &str) -> Result<MessageId, RustantError> {
        let target = self.resolver.resolve(session_key).ok_or_else(|| {
            RustantError::Channel(ChannelError::NotConnected {
                name: session_key.as_str().to_string(),
            })
        })?;

        let sender = ChannelUser::new("agent", target.channel_type);
        let mut msg = ChannelMessage::text(target.channel_type, target.channel_id.clone(), sender, text);
        if let Some(thread_id) = target.thread_id {
            msg = msg.with_thread(thread_id);
        }

        self.manager.send_to(&target.channel_name, msg).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use uuid::Uuid;

    struct StaticResolver {
        targets: HashMap<String, ReplyTarget>,
    }

    impl SessionKeyResolver for StaticResolver {
        fn resolve(&self, session_key: &SessionKey) -> Option<ReplyTarget> {
            self.targets.get(session_key.as_str()).cloned()
        }
    }

    #[test]
    fn test_resolver_returns_none_for_unknown_key() {
        let resolver = StaticResolver {
            targets: HashMap::new(),
        };
        let key = SessionKey::new(Uuid::new_v4(), "dm:u1");
        assert!(resolver.resolve(&key).is_none());
    }

    #[test]
    fn test_resolver_returns_configured_target() {
        let agent = Uuid::new_v4();
        let key = SessionKey::new(agent, "dm:u1");
        let mut targets = HashMap::new();
        targets.insert(
            key.as_str().to_string(),
            ReplyTarget {
                channel_name: "mm".into(),
                channel_type: ChannelType::Mattermost,
                channel_id: "chan1".into(),
                thread_id: None,
            },
        );
        let resolver = StaticResolver { targets };
        let target = resolver.resolve(&key).unwrap();
        assert_eq!(target.channel_id, "chan1");
        assert_eq!(target.channel_type, ChannelType::Mattermost);
    }

    // Silence unused-import warnings for Mutex when only used in doc context.
    #[allow(dead_code)]
    fn _touch(_m: &Mutex<()>) {}
}
