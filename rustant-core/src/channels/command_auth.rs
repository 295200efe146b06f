//! Command authorization — who may invoke what, and ownership fallback.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Per-command allow lists, keyed by command name (without leading prefix).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllowFromConfig {
    #[serde(flatten)]
    pub commands: HashMap<String, Vec<String>>,
}

impl AllowFromConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_command(mut self, command: impl Into<String>, allow: Vec<String>) -> Self {
        self.commands.insert(command.into(), allow);
        self
    }
}

static CONVERSATION_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(@g\.us$|^chat_id:|^(channel|group|thread|topic|room|space):)").unwrap()
});

/// Whether an identity string looks like a conversation (group/channel/thread)
/// rather than an individual sender. Such identities are never treated as
/// authorized senders for ownership checks.
pub fn is_conversation_like(id: &str) -> bool {
    CONVERSATION_LIKE.is_match(id)
}

/// Check whether any of `sender_candidates` is authorized to invoke `command`.
///
/// Resolution order: per-command `allow_from` entry if present, else
/// `owner_allow_from` as the global fallback. Candidates that look like
/// conversation identities are skipped.
pub fn is_authorized(
    command: &str,
    sender_candidates: &[String],
    allow_from: &AllowFromConfig,
    owner_allow_from: &[String],
) -> bool {
    let allow_list: &[String] = match allow_from.commands.get(command).or_else(|| allow_from.commands.get("*")) {
        Some(list) => list,
        None => owner_allow_from,
    };

    if allow_list.iter().any(|a| a == "*") {
        return true;
    }

    sender_candidates
        .iter()
        .filter(|c| !is_conversation_like(c))
        .any(|c| allow_list.iter().any(|a| a == c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_like_patterns() {
        assert!(is_conversation_like("12345@g.us"));
        assert!(is_conversation_like("chat_id:98765"));
        assert!(is_conversation_like("channel:general"));
        assert!(is_conversation_like("group:team-x"));
        assert!(is_conversation_like("thread:abc"));
        assert!(is_conversation_like("topic:news"));
        assert!(is_conversation_like("room:lobby"));
        assert!(is_conversation_like("space:eng"));
        assert!(!is_conversation_like("user-123"));
        assert!(!is_conversation_like("alice@example.com"));
    }

    #[test]
    fn test_authorized_via_command_specific_allow_from() {
        let allow = AllowFromConfig::new().with_command("deploy", vec!["alice".into()]);
        assert!(is_authorized("deploy", &["alice".into()], &allow, &["bob".into()]));
        assert!(!is_authorized("deploy", &["bob".into()], &allow, &["bob".into()]));
    }

    #[test]
    fn test_falls_back_to_owner_allow_from() {
        let allow = AllowFromConfig::new();
        assert!(is_authorized("restart", &["owner1".into()], &allow, &["owner1".into()]));
        assert!(!is_authorized("restart", &["stranger".into()], &allow, &["owner1".into()]));
    }

    #[test]
    fn test_conversation_like_candidate_never_authorizes() {
        let allow = AllowFromConfig::new();
        let owner = vec!["channel:general".to_string()];
        assert!(!is_authorized("x", &["channel:general".into()], &allow, &owner));
    }

    #[test]
    fn test_candidate_resolution_order_first_match_wins() {
        let allow = AllowFromConfig::new().with_command("x", vec!["canonical-id".into()]);
        let candidates = vec!["raw-platform-id".to_string(), "canonical-id".to_string()];
        assert!(is_authorized("x", &candidates, &allow, &[]));
    }

    #[test]
    fn test_wildcard_entry_allows_any_sender() {
        let allow = AllowFromConfig::new().with_command("deploy", vec!["*".into()]);
        assert!(is_authorized("deploy", &["anyone".into()], &allow, &[]));
    }

    #[test]
    fn test_wildcard_fallback_entry_used_when_command_unlisted() {
        let allow = AllowFromConfig::new().with_command("*", vec!["*".into()]);
        assert!(is_authorized("unrelated", &["anyone".into()], &allow, &["owner1".into()]));
    }
}
