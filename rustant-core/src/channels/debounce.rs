//! Per-conversation debouncing — buffers rapid consecutive messages from the
//! same sender/conversation into a single downstream dispatch.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::ChannelType;

/// Identifies a debounce bucket: one per (channel, conversation).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DebounceKey(pub String);

impl DebounceKey {
    pub fn build(channel_type: ChannelType, channel_id: &str, sender_id: &str) -> Self {
        Self(format!("{}:{}:{}", channel_type, channel_id, sender_id))
    }
}

#[derive(Debug, Clone)]
struct Bucket {
    buffered_text: Vec<String>,
    last_activity: DateTime<Utc>,
}

/// Buffers rapid-fire messages per conversation, flushing after a quiet window.
pub struct Debouncer {
    quiet_window: chrono::Duration,
    buckets: HashMap<DebounceKey, Bucket>,
}

impl Debouncer {
    pub fn new(quiet_window: chrono::Duration) -> Self {
        Self {
            quiet_window,
            buckets: HashMap::new(),
        }
    }

    /// Record an incoming message for `key`. Returns `true` if the caller
    /// should hold off dispatching (still within the quiet window), `false`
    /// if this message should flush immediately (first message in a new bucket
    /// is never itself held — the window starts after it arrives).
    pub fn should_debounce(&mut self, key: DebounceKey, text: &str, now: DateTime<Utc>) -> bool {
        match self.buckets.get_mut(&key) {
            Some(bucket) => {
                let within_window = now - bucket.last_activity < self.quiet_window;
                bucket.buffered_text.push(text.to_string());
                bucket.last_activity = now;
                within_window
            }
            None => {
                self.buckets.insert(
                    key,
                    Bucket {
                        buffered_text: vec![text.to_string()],
                        last_activity: now,
                    },
                );
                false
            }
        }
    }

    /// Whether `key`'s bucket is ready to flush (quiet window elapsed).
    pub fn is_ready_to_flush(&self, key: &DebounceKey, now: DateTime<Utc>) -> bool {
        match self.buckets.get(key) {
            Some(bucket) => now - bucket.last_activity >= self.quiet_window,
            None => false,
        }
    }

    /// Flush a bucket, returning its merged text (newline-joined) if present.
    pub fn on_flush(&mut self, key: &DebounceKey) -> Option<String> {
        self.buckets.remove(key).map(|b| b.buffered_text.join("\n"))
    }

    /// Drop a bucket without merging, e.g. after a downstream dispatch error.
    pub fn on_error(&mut self, key: &DebounceKey) {
        self.buckets.remove(key);
    }

    pub fn pending_count(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn k() -> DebounceKey {
        DebounceKey::build(ChannelType::Mattermost, "chan1", "user1")
    }

    #[test]
    fn test_first_message_not_debounced() {
        let mut d = Debouncer::new(chrono::Duration::seconds(5));
        let now = Utc::now();
        assert!(!d.should_debounce(k(), "hello", now));
    }

    #[test]
    fn test_rapid_second_message_is_debounced() {
        let mut d = Debouncer::new(chrono::Duration::seconds(5));
        let now = Utc::now();
        d.should_debounce(k(), "hello", now);
        let later = now + chrono::Duration::milliseconds(500);
        assert!(d.should_debounce(k(), "world", later));
    }

    #[test]
    fn test_message_after_quiet_window_not_debounced_relative_to_itself() {
        let mut d = Debouncer::new(chrono::Duration::seconds(5));
        let now = Utc::now();
        d.should_debounce(k(), "hello", now);
        let later = now + chrono::Duration::seconds(10);
        // it's a new arrival so is_ready_to_flush for the prior bucket was true
        assert!(d.is_ready_to_flush(&k(), later));
    }

    #[test]
    fn test_flush_merges_with_newline() {
        let mut d = Debouncer::new(chrono::Duration::seconds(5));
        let now = Utc::now();
        d.should_debounce(k(), "line one", now);
        d.should_debounce(k(), "line two", now + chrono::Duration::milliseconds(100));
        let merged = d.on_flush(&k()).unwrap();
        assert_eq!(merged, "line one\nline two");
    }

    #[test]
    fn test_flush_empty_bucket_is_noop() {
        let mut d = Debouncer::new(chrono::Duration::seconds(5));
        assert_eq!(d.on_flush(&k()), None);
    }

    #[test]
    fn test_buckets_scoped_per_conversation() {
        let mut d = Debouncer::new(chrono::Duration::seconds(5));
        let now = Utc::now();
        let k1 = DebounceKey::build(ChannelType::Mattermost, "chan1", "user1");
        let k2 = DebounceKey::build(ChannelType::Mattermost, "chan1", "user2");
        d.should_debounce(k1.clone(), "a", now);
        d.should_debounce(k2.clone(), "b", now);
        assert_eq!(d.pending_count(), 2);
        assert_eq!(d.on_flush(&k1), Some("a".to_string()));
        assert_eq!(d.on_flush(&k2), Some("b".to_string()));
    }

    #[test]
    fn test_on_error_drops_bucket() {
        let mut d = Debouncer::new(chrono::Duration::seconds(5));
        let now = Utc::now();
        d.should_debounce(k(), "a", now);
        d.on_error(&k());
        assert_eq!(d.pending_count(), 0);
    }
}
