//! Inbound message deduplication — suppresses a platform message id already
//! seen within a TTL window, ahead of debouncing and routing.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;

use super::ChannelType;

/// Identifies a single inbound message for dedupe purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupeKey {
    pub channel_type: ChannelType,
    pub channel_id: String,
    pub platform_message_id: String,
}

impl DedupeKey {
    pub fn new(
        channel_type: ChannelType,
        channel_id: impl Into<String>,
        platform_message_id: impl Into<String>,
    ) -> Self {
        Self {
            channel_type,
            channel_id: channel_id.into(),
            platform_message_id: platform_message_id.into(),
        }
    }
}

/// A fixed-capacity, TTL-bounded cache of recently-seen message keys.
///
/// Capacity eviction is LRU; TTL eviction is checked lazily on lookup so a
/// key older than `ttl` is treated as not-present even if still resident.
pub struct DedupeCache {
    cache: LruCache<DedupeKey, Instant>,
    ttl: Duration,
}

impl DedupeCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            cache: LruCache::new(NonZeroUsize::new(capacity.max(1)).unwrap()),
            ttl,
        }
    }

    /// Insert `key` if it hasn't been seen (within TTL). Returns `true` if
    /// this is the first time the key has been observed, `false` if it's a
    /// duplicate.
    pub fn insert_if_new(&mut self, key: DedupeKey) -> bool {
        self.insert_if_new_at(key, Instant::now())
    }

    fn insert_if_new_at(&mut self, key: DedupeKey, now: Instant) -> bool {
        if let Some(seen_at) = self.cache.get(&key) {
            if now.duration_since(*seen_at) < self.ttl {
                return false;
            }
        }
        self.cache.put(key, now);
        true
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
