//! Channel ingestion pipeline — the generic per-channel inbound pipeline
//! (Mattermost as the representative instance): dedupe, filter, policy gate,
//! pairing, mention/command gate, debounce, route, envelope. Each stage is a
//! thin composition of the primitives in `dedupe`, `debounce`, `pairing`,
//! `binding` and `session_key`; this module only owns the ordering between
//! them, matching the sequence a single inbound event walks through before
//! it either gets dropped or reaches the reply dispatcher.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use uuid::Uuid;

use tracing::{debug, info, warn};

use crate::error::RustantError;
use crate::pairing::PairingStore;

use super::binding::{resolve_binding, AgentBinding, RouteContext};
use super::command_auth::{is_authorized, AllowFromConfig};
use super::dedupe::{DedupeCache, DedupeKey};
use super::debounce::{DebounceKey, Debouncer};
use super::mattermost::{DmPolicy, GroupPolicy};
use super::session_key::{DmScope, GroupKind, IdentityLinks, SessionKey};
use super::ChannelType;

/// Receives the outcome of a debounce bucket's timer firing on its own,
/// without any further inbound message arriving. The host wires this to the
/// same reply-dispatch path a directly-`Routed` `handle()` outcome takes, so
/// a merged burst reaches the agent exactly once either way.
#[async_trait::async_trait]
pub trait DebounceFlushSink: Send + Sync {
    async fn on_debounced_flush(&self, result: Result<Option<IngestOutcome>, RustantError>);
}

/// One inbound post as delivered to the pipeline, already stripped of any
/// transport-specific envelope (HTTP/WebSocket framing, auth headers).
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub message_id: String,
    pub channel_id: String,
    pub sender_id: String,
    pub text: String,
    pub is_direct_message: bool,
    pub is_system_post: bool,
    pub is_bot_post: bool,
    pub has_files: bool,
    pub is_control_command: bool,
    pub thread_id: Option<String>,
    pub guild_id: Option<String>,
    pub member_role_ids: Vec<String>,
    /// `true` for an ad-hoc multi-party conversation (no channel name, e.g.
    /// Mattermost's "G" chat type); `false` for a named channel. Only
    /// consulted for non-DM messages — see spec.md §4.5 step 3's `D|G|other`
    /// chat-type classification.
    pub is_group: bool,
}

impl InboundMessage {
    pub fn new(message_id: impl Into<String>, channel_id: impl Into<String>, sender_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            channel_id: channel_id.into(),
            sender_id: sender_id.into(),
            text: text.into(),
            is_direct_message: false,
            is_system_post: false,
            is_bot_post: false,
            has_files: false,
            is_control_command: false,
            thread_id: None,
            guild_id: None,
            member_role_ids: Vec::new(),
            is_group: false,
        }
    }

    pub fn direct(mut self) -> Self {
        self.is_direct_message = true;
        self
    }

    /// Mark this as an ad-hoc multi-party conversation rather than a named
    /// channel, selecting the `group` session-key marker over `channel`.
    pub fn as_group(mut self) -> Self {
        self.is_group = true;
        self
    }

    pub fn with_files(mut self) -> Self {
        self.has_files = true;
        self
    }

    pub fn as_command(mut self) -> Self {
        self.is_control_command = true;
        self
    }

    pub fn with_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn with_guild(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    /// Whether this message is the kind the debouncer should ever buffer:
    /// pure text, no attached files, not a control command.
    fn is_debounce_eligible(&self) -> bool {
        !self.has_files && !self.is_control_command
    }
}

/// What happened to an inbound message after walking it through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// Dropped silently: system/bot post, policy gate, unmentioned group
    /// chatter, or an unauthorized control command.
    Dropped { reason: String },
    /// A pairing code was issued (or refreshed for a repeat sender within
    /// TTL); the caller should send it back to `sender_id` as a DM.
    PairingIssued { code: String, created: bool },
    /// The per-channel pending-pairing cap was already full.
    PairingCapFull,
    /// Buffered into a debounce bucket; nothing to dispatch yet.
    Debounced,
    /// Ready to hand to the reply dispatcher.
    Routed(RoutedEnvelope),
}

/// The canonical envelope produced once a message clears every gate.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedEnvelope {
    pub session_key: SessionKey,
    pub text: String,
    pub message_ids: Vec<String>,
    pub was_mentioned: bool,
    pub command_authorized: bool,
}

/// Static configuration for one channel's pipeline instance.
pub struct PipelineConfig {
    pub channel_type: ChannelType,
    pub channel_name: String,
    /// The bot account/workspace this pipeline instance serves, e.g. a
    /// specific bot token under a multi-account channel config. Feeds both
    /// `SessionKey::dm_suffix`'s `PerAccountChannelPeer` scope and
    /// `BindingMatch::Account` resolution; `None` normalizes to `"default"`.
    pub account_id: Option<String>,
    pub dm_policy: DmPolicy,
    pub group_policy: GroupPolicy,
    pub dm_scope: DmScope,
    pub debounce_ms: i64,
    pub history_buffer_size: usize,
    pub mention_token: Option<String>,
}

impl PipelineConfig {
    pub fn new(channel_type: ChannelType, channel_name: impl Into<String>) -> Self {
        Self {
            channel_type,
            channel_name: channel_name.into(),
            account_id: None,
            dm_policy: DmPolicy::PairingRequired,
            group_policy: GroupPolicy::Disabled,
            dm_scope: DmScope::PerChannelPeer,
            debounce_ms: 1500,
            history_buffer_size: 10,
            mention_token: None,
        }
    }

    fn resolved_account_id(&self) -> &str {
        self.account_id.as_deref().unwrap_or("default")
    }
}

/// Owns every stateful primitive one channel's ingestion needs: dedupe
/// cache, debounce buckets, the pairing/allowlist store, agent bindings and
/// the bounded pending-context history used once a group message is dropped
/// for lack of a mention.
///
/// `handle` self-arms a `tokio::time::sleep(debounce_ms)` task per bucket
/// whenever it buffers a message and a `flush_sink` is configured (one task
/// per arrival, reset in effect because `flush_debounced` drains the bucket
/// on whichever task fires first — a later task for the same bucket then
/// finds nothing pending and is a no-op). The channel's event loop can also
/// call `flush_debounced` directly, e.g. to flush early on shutdown.
pub struct IngestionPipeline {
    config: PipelineConfig,
    default_agent_id: Uuid,
    dedupe: Mutex<DedupeCache>,
    debouncer: Mutex<Debouncer>,
    pairing: PairingStore,
    bindings: Vec<AgentBinding>,
    identity_links: IdentityLinks,
    history: Mutex<HashMap<String, Vec<String>>>,
    flush_sink: Option<Arc<dyn DebounceFlushSink>>,
}

impl IngestionPipeline {
    pub fn new(
        config: PipelineConfig,
        default_agent_id: Uuid,
        pairing: PairingStore,
        bindings: Vec<AgentBinding>,
        identity_links: IdentityLinks,
    ) -> Self {
        let history_cap = config.history_buffer_size;
        Self {
            config,
            default_agent_id,
            dedupe: Mutex::new(DedupeCache::new(2000, std::time::Duration::from_secs(300))),
            debouncer: Mutex::new(Debouncer::new(chrono::Duration::milliseconds(1))),
            pairing,
            bindings,
            identity_links,
            history: Mutex::new(HashMap::with_capacity(history_cap.max(1))),
            flush_sink: None,
        }
    }

    /// Wire a sink that receives a debounce bucket's auto-fired flush. Without
    /// one, buffered messages still merge correctly on the next manual
    /// `flush_debounced`/eligible-message call, but an idle bucket with no
    /// further arrivals never surfaces on its own.
    pub fn with_flush_sink(mut self, sink: Arc<dyn DebounceFlushSink>) -> Self {
        self.flush_sink = Some(sink);
        self
    }

    /// Run one inbound message through every pipeline stage in order. Takes
    /// `self` behind an `Arc` so a buffered message can arm a self-contained
    /// timer task that outlives this call.
    pub fn handle(self: &Arc<Self>, msg: InboundMessage) -> Result<IngestOutcome, RustantError> {
        // 1. Dedupe.
        let dedupe_key = DedupeKey::new(self.config.channel_type, msg.channel_id.clone(), msg.message_id.clone());
        let is_new = self.dedupe.lock().unwrap().insert_if_new(dedupe_key);
        if !is_new {
            debug!(channel = %self.config.channel_name, message_id = %msg.message_id, "dropping duplicate message");
            return Ok(IngestOutcome::Dropped {
                reason: "duplicate-message-id".into(),
            });
        }

        // 2. Filter.
        if msg.is_system_post {
            return Ok(IngestOutcome::Dropped { reason: "system-post".into() });
        }
        if msg.is_bot_post {
            return Ok(IngestOutcome::Dropped { reason: "bot-own-post".into() });
        }
        if msg.channel_id.is_empty() {
            return Ok(IngestOutcome::Dropped { reason: "missing-channel-id".into() });
        }

        // 3+4. Classify and gate by policy.
        if msg.is_direct_message {
            if let Some(outcome) = self.gate_direct(&msg)? {
                return Ok(outcome);
            }
        } else {
            if let Some(reason) = self.gate_group(&msg) {
                return Ok(IngestOutcome::Dropped { reason });
            }
            // 5. Mention & command gate (groups/channels only).
            let authorized_command = msg.is_control_command && self.is_authorized_sender(&msg.sender_id);
            if msg.is_control_command && !authorized_command {
                return Ok(IngestOutcome::Dropped {
                    reason: "unauthorized-command".into(),
                });
            }
            let mentioned = self.mentions_bot(&msg.text);
            if !mentioned && !authorized_command {
                self.record_history(&msg.channel_id, &msg.text);
                return Ok(IngestOutcome::Dropped { reason: "no-mention".into() });
            }
        }

        // 7. Debounce (text-only, non-command messages).
        let debounce_key = DebounceKey::build(self.config.channel_type, &msg.channel_id, &msg.sender_id);
        if msg.is_debounce_eligible() && self.config.debounce_ms > 0 {
            let now = chrono::Utc::now();
            {
                let mut debouncer = self.debouncer.lock().unwrap();
                debouncer.should_debounce(debounce_key, &msg.text, now);
            }
            self.arm_debounce_timer(&msg);
            return Ok(IngestOutcome::Debounced);
        }

        // A file-bearing or command message flushes any pending bucket for
        // this conversation immediately, merging the buffered text ahead of
        // this message's own (arrival order).
        let mut debouncer = self.debouncer.lock().unwrap();
        let mut text = msg.text.clone();
        let mut ids = vec![msg.message_id.clone()];
        if let Some(buffered) = debouncer.on_flush(&debounce_key) {
            text = format!("{buffered}\n{text}");
        }
        drop(debouncer);

        self.clear_history(&msg.channel_id);
        let envelope = self.route(&msg, text, &mut ids)?;
        Ok(IngestOutcome::Routed(envelope))
    }

    /// Drain a debounce bucket once its quiet window has elapsed, merging the
    /// buffered texts with `\n` per the burst-merge contract. Returns `None`
    /// if nothing was pending.
    pub fn flush_debounced(&self, channel_id: &str, sender_id: &str, last_message_id: &str) -> Result<Option<IngestOutcome>, RustantError> {
        let debounce_key = DebounceKey::build(self.config.channel_type, channel_id, sender_id);
        let merged = {
            let mut debouncer = self.debouncer.lock().unwrap();
            debouncer.on_flush(&debounce_key)
        };
        let Some(text) = merged else { return Ok(None) };

        let msg = InboundMessage::new(last_message_id, channel_id, sender_id, "");
        self.clear_history(channel_id);
        let mut ids = vec![last_message_id.to_string()];
        let envelope = self.route(&msg, text, &mut ids)?;
        Ok(Some(IngestOutcome::Routed(envelope)))
    }

    /// Spawn the timer that makes a debounce bucket self-flushing: per
    /// spec.md §4.4, arrival "(re)start[s] a single timer for the bucket.
    /// On timer fire, call `onFlush`". No-op if no `flush_sink` is
    /// configured (the bucket is still drained correctly by the next
    /// eligible arrival or an explicit `flush_debounced` call either way).
    fn arm_debounce_timer(self: &Arc<Self>, msg: &InboundMessage) {
        let Some(sink) = self.flush_sink.clone() else { return };
        let pipeline = Arc::clone(self);
        let channel_id = msg.channel_id.clone();
        let sender_id = msg.sender_id.clone();
        let message_id = msg.message_id.clone();
        let wait = Duration::from_millis(self.config.debounce_ms.max(0) as u64);
        tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            let result = pipeline.flush_debounced(&channel_id, &sender_id, &message_id);
            sink.on_debounced_flush(result).await;
        });
    }

    fn gate_direct(&self, msg: &InboundMessage) -> Result<Option<IngestOutcome>, RustantError> {
        match self.config.dm_policy {
            DmPolicy::AllowAll => Ok(None),
            DmPolicy::AllowlistOnly => {
                let allow_from = self.pairing.read_allow_from(&self.config.channel_name, None)?;
                if allow_from.iter().any(|a| a == "*" || a.eq_ignore_ascii_case(&msg.sender_id)) {
                    Ok(None)
                } else {
                    Ok(Some(IngestOutcome::Dropped {
                        reason: "dm-not-allowlisted".into(),
                    }))
                }
            }
            DmPolicy::PairingRequired => {
                let allow_from = self.pairing.read_allow_from(&self.config.channel_name, None)?;
                if allow_from.iter().any(|a| a == "*" || a.eq_ignore_ascii_case(&msg.sender_id)) {
                    return Ok(None);
                }
                let outcome = self.pairing.upsert_pairing_request(
                    &self.config.channel_name,
                    None,
                    &msg.sender_id,
                    None,
                )?;
                if outcome.code.is_empty() {
                    warn!(channel = %self.config.channel_name, sender = %msg.sender_id, "pending pairing cap full, dropping request");
                    Ok(Some(IngestOutcome::PairingCapFull))
                } else {
                    info!(
                        channel = %self.config.channel_name,
                        sender = %msg.sender_id,
                        created = outcome.created,
                        "issued pairing code"
                    );
                    Ok(Some(IngestOutcome::PairingIssued {
                        code: outcome.code,
                        created: outcome.created,
                    }))
                }
            }
        }
    }

    /// `None` permits the post through; `Some(reason)` drops it.
    fn gate_group(&self, msg: &InboundMessage) -> Option<String> {
        match self.config.group_policy {
            GroupPolicy::Disabled => Some("group-policy-disabled".into()),
            GroupPolicy::AllMessages => None,
            GroupPolicy::MentionOnly => {
                let allow_from = self
                    .pairing
                    .read_allow_from(&self.config.channel_name, None)
                    .unwrap_or_default();
                if allow_from.is_empty() {
                    return Some("group-allowlist-empty".into());
                }
                if !allow_from.iter().any(|a| a == "*" || a.eq_ignore_ascii_case(&msg.sender_id)) {
                    return Some("sender-not-in-group-allowlist".into());
                }
                None
            }
        }
    }

    fn is_authorized_sender(&self, sender_id: &str) -> bool {
        let allow_from = self
            .pairing
            .read_allow_from(&self.config.channel_name, None)
            .unwrap_or_default();
        let allow_config = AllowFromConfig::new().with_command("*", allow_from.clone());
        is_authorized("*", &[sender_id.to_string()], &allow_config, &allow_from)
    }

    fn mentions_bot(&self, text: &str) -> bool {
        match &self.config.mention_token {
            Some(token) => text.contains(token.as_str()),
            None => false,
        }
    }

    fn record_history(&self, channel_id: &str, text: &str) {
        let mut history = self.history.lock().unwrap();
        let bucket = history.entry(channel_id.to_string()).or_default();
        bucket.push(text.to_string());
        let cap = self.config.history_buffer_size.max(1);
        if bucket.len() > cap {
            let overflow = bucket.len() - cap;
            bucket.drain(0..overflow);
        }
    }

    fn clear_history(&self, channel_id: &str) {
        self.history.lock().unwrap().remove(channel_id);
    }

    /// Pending, non-triggering message history recorded for `channel_id`
    /// (oldest first), capped at `history_buffer_size`.
    pub fn history_for(&self, channel_id: &str) -> Vec<String> {
        self.history.lock().unwrap().get(channel_id).cloned().unwrap_or_default()
    }

    fn route(&self, msg: &InboundMessage, text: String, ids: &mut Vec<String>) -> Result<RoutedEnvelope, RustantError> {
        let canonical_peer = self.identity_links.resolve(&msg.sender_id).to_string();
        let account_id = self.config.resolved_account_id().to_string();

        let mut ctx = RouteContext::new()
            .with_channel(self.config.channel_type)
            .with_account(account_id.clone());
        if msg.is_direct_message {
            ctx = ctx.with_peer(canonical_peer.clone());
        } else {
            ctx = ctx.with_peer(msg.channel_id.clone());
        }
        if let Some(guild_id) = &msg.guild_id {
            ctx = ctx.with_guild(guild_id.clone());
        }
        ctx = ctx.with_roles(msg.member_role_ids.clone());

        let agent_id = resolve_binding(&self.bindings, &ctx).unwrap_or(self.default_agent_id);

        let suffix = if msg.is_direct_message {
            SessionKey::dm_suffix(
                self.config.dm_scope,
                &self.config.channel_type.to_string(),
                Some(&account_id),
                &canonical_peer,
            )
        } else {
            let kind = if msg.is_group { GroupKind::Group } else { GroupKind::Channel };
            SessionKey::group_suffix(
                &self.config.channel_type.to_string(),
                kind,
                &msg.channel_id,
                msg.thread_id.as_deref(),
            )
        };
        let session_key = SessionKey::new(agent_id, suffix);

        let was_mentioned = !msg.is_direct_message && self.mentions_bot(&msg.text);
        let command_authorized = msg.is_control_command && self.is_authorized_sender(&msg.sender_id);

        ids.dedup();
        Ok(RoutedEnvelope {
            session_key,
            text,
            message_ids: ids.clone(),
            was_mentioned,
            command_authorized,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn pipeline(dm_policy: DmPolicy, group_policy: GroupPolicy) -> (TempDir, Arc<IngestionPipeline>) {
        let dir = TempDir::new().unwrap();
        let pairing = PairingStore::new(dir.path());
        let mut cfg = PipelineConfig::new(ChannelType::Mattermost, "mattermost");
        cfg.dm_policy = dm_policy;
        cfg.group_policy = group_policy;
        cfg.mention_token = Some("@assistant".into());
        cfg.debounce_ms = 0; // dispatch synchronously in tests unless overridden
        let pipeline = IngestionPipeline::new(cfg, Uuid::new_v4(), pairing, vec![], IdentityLinks::new(vec![]));
        (dir, Arc::new(pipeline))
    }

    #[test]
    fn test_duplicate_message_id_dropped() {
        let (_dir, p) = pipeline(DmPolicy::AllowAll, GroupPolicy::Disabled);
        let msg = InboundMessage::new("m1", "dm1", "u1", "hi").direct();
        let first = p.handle(msg.clone()).unwrap();
        assert!(matches!(first, IngestOutcome::Routed(_)));
        let second = p.handle(msg).unwrap();
        assert_eq!(
            second,
            IngestOutcome::Dropped {
                reason: "duplicate-message-id".into()
            }
        );
    }

    #[test]
    fn test_system_and_bot_posts_dropped() {
        let (_dir, p) = pipeline(DmPolicy::AllowAll, GroupPolicy::AllMessages);
        let mut sys = InboundMessage::new("m1", "c1", "u1", "system notice");
        sys.is_system_post = true;
        assert_eq!(
            p.handle(sys).unwrap(),
            IngestOutcome::Dropped { reason: "system-post".into() }
        );

        let mut bot = InboundMessage::new("m2", "c1", "bot1", "echo");
        bot.is_bot_post = true;
        assert_eq!(p.handle(bot).unwrap(), IngestOutcome::Dropped { reason: "bot-own-post".into() });
    }

    #[test]
    fn test_dm_pairing_flow_issues_code_then_is_idempotent() {
        let (_dir, p) = pipeline(DmPolicy::PairingRequired, GroupPolicy::Disabled);
        let msg = InboundMessage::new("m1", "dm1", "u1", "hello").direct();
        let first = p.handle(msg).unwrap();
        let code = match first {
            IngestOutcome::PairingIssued { code, created } => {
                assert!(created);
                code
            }
            other => panic!("expected PairingIssued, got {other:?}"),
        };
        assert_eq!(code.len(), 8);

        let msg2 = InboundMessage::new("m2", "dm1", "u1", "still waiting").direct();
        let second = p.handle(msg2).unwrap();
        match second {
            IngestOutcome::PairingIssued { code: code2, created } => {
                assert!(!created);
                assert_eq!(code2, code);
            }
            other => panic!("expected repeat PairingIssued, got {other:?}"),
        }
    }

    #[test]
    fn test_dm_allowlisted_sender_routes_through() {
        let (_dir, p) = pipeline(DmPolicy::PairingRequired, GroupPolicy::Disabled);
        p.pairing.add_allow_from_entry("mattermost", None, "u1").unwrap();
        let msg = InboundMessage::new("m1", "dm1", "u1", "hello").direct();
        let outcome = p.handle(msg).unwrap();
        assert!(matches!(outcome, IngestOutcome::Routed(_)));
    }

    #[test]
    fn test_group_disabled_drops_post() {
        let (_dir, p) = pipeline(DmPolicy::AllowAll, GroupPolicy::Disabled);
        let msg = InboundMessage::new("m1", "c1", "u1", "hey @assistant");
        assert_eq!(
            p.handle(msg).unwrap(),
            IngestOutcome::Dropped {
                reason: "group-policy-disabled".into()
            }
        );
    }

    #[test]
    fn test_group_requires_mention_records_history_when_absent() {
        let (_dir, p) = pipeline(DmPolicy::AllowAll, GroupPolicy::AllMessages);
        let msg = InboundMessage::new("m1", "c1", "u1", "just chatting, no mention");
        let outcome = p.handle(msg).unwrap();
        assert_eq!(outcome, IngestOutcome::Dropped { reason: "no-mention".into() });
        assert_eq!(p.history_for("c1"), vec!["just chatting, no mention".to_string()]);
    }

    #[test]
    fn test_group_mention_routes_and_clears_history() {
        let (_dir, p) = pipeline(DmPolicy::AllowAll, GroupPolicy::AllMessages);
        let unmentioned = InboundMessage::new("m1", "c1", "u1", "no mention yet");
        p.handle(unmentioned).unwrap();
        assert_eq!(p.history_for("c1").len(), 1);

        let mentioned = InboundMessage::new("m2", "c1", "u1", "hey @assistant help");
        let outcome = p.handle(mentioned).unwrap();
        assert!(matches!(outcome, IngestOutcome::Routed(_)));
        assert!(p.history_for("c1").is_empty());
    }

    #[test]
    fn test_unauthorized_command_dropped() {
        let (_dir, p) = pipeline(DmPolicy::AllowAll, GroupPolicy::AllMessages);
        let msg = InboundMessage::new("m1", "c1", "stranger", "/restart").as_command();
        assert_eq!(
            p.handle(msg).unwrap(),
            IngestOutcome::Dropped {
                reason: "unauthorized-command".into()
            }
        );
    }

    #[test]
    fn test_authorized_command_bypasses_mention_requirement() {
        let (_dir, p) = pipeline(DmPolicy::AllowAll, GroupPolicy::AllMessages);
        p.pairing.add_allow_from_entry("mattermost", None, "owner1").unwrap();
        let msg = InboundMessage::new("m1", "c1", "owner1", "/restart").as_command();
        let outcome = p.handle(msg).unwrap();
        match outcome {
            IngestOutcome::Routed(env) => assert!(env.command_authorized),
            other => panic!("expected Routed, got {other:?}"),
        }
    }

    #[test]
    fn test_history_buffer_is_bounded() {
        let (_dir, p) = pipeline(DmPolicy::AllowAll, GroupPolicy::AllMessages);
        for i in 0..15 {
            let msg = InboundMessage::new(format!("m{i}"), "c1", "u1", format!("msg {i}"));
            p.handle(msg).unwrap();
        }
        assert_eq!(p.history_for("c1").len(), 10);
        assert_eq!(p.history_for("c1")[0], "msg 5");
    }

    #[test]
    fn test_file_bearing_message_flushes_pending_bucket_immediately() {
        let (_dir, p) = pipeline(DmPolicy::AllowAll, GroupPolicy::Disabled);
        // Manually buffer through the debouncer to simulate a pending bucket.
        let key = DebounceKey::build(ChannelType::Mattermost, "dm1", "u1");
        {
            let mut d = p.debouncer.lock().unwrap();
            d.should_debounce(key.clone(), "line one", chrono::Utc::now());
        }

        let file_msg = InboundMessage::new("m2", "dm1", "u1", "here's a file").direct().with_files();
        let outcome = p.handle(file_msg).unwrap();
        match outcome {
            IngestOutcome::Routed(env) => {
                assert_eq!(env.text, "line one\nhere's a file");
                assert_eq!(env.message_ids, vec!["m2".to_string()]);
            }
            other => panic!("expected Routed, got {other:?}"),
        }
    }

    #[test]
    fn test_debounced_message_returns_debounced_outcome() {
        let dir = TempDir::new().unwrap();
        let pairing = PairingStore::new(dir.path());
        let mut cfg = PipelineConfig::new(ChannelType::Mattermost, "mattermost");
        cfg.dm_policy = DmPolicy::AllowAll;
        cfg.debounce_ms = 5000;
        let p = Arc::new(IngestionPipeline::new(cfg, Uuid::new_v4(), pairing, vec![], IdentityLinks::new(vec![])));

        let msg = InboundMessage::new("m1", "dm1", "u1", "hello").direct();
        assert_eq!(p.handle(msg).unwrap(), IngestOutcome::Debounced);
    }

    #[test]
    fn test_flush_debounced_merges_buffered_texts() {
        let dir = TempDir::new().unwrap();
        let pairing = PairingStore::new(dir.path());
        let mut cfg = PipelineConfig::new(ChannelType::Mattermost, "mattermost");
        cfg.dm_policy = DmPolicy::AllowAll;
        cfg.debounce_ms = 5000;
        let p = Arc::new(IngestionPipeline::new(cfg, Uuid::new_v4(), pairing, vec![], IdentityLinks::new(vec![])));

        p.handle(InboundMessage::new("m1", "dm1", "u1", "line one").direct()).unwrap();
        p.handle(InboundMessage::new("m2", "dm1", "u1", "line two").direct()).unwrap();

        let flushed = p.flush_debounced("dm1", "u1", "m2").unwrap().unwrap();
        match flushed {
            IngestOutcome::Routed(env) => assert_eq!(env.text, "line one\nline two"),
            other => panic!("expected Routed, got {other:?}"),
        }
    }

    #[test]
    fn test_identity_link_merges_dm_session_across_aliases() {
        let dir = TempDir::new().unwrap();
        let pairing = PairingStore::new(dir.path());
        let cfg = PipelineConfig::new(ChannelType::Mattermost, "mattermost");
        let links = IdentityLinks::new(vec![super::super::session_key::IdentityLink {
            alias_id: "legacy-u1".into(),
            canonical_peer_id: "u1".into(),
        }]);
        let mut cfg = cfg;
        cfg.dm_policy = DmPolicy::AllowAll;
        cfg.debounce_ms = 0;
        let p = Arc::new(IngestionPipeline::new(cfg, Uuid::new_v4(), pairing, vec![], links));

        let a = p
            .handle(InboundMessage::new("m1", "dm1", "u1", "hi").direct())
            .unwrap();
        let b = p
            .handle(InboundMessage::new("m2", "dm2", "legacy-u1", "hi again").direct())
            .unwrap();

        let (IngestOutcome::Routed(a), IngestOutcome::Routed(b)) = (a, b) else {
            panic!("expected both routed");
        };
        assert_eq!(a.session_key, b.session_key);
    }

    struct RecordingFlushSink {
        flushes: std::sync::Mutex<Vec<Result<Option<IngestOutcome>, String>>>,
    }

    impl RecordingFlushSink {
        fn new() -> Self {
            Self {
                flushes: std::sync::Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl DebounceFlushSink for RecordingFlushSink {
        async fn on_debounced_flush(&self, result: Result<Option<IngestOutcome>, RustantError>) {
            self.flushes.lock().unwrap().push(result.map_err(|e| e.to_string()));
        }
    }

    #[tokio::test]
    async fn test_debounce_bucket_self_flushes_without_further_arrivals() {
        let dir = TempDir::new().unwrap();
        let pairing = PairingStore::new(dir.path());
        let mut cfg = PipelineConfig::new(ChannelType::Mattermost, "mattermost");
        cfg.dm_policy = DmPolicy::AllowAll;
        cfg.debounce_ms = 20;
        let sink = Arc::new(RecordingFlushSink::new());
        let p = Arc::new(
            IngestionPipeline::new(cfg, Uuid::new_v4(), pairing, vec![], IdentityLinks::new(vec![]))
                .with_flush_sink(sink.clone()),
        );

        // Scenario 5: three messages within the debounce window merge into
        // one eventual flush, with no further caller-driven trigger.
        assert_eq!(
            p.handle(InboundMessage::new("m1", "dm1", "u1", "line one").direct()).unwrap(),
            IngestOutcome::Debounced
        );
        assert_eq!(
            p.handle(InboundMessage::new("m2", "dm1", "u1", "line two").direct()).unwrap(),
            IngestOutcome::Debounced
        );
        assert_eq!(
            p.handle(InboundMessage::new("m3", "dm1", "u1", "line three").direct()).unwrap(),
            IngestOutcome::Debounced
        );

        tokio::time::sleep(Duration::from_millis(200)).await;

        let flushes = sink.flushes.lock().unwrap();
        let non_empty: Vec<_> = flushes
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .filter_map(|o| o.clone())
            .collect();
        assert_eq!(non_empty.len(), 1, "exactly one non-empty auto-flush, got {flushes:?}");
        match &non_empty[0] {
            IngestOutcome::Routed(env) => assert_eq!(env.text, "line one\nline two\nline three"),
            other => panic!("expected Routed, got {other:?}"),
        }
    }
}
