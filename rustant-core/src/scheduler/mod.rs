//! Scheduling Module for Rustant.
//!
//! Provides cron-based scheduling (one-shot/interval/cron jobs with
//! single-flight execution, crash-safe restart, and delivery callbacks), an
//! append-only run log, a fallback-model state machine, heartbeat triggers
//! with cooldowns and quiet hours, webhook endpoints with HMAC verification,
//! and background job management.

pub mod cron;
pub mod engine;
pub mod fallback;
pub mod heartbeat;
pub mod jobs;
pub mod persistence;
pub mod run_log;
pub mod store;
pub mod webhook;

pub use cron::{
    compute_next_run_at_ms, reschedule_after_run, CronJob, CronJobConfig, CronJobRunState,
    CronRunner, CronScheduler, DeliveryConfig, DeliveryMode, DeliveryStatus, JobExecutionResult,
    JobPayload, JobSchedule, RunOutcome, RunStatus, RunTrigger, SessionTarget, WakeMode,
    MAX_TIMER_DELAY_MS, MIN_REFIRE_GAP_MS,
};
pub use engine::{
    CronEvent, HeartbeatController, HeartbeatRunOutcome, SchedulerEngine, SystemEventSink,
    WakeNowRetryConfig,
};
pub use fallback::{evaluate_fallback, FallbackAttempt, FallbackInput, FallbackOutcome, FallbackState};
pub use heartbeat::{HeartbeatConfig, HeartbeatManager, HeartbeatTask, QuietHours};
pub use jobs::{BackgroundJob, JobManager, JobStatus};
pub use persistence::{load_state, save_state};
pub use run_log::{read_all_run_logs, read_job_run_log, RunLogEntry, RunLogQuery, RunLogWriter};
pub use store::{load_cron_store, resolve_cron_store_path, save_cron_store, CronStoreState};
pub use webhook::{
    compute_hmac_signature, WebhookEndpoint, WebhookHandler, WebhookRequest, WebhookResult,
};
