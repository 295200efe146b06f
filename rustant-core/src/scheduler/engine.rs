//! Scheduler engine — the async driver that ties `CronScheduler`'s pure
//! state machine to an injected job runner and wall-clock time.
//!
//! `CronScheduler` (see `scheduler::cron`) only answers "what's due" and
//! "is this job running"; it never awaits anything. This module is the
//! piece that actually owns a timer, fans due jobs out up to the
//! concurrency cap, calls the injected collaborators, persists the result,
//! and appends to the run log — the "Cron Scheduler" component of the
//! spec's Channel Ingestion / Scheduler core.
//!
//! The scheduler never imports a channel or agent-runtime module directly;
//! it depends only on the three narrow traits below (`CronRunner`,
//! `SystemEventSink`, `HeartbeatController`), injected at construction.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex as AsyncMutex, Semaphore};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::channels::SessionKey;
use crate::error::SchedulerError;

use super::cron::{
    CronJob, CronRunner, CronScheduler, DeliveryConfig, DeliveryMode, DeliveryStatus,
    JobExecutionResult, JobPayload, RunOutcome, RunStatus, RunTrigger, SessionTarget, WakeMode,
};
use super::run_log::{RunLogEntry, RunLogWriter, DEFAULT_KEEP_LINES, DEFAULT_MAX_BYTES};
use super::store::{save_cron_store, CronStoreState};

/// Narrow interface into enqueueing a system event for the agent's main
/// session. The agent runtime that actually consumes the event is out of
/// scope here; the scheduler only needs to be able to hand it off.
pub trait SystemEventSink: Send + Sync {
    fn enqueue(&self, text: &str, session_key: Option<&SessionKey>, agent_id: Option<Uuid>);
}

/// Outcome of a single heartbeat run-now attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeartbeatRunOutcome {
    Ran,
    Skipped { reason: String },
}

/// Narrow interface into the agent runtime's heartbeat trigger.
#[async_trait]
pub trait HeartbeatController: Send + Sync {
    /// Request a heartbeat at the next regular interval; does not block.
    async fn request_now(&self);
    /// Attempt to run a heartbeat immediately; may report
    /// `Skipped { reason: "requests-in-flight" }` when busy.
    async fn run_once(&self) -> HeartbeatRunOutcome;
}

/// Events emitted around a job's execution, mirroring the `started`/
/// `finished` pub-sub shape from spec §6.
#[derive(Debug, Clone)]
pub enum CronEvent {
    Started {
        job_id: Uuid,
        run_at_ms: i64,
    },
    Finished {
        job_id: Uuid,
        status: RunStatus,
        error: Option<String>,
        run_at_ms: i64,
        duration_ms: i64,
        delivered: Option<bool>,
        delivery_status: DeliveryStatus,
    },
}

/// Delivery status contract from spec §4.8 / §8 scenario 6.
fn compute_delivery_status(delivery: &DeliveryConfig, delivered: Option<bool>) -> DeliveryStatus {
    match delivery.mode {
        DeliveryMode::None => DeliveryStatus::NotRequested,
        DeliveryMode::Announce | DeliveryMode::Webhook => match delivered {
            Some(true) => DeliveryStatus::Delivered,
            Some(false) => DeliveryStatus::NotDelivered,
            None => DeliveryStatus::Unknown,
        },
    }
}

/// A non-best-effort delivery failure escalates the run's own status to
/// `Error`; a best-effort one leaves the run `Ok` with `delivered=false`.
fn apply_delivery_policy(
    delivery: &DeliveryConfig,
    mut result: JobExecutionResult,
) -> JobExecutionResult {
    if matches!(delivery.mode, DeliveryMode::Announce | DeliveryMode::Webhook)
        && result.delivered == Some(false)
        && !delivery.best_effort
        && !matches!(result.status, Some(RunStatus::Error))
    {
        result.status = Some(RunStatus::Error);
        if result.error.is_none() {
            result.error = Some("delivery failed".to_string());
        }
    }
    result
}

/// Configuration for the wake-now busy-retry loop (§4.8 systemEvent branch).
#[derive(Debug, Clone, Copy)]
pub struct WakeNowRetryConfig {
    pub retry_delay_ms: i64,
    pub max_wait_ms: i64,
}

impl Default for WakeNowRetryConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: 2_000,
            max_wait_ms: 30_000,
        }
    }
}

/// The async cron driver. Cheap to clone: every field is `Arc`-backed (or,
/// for `RunLogWriter`, already internally `Arc`-backed), so a clone can be
/// handed to a spawned task without fighting the borrow checker.
#[derive(Clone)]
pub struct SchedulerEngine {
    scheduler: Arc<AsyncMutex<CronScheduler>>,
    store_path: Arc<PathBuf>,
    run_log_dir: Arc<PathBuf>,
    runner: Arc<dyn CronRunner>,
    system_events: Arc<dyn SystemEventSink>,
    heartbeat: Arc<dyn HeartbeatController>,
    run_log: RunLogWriter,
    max_concurrent_runs: usize,
    cron_enabled: bool,
    wake_now: WakeNowRetryConfig,
    run_log_max_bytes: u64,
    run_log_keep_lines: usize,
    events_tx: Option<mpsc::UnboundedSender<CronEvent>>,
}

impl SchedulerEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        jobs: Vec<CronJob>,
        store_path: PathBuf,
        run_log_dir: PathBuf,
        runner: Arc<dyn CronRunner>,
        system_events: Arc<dyn SystemEventSink>,
        heartbeat: Arc<dyn HeartbeatController>,
        max_concurrent_runs: usize,
        cron_enabled: bool,
    ) -> Self {
        Self {
            scheduler: Arc::new(AsyncMutex::new(CronScheduler::from_jobs(jobs))),
            store_path: Arc::new(store_path),
            run_log_dir: Arc::new(run_log_dir),
            runner,
            system_events,
            heartbeat,
            run_log: RunLogWriter::new(),
            max_concurrent_runs: max_concurrent_runs.max(1),
            cron_enabled,
            wake_now: WakeNowRetryConfig::default(),
            run_log_max_bytes: DEFAULT_MAX_BYTES,
            run_log_keep_lines: DEFAULT_KEEP_LINES,
            events_tx: None,
        }
    }

    pub fn with_wake_now_retry(mut self, cfg: WakeNowRetryConfig) -> Self {
        self.wake_now = cfg;
        self
    }

    pub fn with_run_log_limits(mut self, max_bytes: u64, keep_lines: usize) -> Self {
        self.run_log_max_bytes = max_bytes;
        self.run_log_keep_lines = keep_lines;
        self
    }

    /// Subscribe to `started`/`finished` events. Only one subscriber is
    /// supported; calling this again replaces the previous channel.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<CronEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events_tx = Some(tx);
        rx
    }

    pub async fn jobs_snapshot(&self) -> Vec<CronJob> {
        self.scheduler.lock().await.jobs().cloned().collect()
    }

    pub async fn job(&self, id: Uuid) -> Option<CronJob> {
        self.scheduler.lock().await.get_job(id).cloned()
    }

    pub async fn add_job(&self, job: CronJob) -> Result<(), SchedulerError> {
        let mut sched = self.scheduler.lock().await;
        sched.add_job(job)?;
        self.persist_locked(&sched);
        Ok(())
    }

    pub async fn remove_job(&self, id: Uuid) -> Result<CronJob, SchedulerError> {
        let mut sched = self.scheduler.lock().await;
        let job = sched.remove_job(id)?;
        self.persist_locked(&sched);
        Ok(job)
    }

    /// Milliseconds until the timer should next wake, capped at
    /// `MAX_TIMER_DELAY_MS`.
    pub async fn next_wake_delay_ms(&self, now_ms: i64) -> i64 {
        self.scheduler.lock().await.next_wake_delay_ms(now_ms)
    }

    /// Startup catch-up: runs every enabled job whose `next_run_at_ms` is
    /// already in the past, one at a time, before the caller arms its
    /// regular timer loop.
    pub async fn startup_catch_up(&self, now_ms: i64) {
        let candidates = { self.scheduler.lock().await.catch_up_candidates(now_ms) };
        for job_id in candidates {
            let outcome = { self.scheduler.lock().await.try_start(job_id, now_ms) };
            if matches!(outcome, RunOutcome::Ran { .. }) {
                self.execute_job_core(job_id, RunTrigger::CatchUp, now_ms).await;
            }
        }
    }

    /// A single timer tick: collects all due jobs and runs them up to
    /// `max_concurrent_runs` at a time. Jobs whose single-flight lock is
    /// already held are silently skipped (the previous execution is still
    /// in flight).
    pub async fn tick(&self, now_ms: i64) {
        if !self.cron_enabled {
            return;
        }
        let due = { self.scheduler.lock().await.due_jobs(now_ms) };
        if due.is_empty() {
            return;
        }
        let permits = Arc::new(Semaphore::new(self.max_concurrent_runs));
        let mut handles = Vec::with_capacity(due.len());
        for job_id in due {
            let outcome = { self.scheduler.lock().await.try_start(job_id, now_ms) };
            if !matches!(outcome, RunOutcome::Ran { .. }) {
                continue;
            }
            let engine = self.clone();
            let permits = permits.clone();
            handles.push(tokio::spawn(async move {
                let _permit = permits.acquire().await.expect("semaphore not closed");
                engine.execute_job_core(job_id, RunTrigger::Scheduled, now_ms).await;
            }));
        }
        for handle in handles {
            let _ = handle.await;
        }
    }

    /// Manual run request (`run(jobId, trigger)` in spec §4.8). Returns
    /// immediately with `Disabled`/`AlreadyRunning` without executing
    /// anything; otherwise awaits the execution and returns `Ran`.
    pub async fn run(&self, job_id: Uuid, force: bool) -> RunOutcome {
        let now_ms = super::cron::now_ms();
        let outcome = { self.scheduler.lock().await.request_manual_run(job_id, force) };
        if matches!(outcome, RunOutcome::Ran { .. }) {
            self.execute_job_core(job_id, RunTrigger::Manual, now_ms).await;
        }
        outcome
    }

    fn emit(&self, event: CronEvent) {
        if let Some(tx) = &self.events_tx {
            let _ = tx.send(event);
        }
    }

    fn persist_locked(&self, sched: &CronScheduler) {
        let state = CronStoreState {
            version: 1,
            jobs: sched.jobs().cloned().collect(),
        };
        if let Err(err) = save_cron_store(&self.store_path, &state) {
            tracing::error!(error = %err, "failed to persist cron store");
        }
    }

    async fn wake_now_retry_loop(&self, cancel: &CancellationToken) -> JobExecutionResult {
        let start = super::cron::now_ms();
        loop {
            if cancel.is_cancelled() {
                return JobExecutionResult {
                    status: Some(RunStatus::Cancelled),
                    error: Some("aborted while waiting to wake heartbeat".to_string()),
                    delivered: None,
                };
            }
            match self.heartbeat.run_once().await {
                HeartbeatRunOutcome::Ran => {
                    return JobExecutionResult {
                        status: Some(RunStatus::Ok),
                        error: None,
                        delivered: None,
                    }
                }
                HeartbeatRunOutcome::Skipped { reason } if reason == "requests-in-flight" => {
                    if super::cron::now_ms() - start >= self.wake_now.max_wait_ms {
                        return JobExecutionResult {
                            status: Some(RunStatus::Ok),
                            error: Some("heartbeat stayed busy; gave up waiting".to_string()),
                            delivered: None,
                        };
                    }
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            return JobExecutionResult {
                                status: Some(RunStatus::Cancelled),
                                error: Some("aborted while waiting to wake heartbeat".to_string()),
                                delivered: None,
                            };
                        }
                        _ = tokio::time::sleep(Duration::from_millis(self.wake_now.retry_delay_ms.max(0) as u64)) => {}
                    }
                }
                HeartbeatRunOutcome::Skipped { reason } => {
                    return JobExecutionResult {
                        status: Some(RunStatus::Skipped),
                        error: Some(reason),
                        delivered: None,
                    };
                }
            }
        }
    }

    /// Runs one job to completion: emits `started`, dispatches to the
    /// correct collaborator for the payload/session-target combination,
    /// applies timeout/abort and the delivery-status contract, persists
    /// the resulting state, and appends a run-log entry.
    async fn execute_job_core(&self, job_id: Uuid, trigger: RunTrigger, scheduled_run_at_ms: i64) {
        let Some(job) = self.job(job_id).await else { return };
        self.emit(CronEvent::Started {
            job_id,
            run_at_ms: scheduled_run_at_ms,
        });

        let cancel = CancellationToken::new();
        let timeout_guard = match &job.payload {
            JobPayload::AgentTurn {
                timeout_seconds: Some(secs),
                ..
            } if *secs > 0 => {
                let cancel = cancel.clone();
                let dur = Duration::from_secs(*secs);
                Some(tokio::spawn(async move {
                    tokio::time::sleep(dur).await;
                    cancel.cancel();
                }))
            }
            _ => None,
        };

        let result = match (job.session_target, &job.payload) {
            (SessionTarget::Main, JobPayload::SystemEvent { text }) => {
                self.system_events
                    .enqueue(text, job.session_key.as_ref(), job.agent_id);
                match job.wake_mode {
                    WakeMode::Now => self.wake_now_retry_loop(&cancel).await,
                    WakeMode::NextHeartbeat => {
                        self.heartbeat.request_now().await;
                        JobExecutionResult {
                            status: Some(RunStatus::Ok),
                            error: None,
                            delivered: None,
                        }
                    }
                }
            }
            (SessionTarget::Isolated, JobPayload::AgentTurn { .. }) => {
                tokio::select! {
                    _ = cancel.cancelled() => JobExecutionResult {
                        status: Some(RunStatus::TimedOut),
                        error: Some("job timed out".to_string()),
                        delivered: None,
                    },
                    res = self.runner.run(&job, trigger) => res,
                }
            }
            _ => JobExecutionResult {
                status: Some(RunStatus::Error),
                error: Some("job payload does not match its session target".to_string()),
                delivered: None,
            },
        };

        if let Some(guard) = timeout_guard {
            guard.abort();
        }

        let result = apply_delivery_policy(&job.delivery, result);
        let delivery_status = compute_delivery_status(&job.delivery, result.delivered);
        let ended_at_ms = super::cron::now_ms();
        let status = result.status.unwrap_or(RunStatus::Ok);

        {
            let mut sched = self.scheduler.lock().await;
            sched.finish_run(job_id, scheduled_run_at_ms, ended_at_ms, &result, delivery_status);
            if job.delete_after_run
                && matches!(status, RunStatus::Ok | RunStatus::Skipped | RunStatus::Error)
            {
                let _ = sched.remove_job(job_id);
            }
            self.persist_locked(&sched);
        }

        let entry = RunLogEntry {
            job_id,
            trigger,
            started_at_ms: scheduled_run_at_ms,
            finished_at_ms: ended_at_ms,
            status,
            error: result.error.clone(),
            summary: None,
            delivery_status: Some(delivery_status),
        };
        if let Err(err) = self
            .run_log
            .append(&self.run_log_dir, &entry, self.run_log_max_bytes, self.run_log_keep_lines)
            .await
        {
            tracing::error!(error = %err, job_id = %job_id, "failed to append run log entry");
        }

        self.emit(CronEvent::Finished {
            job_id,
            status,
            error: result.error,
            run_at_ms: scheduled_run_at_ms,
            duration_ms: (ended_at_ms - scheduled_run_at_ms).max(0),
            delivered: result.delivered,
            delivery_status,
        });
    }
}
