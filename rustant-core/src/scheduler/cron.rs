//! Cron scheduler — persistent jobs with one-shot/interval/cron schedules,
//! single-flight execution, timeout/cancellation, and delivery callbacks.

use chrono::{DateTime, Utc};
use cron::Schedule as CronExpr;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::channels::{ChannelType, SessionKey};
use crate::error::SchedulerError;

/// Timer re-arm never sleeps longer than this, so a far-future next run
/// doesn't starve reconfiguration (new/edited jobs, disablement).
pub const MAX_TIMER_DELAY_MS: i64 = 60_000;
/// Minimum gap enforced between the end of one run and the next scheduled
/// run, for schedules with second-level granularity.
pub const MIN_REFIRE_GAP_MS: i64 = 2_000;

/// Legacy, config-file-friendly cron job description (simple name-keyed
/// jobs declared directly in the config file, distinct from the richer
/// runtime `CronJob` persisted by the scheduler's own JSON store).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CronJobConfig {
    pub name: String,
    pub schedule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    pub task: String,
    pub enabled: bool,
}

impl CronJobConfig {
    pub fn new(name: impl Into<String>, schedule: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schedule: schedule.into(),
            timezone: None,
            task: task.into(),
            enabled: true,
        }
    }

    /// Validate the cron expression without constructing a runtime job.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        parse_cron_expression(&self.schedule).map(|_| ())
    }
}

/// How a job's next run time is computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobSchedule {
    /// Fires exactly once at the given instant, then disables the job.
    At { at_ms: i64 },
    /// Fires every `interval_ms`, starting at `anchor_ms` (or now, if unset).
    Every {
        interval_ms: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        anchor_ms: Option<i64>,
    },
    /// Fires according to a `cron` crate (7-field, seconds-included) expression.
    Cron {
        expr: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tz: Option<String>,
        #[serde(default)]
        stagger_ms: i64,
    },
}

/// Where a job's execution sends its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionTarget {
    Main,
    Isolated,
}

/// Whether a `SystemEvent` job should wake the agent immediately or wait for
/// the next regular heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WakeMode {
    NextHeartbeat,
    Now,
}

/// What a job's execution actually does once due.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobPayload {
    /// Enqueue a system event into an existing session (`session_target = Main`).
    SystemEvent { text: String },
    /// Run a standalone agent turn (`session_target = Isolated`).
    AgentTurn {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_seconds: Option<u64>,
    },
}

/// How a completed job's output, if any, is delivered back to a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    None,
    Announce,
    Webhook,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    pub mode: DeliveryMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<ChannelType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default)]
    pub best_effort: bool,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            mode: DeliveryMode::None,
            channel: None,
            to: None,
            best_effort: false,
        }
    }
}

/// Outcome recorded for a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Ok,
    Error,
    Skipped,
    TimedOut,
    Cancelled,
}

/// Status reported for a run's delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryStatus {
    NotRequested,
    Delivered,
    NotDelivered,
    Unknown,
}

/// Mutable run-state carried alongside a job's static definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CronJobRunState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_run_at_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub running_at_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_at_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_status: Option<RunStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_duration_ms: Option<i64>,
    #[serde(default)]
    pub consecutive_errors: u32,
    #[serde(default)]
    pub schedule_error_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_delivery_status: Option<DeliveryStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_delivery_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_delivered: Option<bool>,
}

impl Default for CronJobRunState {
    fn default() -> Self {
        Self {
            next_run_at_ms: None,
            running_at_ms: None,
            last_run_at_ms: None,
            last_run_status: None,
            last_error: None,
            last_duration_ms: None,
            consecutive_errors: 0,
            schedule_error_count: 0,
            last_delivery_status: None,
            last_delivery_error: None,
            last_delivered: None,
        }
    }
}

impl CronJobRunState {
    /// One-shot jobs whose terminal status is already recorded never re-fire.
    fn is_one_shot_terminal(&self) -> bool {
        matches!(
            self.last_run_status,
            Some(RunStatus::Ok) | Some(RunStatus::Skipped) | Some(RunStatus::Error)
        )
    }
}

/// A persisted, runtime-managed cron job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CronJob {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_key: Option<SessionKey>,
    pub name: String,
    pub enabled: bool,
    #[serde(default)]
    pub delete_after_run: bool,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    pub schedule: JobSchedule,
    pub session_target: SessionTarget,
    pub wake_mode: WakeMode,
    pub payload: JobPayload,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub state: CronJobRunState,
}

impl CronJob {
    pub fn new(
        name: impl Into<String>,
        schedule: JobSchedule,
        session_target: SessionTarget,
        wake_mode: WakeMode,
        payload: JobPayload,
    ) -> Self {
        let now = now_ms();
        let is_one_shot = matches!(schedule, JobSchedule::At { .. });
        Self {
            id: Uuid::new_v4(),
            agent_id: None,
            session_key: None,
            name: name.into(),
            enabled: true,
            delete_after_run: is_one_shot,
            created_at_ms: now,
            updated_at_ms: now,
            schedule,
            session_target,
            wake_mode,
            payload,
            delivery: DeliveryConfig::default(),
            state: CronJobRunState::default(),
        }
    }

    /// Whether this job is due: enabled, has a scheduled time, that time has
    /// passed, and no one-shot terminal status blocks it from re-firing.
    pub fn is_due(&self, now_ms: i64) -> bool {
        if !self.enabled || self.state.running_at_ms.is_some() {
            return false;
        }
        if self.state.is_one_shot_terminal() && matches!(self.schedule, JobSchedule::At { .. }) {
            return false;
        }
        matches!(self.state.next_run_at_ms, Some(next) if next <= now_ms)
    }

    pub fn is_running(&self) -> bool {
        self.state.running_at_ms.is_some()
    }
}

pub(crate) fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn parse_cron_expression(expr: &str) -> Result<CronExpr, SchedulerError> {
    CronExpr::from_str(expr).map_err(|e| SchedulerError::InvalidCronExpression {
        expression: expr.to_string(),
        message: e.to_string(),
    })
}

/// `sha256(job_id)[0..4]` interpreted as a big-endian u32, mod `stagger_ms`.
/// Deterministic so two scheduler instances compute the same offset for the
/// same job without coordination.
fn stagger_offset_ms(job_id: Uuid, stagger_ms: i64) -> i64 {
    if stagger_ms <= 0 {
        return 0;
    }
    let digest = Sha256::digest(job_id.as_bytes());
    let word = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    (word as i64) % stagger_ms
}

/// Compute the next run time for a schedule, strictly after `from_ms`.
/// Returns `None` when a `Cron` expression has no future occurrence at all.
pub fn compute_next_run_at_ms(
    schedule: &JobSchedule,
    from_ms: i64,
    job_id: Uuid,
) -> Result<Option<i64>, SchedulerError> {
    match schedule {
        JobSchedule::At { at_ms } => Ok(Some(*at_ms)),
        JobSchedule::Every { interval_ms, anchor_ms } => {
            let interval = (*interval_ms).max(1);
            if let Some(anchor) = anchor_ms {
                if *anchor > from_ms {
                    return Ok(Some(*anchor));
                }
                let elapsed = from_ms - anchor;
                let ticks = elapsed / interval + 1;
                Ok(Some(anchor + ticks * interval))
            } else {
                Ok(Some(from_ms + interval))
            }
        }
        JobSchedule::Cron { expr, stagger_ms, .. } => {
            let parsed = parse_cron_expression(expr)?;
            let from = DateTime::<Utc>::from_timestamp_millis(from_ms).unwrap_or_else(Utc::now);
            match parsed.after(&from).next() {
                Some(next) => {
                    let mut next_ms = next.timestamp_millis();
                    if *stagger_ms > 0 {
                        next_ms += stagger_offset_ms(job_id, *stagger_ms);
                    }
                    Ok(Some(next_ms))
                }
                None => Ok(None),
            }
        }
    }
}

/// Recompute `next_run_at_ms` from `base_ms`, enforcing the minimum refire
/// gap for second-granularity schedules. Retries once from `base_ms + 1s` if
/// the schedule produces no occurrence; on repeated failure the caller
/// should bump `state.schedule_error_count` and consider disabling the job.
pub fn reschedule_after_run(
    schedule: &JobSchedule,
    ended_at_ms: i64,
    scheduled_run_at_ms: i64,
    job_id: Uuid,
) -> Result<Option<i64>, SchedulerError> {
    let base = ended_at_ms.max(scheduled_run_at_ms + 1_000);
    let mut next = compute_next_run_at_ms(schedule, base, job_id)?;
    if next.is_none() {
        next = compute_next_run_at_ms(schedule, base + 1_000, job_id)?;
    }
    if let Some(n) = next {
        let floor = ended_at_ms + MIN_REFIRE_GAP_MS;
        if matches!(schedule, JobSchedule::Cron { .. }) && n < floor {
            return Ok(Some(floor));
        }
    }
    Ok(next)
}

/// How a run was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunTrigger {
    Scheduled,
    Manual,
    CatchUp,
}

/// Result of a manual `run()` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Ran { status: RunStatus },
    AlreadyRunning,
    Disabled,
}

/// The result an injected job runner hands back to the scheduler.
#[derive(Debug, Clone, Default)]
pub struct JobExecutionResult {
    pub status: Option<RunStatus>,
    pub error: Option<String>,
    pub delivered: Option<bool>,
}

/// Injected executor: the scheduler never knows how to actually run a job,
/// only when to. Kept free of async-trait object-safety gymnastics by
/// returning a boxed future directly.
pub trait CronRunner: Send + Sync {
    fn run<'a>(
        &'a self,
        job: &'a CronJob,
        trigger: RunTrigger,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = JobExecutionResult> + Send + 'a>>;
}

/// In-memory collection of cron jobs plus the single-flight locks guarding
/// their execution. Persistence is handled separately by `scheduler::store`.
#[derive(Debug, Default)]
pub struct CronScheduler {
    jobs: HashMap<Uuid, CronJob>,
    locks: HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>,
}

impl CronScheduler {
    pub fn new() -> Self {
        Self {
            jobs: HashMap::new(),
            locks: HashMap::new(),
        }
    }

    pub fn from_jobs(jobs: Vec<CronJob>) -> Self {
        let mut scheduler = Self::new();
        for job in jobs {
            scheduler.insert(job);
        }
        scheduler
    }

    fn insert(&mut self, mut job: CronJob) {
        if job.state.next_run_at_ms.is_none() {
            job.state.next_run_at_ms =
                compute_next_run_at_ms(&job.schedule, now_ms(), job.id).ok().flatten();
        }
        self.locks.entry(job.id).or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())));
        self.jobs.insert(job.id, job);
    }

    pub fn add_job(&mut self, job: CronJob) -> Result<(), SchedulerError> {
        if self.jobs.contains_key(&job.id) {
            return Err(SchedulerError::JobAlreadyExists {
                name: job.name.clone(),
            });
        }
        self.insert(job);
        Ok(())
    }

    pub fn remove_job(&mut self, id: Uuid) -> Result<CronJob, SchedulerError> {
        self.locks.remove(&id);
        self.jobs.remove(&id).ok_or(SchedulerError::JobNotFound {
            name: id.to_string(),
        })
    }

    pub fn get_job(&self, id: Uuid) -> Option<&CronJob> {
        self.jobs.get(&id)
    }

    pub fn jobs(&self) -> impl Iterator<Item = &CronJob> {
        self.jobs.values()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Jobs due at `now_ms`, sorted ascending by next-run time, tie-broken by id.
    pub fn due_jobs(&self, now_ms: i64) -> Vec<Uuid> {
        let mut due: Vec<&CronJob> = self.jobs.values().filter(|j| j.is_due(now_ms)).collect();
        due.sort_by(|a, b| {
            a.state
                .next_run_at_ms
                .cmp(&b.state.next_run_at_ms)
                .then_with(|| a.id.cmp(&b.id))
        });
        due.into_iter().map(|j| j.id).collect()
    }

    /// Milliseconds until the next timer wake, capped at `MAX_TIMER_DELAY_MS`.
    pub fn next_wake_delay_ms(&self, now_ms: i64) -> i64 {
        let min_next = self
            .jobs
            .values()
            .filter(|j| j.enabled && !j.is_running())
            .filter_map(|j| j.state.next_run_at_ms)
            .min();
        match min_next {
            Some(next) => (next - now_ms).clamp(0, MAX_TIMER_DELAY_MS),
            None => MAX_TIMER_DELAY_MS,
        }
    }

    /// Restore at startup: identify every enabled job whose `next_run_at_ms`
    /// is already in the past and isn't blocked by a one-shot terminal
    /// status, so the caller can run them once with `RunTrigger::CatchUp`.
    pub fn catch_up_candidates(&self, now_ms: i64) -> Vec<Uuid> {
        self.due_jobs(now_ms)
    }

    /// Acquire a job's single-flight lock, marking it running. Returns
    /// `AlreadyRunning` without blocking if it's already held.
    pub fn try_start(&mut self, id: Uuid, at_ms: i64) -> RunOutcome {
        let Some(job) = self.jobs.get_mut(&id) else {
            return RunOutcome::AlreadyRunning;
        };
        if !job.enabled {
            return RunOutcome::Disabled;
        }
        if job.state.running_at_ms.is_some() {
            return RunOutcome::AlreadyRunning;
        }
        job.state.running_at_ms = Some(at_ms);
        RunOutcome::Ran { status: RunStatus::Ok }
    }

    /// Release a job's single-flight lock and record the completed run.
    pub fn finish_run(
        &mut self,
        id: Uuid,
        scheduled_run_at_ms: i64,
        ended_at_ms: i64,
        result: &JobExecutionResult,
        delivery_status: DeliveryStatus,
    ) {
        let job_id = id;
        let Some(job) = self.jobs.get_mut(&id) else { return };
        let status = result.status.unwrap_or(RunStatus::Ok);
        job.state.running_at_ms = None;
        job.state.last_run_at_ms = Some(ended_at_ms);
        job.state.last_run_status = Some(status);
        job.state.last_error = result.error.clone();
        job.state.last_duration_ms = Some((ended_at_ms - scheduled_run_at_ms).max(0));
        job.state.last_delivery_status = Some(delivery_status);
        job.state.last_delivered = result.delivered;
        if result.error.is_some() {
            job.state.last_delivery_error = result.error.clone();
        }

        match status {
            RunStatus::Error => job.state.consecutive_errors += 1,
            _ => job.state.consecutive_errors = 0,
        }

        if job.delete_after_run && matches!(status, RunStatus::Ok | RunStatus::Skipped | RunStatus::Error) {
            job.enabled = false;
            job.state.next_run_at_ms = None;
            return;
        }

        match reschedule_after_run(&job.schedule, ended_at_ms, scheduled_run_at_ms, job_id) {
            Ok(Some(mut next)) => {
                if job.state.consecutive_errors > 0 {
                    let backoff_ms = (1_000i64 * 2i64.pow(job.state.consecutive_errors.min(6)))
                        .min(15 * 60_000);
                    next += backoff_ms;
                }
                job.state.next_run_at_ms = Some(next);
            }
            Ok(None) | Err(_) => {
                job.state.schedule_error_count += 1;
                if job.state.schedule_error_count >= 3 {
                    job.enabled = false;
                    job.state.next_run_at_ms = None;
                } else {
                    job.state.next_run_at_ms = Some(ended_at_ms + MAX_TIMER_DELAY_MS);
                }
            }
        }
    }

    /// Manual run request: returns the lock status without mutating a
    /// disabled job unless `force` is set.
    pub fn request_manual_run(&mut self, id: Uuid, force: bool) -> RunOutcome {
        let Some(job) = self.jobs.get_mut(&id) else {
            return RunOutcome::AlreadyRunning;
        };
        if job.state.running_at_ms.is_some() {
            return RunOutcome::AlreadyRunning;
        }
        if !job.enabled && !force {
            return RunOutcome::Disabled;
        }
        job.state.running_at_ms = Some(now_ms());
        RunOutcome::Ran { status: RunStatus::Ok }
    }

    pub fn to_json(&self) -> Result<String, SchedulerError> {
        let jobs: Vec<&CronJob> = self.jobs.values().collect();
        serde_json::to_string_pretty(&jobs).map_err(|e| SchedulerError::PersistenceError {
            message: e.to_string(),
        })
    }

    pub fn from_json(json: &str) -> Result<Self, SchedulerError> {
        let jobs: Vec<CronJob> =
            serde_json::from_str(json).map_err(|e| SchedulerError::PersistenceError {
                message: e.to_string(),
            })?;
        Ok(Self::from_jobs(jobs))
    }
}
