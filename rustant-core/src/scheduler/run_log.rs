//! Run log — append-only JSONL history of cron job executions.
//!
//! One file per job at `<store_dir>/runs/<job_id>.jsonl`. Writes are
//! serialized per path through a `tokio::sync::Mutex` registry (mirroring
//! the single-writer-per-path discipline `scheduler/persistence.rs` already
//! applies to its tmp+rename saves) so concurrent appends never interleave
//! partial lines. Oversized logs are pruned by rewriting to keep only the
//! most recent entries.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::SchedulerError;
use crate::scheduler::cron::{DeliveryStatus, RunStatus, RunTrigger};

/// Prune once a job's log file exceeds this size...
pub const DEFAULT_MAX_BYTES: u64 = 2_000_000;
/// ...keeping this many of the most recent lines.
pub const DEFAULT_KEEP_LINES: usize = 2_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLogEntry {
    pub job_id: Uuid,
    pub trigger: RunTrigger,
    pub started_at_ms: i64,
    pub finished_at_ms: i64,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_status: Option<DeliveryStatus>,
}

fn job_log_path(store_dir: &Path, job_id: Uuid) -> Result<PathBuf, SchedulerError> {
    // job_id is a Uuid, so it can never contain a path separator or NUL, but
    // validate the rendered form anyway in case a future caller passes a
    // hand-built id string through a generic path.
    let rendered = job_id.to_string();
    if rendered.contains('/') || rendered.contains('\\') || rendered.contains('\0') {
        return Err(SchedulerError::PersistenceError {
            message: format!("invalid job id for run log path: {rendered}"),
        });
    }
    Ok(store_dir.join("runs").join(format!("{rendered}.jsonl")))
}

/// Serializes writers per log file path so appends and prune-rewrites never
/// race each other.
#[derive(Debug, Default, Clone)]
pub struct RunLogWriter {
    locks: Arc<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>>,
}

impl RunLogWriter {
    pub fn new() -> Self {
        Self::default()
    }

    async fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Append one entry, then prune if the file grew past `max_bytes`.
    pub async fn append(
        &self,
        store_dir: &Path,
        entry: &RunLogEntry,
        max_bytes: u64,
        keep_lines: usize,
    ) -> Result<(), SchedulerError> {
        let path = job_log_path(store_dir, entry.job_id)?;
        let file_lock = self.lock_for(&path).await;
        let _guard = file_lock.lock().await;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SchedulerError::PersistenceError {
                message: format!("failed to create run log directory: {e}"),
            })?;
        }

        let line = serde_json::to_string(entry).map_err(|e| SchedulerError::PersistenceError {
            message: e.to_string(),
        })?;
        use std::io::Write;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| SchedulerError::PersistenceError {
                message: format!("failed to open run log {}: {e}", path.display()),
            })?;
        writeln!(file, "{line}").map_err(|e| SchedulerError::PersistenceError {
            message: format!("failed to append to run log {}: {e}", path.display()),
        })?;
        drop(file);

        let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        if size > max_bytes {
            prune_run_log(&path, keep_lines)?;
        }
        Ok(())
    }
}

fn prune_run_log(path: &Path, keep_lines: usize) -> Result<(), SchedulerError> {
    let contents = std::fs::read_to_string(path).map_err(|e| SchedulerError::PersistenceError {
        message: format!("failed to read run log for pruning: {e}"),
    })?;
    let lines: Vec<&str> = contents.lines().collect();
    if lines.len() <= keep_lines {
        return Ok(());
    }
    let kept: Vec<&str> = lines[lines.len() - keep_lines..].to_vec();
    let tmp_path = path.with_extension("jsonl.tmp");
    std::fs::write(&tmp_path, kept.join("\n") + "\n").map_err(|e| SchedulerError::PersistenceError {
        message: format!("failed to write pruned run log: {e}"),
    })?;
    std::fs::rename(&tmp_path, path).map_err(|e| SchedulerError::PersistenceError {
        message: format!("failed to replace run log with pruned copy: {e}"),
    })?;
    Ok(())
}

/// Pagination/filter options for reading a single job's run log.
#[derive(Debug, Clone, Default)]
pub struct RunLogQuery {
    pub limit: usize,
    pub offset: usize,
    pub descending: bool,
    pub status: Option<RunStatus>,
    pub delivery_status: Option<DeliveryStatus>,
    pub text: Option<String>,
}

impl RunLogQuery {
    pub fn clamped_limit(&self) -> usize {
        self.limit.clamp(1, 200)
    }
}

fn read_entries(path: &Path) -> Vec<RunLogEntry> {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    contents
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect()
}

fn matches_query(entry: &RunLogEntry, query: &RunLogQuery) -> bool {
    if let Some(status) = query.status {
        if entry.status != status {
            return false;
        }
    }
    if let Some(delivery) = query.delivery_status {
        if entry.delivery_status != Some(delivery) {
            return false;
        }
    }
    if let Some(text) = &query.text {
        let haystacks = [entry.summary.as_deref(), entry.error.as_deref()];
        let job_id = entry.job_id.to_string();
        let found = haystacks.iter().flatten().any(|h| h.contains(text.as_str())) || job_id.contains(text.as_str());
        if !found {
            return false;
        }
    }
    true
}

/// Read a single job's run log, newest-or-oldest first per `query.descending`,
/// with pagination and substring/status filters applied.
pub fn read_job_run_log(store_dir: &Path, job_id: Uuid, query: &RunLogQuery) -> Result<Vec<RunLogEntry>, SchedulerError> {
    let path = job_log_path(store_dir, job_id)?;
    let mut entries = read_entries(&path);
    if query.descending {
        entries.reverse();
    }
    let filtered: Vec<RunLogEntry> = entries.into_iter().filter(|e| matches_query(e, query)).collect();
    let limit = query.clamped_limit();
    Ok(filtered.into_iter().skip(query.offset).take(limit).collect())
}

/// Cross-job variant: reads every `*.jsonl` under `<store_dir>/runs/` and
/// returns entries decorated with the job name looked up from `job_name_by_id`.
pub fn read_all_run_logs(
    store_dir: &Path,
    job_name_by_id: &HashMap<Uuid, String>,
    query: &RunLogQuery,
) -> Vec<(RunLogEntry, Option<String>)> {
    let runs_dir = store_dir.join("runs");
    let mut all = Vec::new();
    let Ok(read_dir) = std::fs::read_dir(&runs_dir) else {
        return all;
    };
    for entry in read_dir.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
            continue;
        }
        for log_entry in read_entries(&path) {
            if matches_query(&log_entry, query) {
                let name = job_name_by_id.get(&log_entry.job_id).cloned();
                all.push((log_entry, name));
            }
        }
    }
    all.sort_by_key(|(e, _)| e.finished_at_ms);
    if query.descending {
        all.reverse();
    }
    let limit = query.clamped_limit();
    all.into_iter().skip(query.offset).take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(job_id: Uuid, status: RunStatus, finished_at_ms: i64) -> RunLogEntry {
        RunLogEntry {
            job_id,
            trigger: RunTrigger::Scheduled,
            started_at_ms: finished_at_ms - 10,
            finished_at_ms,
            status,
            error: None,
            summary: Some("done".into()),
            delivery_status: Some(DeliveryStatus::NotRequested),
        }
    }

    #[tokio::test]
    async fn test_append_and_read_back() {
        let dir = TempDir::new().unwrap();
        let writer = RunLogWriter::new();
        let job_id = Uuid::new_v4();
        let e = entry(job_id, RunStatus::Ok, 1000);
        writer.append(dir.path(), &e, DEFAULT_MAX_BYTES, DEFAULT_KEEP_LINES).await.unwrap();

        let read = read_job_run_log(dir.path(), job_id, &RunLogQuery { limit: 10, ..Default::default() }).unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].status, RunStatus::Ok);
    }

    #[tokio::test]
    async fn test_pruning_keeps_last_n_lines() {
        let dir = TempDir::new().unwrap();
        let writer = RunLogWriter::new();
        let job_id = Uuid::new_v4();
        for i in 0..50 {
            let e = entry(job_id, RunStatus::Ok, i);
            writer.append(dir.path(), &e, 200, 10).await.unwrap();
        }
        let path = job_log_path(dir.path(), job_id).unwrap();
        let lines = std::fs::read_to_string(&path).unwrap().lines().count();
        assert!(lines <= 10, "expected pruning to cap lines, got {lines}");
    }

    #[tokio::test]
    async fn test_query_filters_by_status() {
        let dir = TempDir::new().unwrap();
        let writer = RunLogWriter::new();
        let job_id = Uuid::new_v4();
        writer
            .append(dir.path(), &entry(job_id, RunStatus::Ok, 1), DEFAULT_MAX_BYTES, DEFAULT_KEEP_LINES)
            .await
            .unwrap();
        writer
            .append(dir.path(), &entry(job_id, RunStatus::Error, 2), DEFAULT_MAX_BYTES, DEFAULT_KEEP_LINES)
            .await
            .unwrap();

        let query = RunLogQuery {
            limit: 10,
            status: Some(RunStatus::Error),
            ..Default::default()
        };
        let read = read_job_run_log(dir.path(), job_id, &query).unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].status, RunStatus::Error);
    }

    #[tokio::test]
    async fn test_read_all_run_logs_decorates_with_job_name() {
        let dir = TempDir::new().unwrap();
        let writer = RunLogWriter::new();
        let job_id = Uuid::new_v4();
        writer
            .append(dir.path(), &entry(job_id, RunStatus::Ok, 1), DEFAULT_MAX_BYTES, DEFAULT_KEEP_LINES)
            .await
            .unwrap();

        let mut names = HashMap::new();
        names.insert(job_id, "reminder".to_string());
        let all = read_all_run_logs(dir.path(), &names, &RunLogQuery { limit: 10, ..Default::default() });
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].1, Some("reminder".to_string()));
    }

    #[test]
    fn test_read_missing_log_returns_empty() {
        let dir = TempDir::new().unwrap();
        let read = read_job_run_log(dir.path(), Uuid::new_v4(), &RunLogQuery { limit: 10, ..Default::default() }).unwrap();
        assert!(read.is_empty());
    }

    #[test]
    fn test_query_clamps_limit() {
        let query = RunLogQuery {
            limit: 10_000,
            ..Default::default()
        };
        assert_eq!(query.clamped_limit(), 200);
        let query = RunLogQuery { limit: 0, ..Default::default() };
        assert_eq!(query.clamped_limit(), 1);
    }
}
