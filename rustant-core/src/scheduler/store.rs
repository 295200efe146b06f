//! Cron store — crash-safe JSON persistence for the scheduler's job list.
//!
//! Generalizes the tmp-write + rename idiom already used elsewhere in this
//! module, adding a best-effort `.bak` copy of the previous file before each
//! replace so a corrupted write never loses the last-known-good state.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::SchedulerError;
use crate::scheduler::cron::CronJob;

/// On-disk shape of the cron store file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CronStoreState {
    pub version: u32,
    pub jobs: Vec<CronJob>,
}

impl Default for CronStoreState {
    fn default() -> Self {
        Self {
            version: 1,
            jobs: Vec::new(),
        }
    }
}

/// Default path for the cron store: `<config_dir>/cron/jobs.json`.
pub fn resolve_cron_store_path(config_dir: &Path, override_path: Option<&Path>) -> PathBuf {
    match override_path {
        Some(p) => p.to_path_buf(),
        None => config_dir.join("cron").join("jobs.json"),
    }
}

/// Load the store. A missing file is an empty store, not an error; a file
/// that exists but fails to parse is a loud failure (distinct from a cold
/// start), since silently discarding jobs on a parse error would be a
/// data-loss surprise.
pub fn load_cron_store(path: &Path) -> Result<CronStoreState, SchedulerError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => json5::from_str(&contents).map_err(|e| SchedulerError::PersistenceError {
            message: format!("failed to parse cron store at {}: {e}", path.display()),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CronStoreState::default()),
        Err(e) => Err(SchedulerError::PersistenceError {
            message: format!("failed to read cron store at {}: {e}", path.display()),
        }),
    }
}

/// Persist the store atomically: write to a uniquely-named temp file in the
/// same directory, best-effort copy the existing file to `.bak`, then
/// rename the temp file over the real path.
pub fn save_cron_store(path: &Path, state: &CronStoreState) -> Result<(), SchedulerError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| SchedulerError::PersistenceError {
        message: format!("failed to create cron store directory: {e}"),
    })?;

    let json = serde_json::to_string_pretty(state).map_err(|e| SchedulerError::PersistenceError {
        message: e.to_string(),
    })?;

    let random_hex: String = {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        (0..8).map(|_| format!("{:x}", rng.gen_range(0..16u8))).collect()
    };
    let tmp_path = parent.join(format!(
        "{}.{}.{}.tmp",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("jobs.json"),
        std::process::id(),
        random_hex,
    ));

    std::fs::write(&tmp_path, &json).map_err(|e| SchedulerError::PersistenceError {
        message: format!("failed to write cron store temp file: {e}"),
    })?;

    if path.exists() {
        let bak_path = path.with_extension("json.bak");
        let _ = std::fs::copy(path, bak_path);
    }

    std::fs::rename(&tmp_path, path).map_err(|e| SchedulerError::PersistenceError {
        message: format!("failed to rename cron store into place: {e}"),
    })?;
    Ok(())
}

/// Parses the on-disk store format. Named `json5` rather than inlined under
/// `serde_json` directly because hand-edited job files are a real use case
/// for this store and a relaxed (comments/trailing-commas) parser is the
/// obvious place to grow into; today this is a plain `serde_json` passthrough.
mod json5 {
    pub fn from_str<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::cron::{CronJob, JobPayload, JobSchedule, SessionTarget, WakeMode};
    use tempfile::TempDir;

    fn sample_job() -> CronJob {
        CronJob::new(
            "reminder",
            JobSchedule::Every {
                interval_ms: 60_000,
                anchor_ms: None,
            },
            SessionTarget::Isolated,
            WakeMode::Now,
            JobPayload::AgentTurn {
                message: "ping".into(),
                timeout_seconds: None,
            },
        )
    }

    #[test]
    fn test_load_missing_file_returns_empty_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jobs.json");
        let state = load_cron_store(&path).unwrap();
        assert_eq!(state.version, 1);
        assert!(state.jobs.is_empty());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cron").join("jobs.json");
        let state = CronStoreState {
            version: 1,
            jobs: vec![sample_job()],
        };
        save_cron_store(&path, &state).unwrap();
        let loaded = load_cron_store(&path).unwrap();
        assert_eq!(loaded.jobs.len(), 1);
        assert_eq!(loaded.jobs[0].name, "reminder");
    }

    #[test]
    fn test_save_writes_backup_of_previous_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jobs.json");
        let first = CronStoreState {
            version: 1,
            jobs: vec![sample_job()],
        };
        save_cron_store(&path, &first).unwrap();
        let second = CronStoreState {
            version: 1,
            jobs: vec![],
        };
        save_cron_store(&path, &second).unwrap();

        let bak_path = path.with_extension("json.bak");
        assert!(bak_path.exists());
        let bak_state = load_cron_store(&bak_path).unwrap();
        assert_eq!(bak_state.jobs.len(), 1);
    }

    #[test]
    fn test_resolve_cron_store_path_default() {
        let config_dir = Path::new("/tmp/rustant-config");
        let path = resolve_cron_store_path(config_dir, None);
        assert_eq!(path, config_dir.join("cron").join("jobs.json"));
    }

    #[test]
    fn test_resolve_cron_store_path_override() {
        let config_dir = Path::new("/tmp/rustant-config");
        let custom = Path::new("/tmp/custom/jobs.json");
        let path = resolve_cron_store_path(config_dir, Some(custom));
        assert_eq!(path, custom);
    }

    #[test]
    fn test_load_malformed_store_fails_loudly() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jobs.json");
        std::fs::write(&path, "{ not json ").unwrap();
        assert!(load_cron_store(&path).is_err());
    }
}
