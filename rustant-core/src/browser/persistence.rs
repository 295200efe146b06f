//! Browser session persistence for reconnecting across Rustant sessions.
//!
//! Saves browser connection info (debug port, WebSocket URL, tabs) to
//! `.rustant/browser-session.json` so subsequent Rustant invocations can
//! reconnect to the same Chrome instance instead of launching a new one.

use crate::browser::cdp::TabInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

/// Persisted browser connection metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConnectionInfo {
    pub debug_port: u16,
    pub ws_url: Option<String>,
    pub user_data_dir: Option<PathBuf>,
    pub tabs: Vec<TabInfo>,
    pub active_tab_id: Option<String>,
    pub saved_at: DateTime<Utc>,
}

/// Handles saving/loading browser session files.
pub struct BrowserSessionStore;

const SESSION_FILE: &str = ".rustant/browser-session.json";

impl BrowserSessionStore {
    /// Save browser connection info to the workspace.
    ///
    /// Uses atomic write (write to temp file, then rename) to prevent
    /// corruption if the process crashes mid-write.
    pub fn save(workspace: &Path, info: &BrowserConnectionInfo) -> io::Result<()> {
        let path = workspace.join(SESSION_FILE);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(info).map_err(io::Error::other)?;
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &json)?;
        std::fs::rename(&tmp_path, &path)
    }

    /// Load saved browser connection info, if it exists and is still recent.
    ///
    /// Returns `None` if the file doesn't exist or is older than `max_age`.
    pub fn load(workspace: &Path) -> io::Result<Option<BrowserConnectionInfo>> {
        let path = workspace.join(SESSION_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&path)?;
        let info: BrowserConnectionInfo = serde_json::from_str(&json)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        // Discard sessions older than 24 hours — Chrome was probably restarted.
        let age = Utc::now() - info.saved_at;
        if age.num_hours() > 24 {
            // Stale session file — remove it.
            let _ = std::fs::remove_file(&path);
            return Ok(None);
        }

        Ok(Some(info))
    }

    /// Remove the saved session file.
    pub fn clear(workspace: &Path) -> io::Result<()> {
        let path = workspace.join(SESSION_FILE);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }
}
