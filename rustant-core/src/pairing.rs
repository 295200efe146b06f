//! Allowlist & Pairing Store.
//!
//! Two small JSON files per channel (optionally per account) under
//! `<state_dir>/oauth/`: a pending-pairing-request queue and an approved
//! allowFrom list. A DM from an unrecognized sender gets a pairing code; an
//! operator approves the code out-of-band, which moves the sender from
//! "pending" to "allowed". Nothing here auto-trusts a sender — approval is
//! always an explicit, separate call.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::PairingError;

/// Requests older than this are pruned and can no longer be approved.
const PAIRING_TTL: Duration = Duration::hours(2);
/// Maximum number of pending requests kept per channel at once.
const PENDING_CAP: usize = 3;
const CODE_LEN: usize = 8;
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Account ids invalid for use as a map/path key component.
const BLOCKED_ACCOUNT_IDS: &[&str] = &["__proto__", "constructor", "prototype"];

/// A sender awaiting operator approval into a channel's allowFrom list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairingRequest {
    /// The sender's raw platform id (not yet allowlisted).
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// 8-character uppercase A-Z code shown to the sender.
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl PairingRequest {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at > PAIRING_TTL
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PairingFile {
    version: u32,
    requests: Vec<PairingRequest>,
}

impl Default for PairingFile {
    fn default() -> Self {
        Self {
            version: 1,
            requests: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AllowFromFile {
    version: u32,
    allow_from: Vec<String>,
}

impl Default for AllowFromFile {
    fn default() -> Self {
        Self {
            version: 1,
            allow_from: Vec::new(),
        }
    }
}

/// Result of `upsert_pairing_request`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// Empty when the pending cap was reached and no request was created.
    pub code: String,
    pub created: bool,
}

/// Result of an allowFrom add/remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeOutcome {
    pub changed: bool,
    pub allow_from: Vec<String>,
}

/// Validate and normalize an account id: lowercase `[a-z0-9][a-z0-9_-]{0,63}`,
/// invalid characters replaced with `-`, blocked keys rejected, default
/// `"default"`.
pub fn normalize_account_id(raw: Option<&str>) -> Result<String, PairingError> {
    let raw = raw.unwrap_or("default").trim();
    if raw.is_empty() {
        return Ok("default".to_string());
    }
    let lower = raw.to_lowercase();
    if BLOCKED_ACCOUNT_IDS.contains(&lower.as_str()) {
        return Err(PairingError::InvalidAccountId {
            account_id: raw.to_string(),
        });
    }
    let sanitized: String = lower
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '-' })
        .take(64)
        .collect();
    Ok(sanitized)
}

/// Normalize a raw allowFrom entry: strip a `user:`/`<channel>:` prefix and a
/// leading `@`, lowercase. A literal `*` passes through unchanged.
pub fn normalize_allow_from_entry(channel: &str, raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "*" {
        return "*".to_string();
    }
    let channel_prefix = format!("{channel}:");
    let stripped = trimmed
        .strip_prefix("user:")
        .or_else(|| trimmed.strip_prefix(channel_prefix.as_str()))
        .unwrap_or(trimmed);
    stripped.trim_start_matches('@').to_lowercase()
}

fn pairing_path(state_dir: &Path, channel: &str) -> PathBuf {
    state_dir.join("oauth").join(format!("{channel}-pairing.json"))
}

fn allow_from_path(state_dir: &Path, channel: &str, account_id: Option<&str>) -> PathBuf {
    match account_id {
        Some(account) => state_dir
            .join("oauth")
            .join(format!("{channel}-{account}-allowFrom.json")),
        None => state_dir.join("oauth").join(format!("{channel}-allowFrom.json")),
    }
}

fn load_json<T>(path: &Path) -> T
where
    T: Default + for<'de> Deserialize<'de>,
{
    match std::fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "malformed pairing store, resetting");
            T::default()
        }),
        Err(_) => T::default(),
    }
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PairingError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| PairingError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let json = serde_json::to_string_pretty(value).map_err(|e| PairingError::Malformed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let tmp = path.with_extension(format!("{}.tmp", std::process::id()));
    std::fs::write(&tmp, json).map_err(|e| PairingError::Io {
        path: tmp.clone(),
        message: e.to_string(),
    })?;
    std::fs::rename(&tmp, path).map_err(|e| PairingError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(())
}

fn generate_code(existing: &[PairingRequest]) -> String {
    let mut rng = rand::thread_rng();
    loop {
        let code: String = (0..CODE_LEN)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect();
        if !existing.iter().any(|r| r.code.eq_ignore_ascii_case(&code)) {
            return code;
        }
    }
}

/// Owns the `<state_dir>/oauth/` tree of pairing-request and allowFrom files.
#[derive(Debug, Clone)]
pub struct PairingStore {
    state_dir: PathBuf,
}

impl PairingStore {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
        }
    }

    /// Insert or refresh a pending pairing request for `(channel, account_id, id)`.
    pub fn upsert_pairing_request(
        &self,
        channel: &str,
        account_id: Option<&str>,
        id: &str,
        meta: Option<serde_json::Value>,
    ) -> Result<UpsertOutcome, PairingError> {
        let account_id = normalize_account_id(account_id)?;
        let path = pairing_path(&self.state_dir, channel);
        let mut file: PairingFile = load_json(&path);
        let now = Utc::now();
        file.requests.retain(|r| !r.is_expired(now));

        if let Some(existing) = file
            .requests
            .iter_mut()
            .find(|r| r.account_id.as_deref() == Some(account_id.as_str()) && r.id == id)
        {
            existing.last_seen_at = now;
            let code = existing.code.clone();
            save_json(&path, &file)?;
            return Ok(UpsertOutcome { code, created: false });
        }

        if file.requests.len() >= PENDING_CAP {
            return Ok(UpsertOutcome {
                code: String::new(),
                created: false,
            });
        }

        let code = generate_code(&file.requests);
        file.requests.push(PairingRequest {
            id: id.to_string(),
            account_id: Some(account_id),
            code: code.clone(),
            created_at: now,
            last_seen_at: now,
            meta,
        });
        save_json(&path, &file)?;
        Ok(UpsertOutcome { code, created: true })
    }

    /// Approve a pending code, moving its sender into the allowFrom list.
    /// Returns `None` for a blank code, an unknown code, or an expired request.
    pub fn approve_pairing_code(
        &self,
        channel: &str,
        code: &str,
        account_id: Option<&str>,
    ) -> Result<Option<String>, PairingError> {
        if code.trim().is_empty() {
            return Ok(None);
        }
        let path = pairing_path(&self.state_dir, channel);
        let mut file: PairingFile = load_json(&path);
        let now = Utc::now();
        file.requests.retain(|r| !r.is_expired(now));

        let idx = file.requests.iter().position(|r| {
            r.code.eq_ignore_ascii_case(code)
                && account_id.map(|a| r.account_id.as_deref() == Some(a)).unwrap_or(true)
        });
        let Some(idx) = idx else {
            save_json(&path, &file)?;
            return Ok(None);
        };
        let request = file.requests.remove(idx);
        save_json(&path, &file)?;

        self.add_allow_from_entry(channel, request.account_id.as_deref(), &request.id)?;
        Ok(Some(request.id))
    }

    /// Number of currently-pending (unexpired) requests for a channel.
    pub fn pending_count(&self, channel: &str) -> usize {
        let path = pairing_path(&self.state_dir, channel);
        let file: PairingFile = load_json(&path);
        let now = Utc::now();
        file.requests.iter().filter(|r| !r.is_expired(now)).count()
    }

    /// Read the effective allowFrom list: account-scoped entries first, then
    /// legacy channel-scoped entries, deduplicated case-insensitively
    /// (original casing of the first occurrence preserved). `*` and
    /// whitespace-only entries are stripped.
    pub fn read_allow_from(&self, channel: &str, account_id: Option<&str>) -> Result<Vec<String>, PairingError> {
        let mut combined = Vec::new();
        if let Some(account) = account_id {
            let account = normalize_account_id(Some(account))?;
            let scoped_path = allow_from_path(&self.state_dir, channel, Some(&account));
            let scoped: AllowFromFile = load_json(&scoped_path);
            combined.extend(scoped.allow_from);
        }
        let legacy_path = allow_from_path(&self.state_dir, channel, None);
        let legacy: AllowFromFile = load_json(&legacy_path);
        combined.extend(legacy.allow_from);

        let mut seen = std::collections::HashSet::new();
        let mut result = Vec::new();
        for entry in combined {
            let trimmed = entry.trim();
            if trimmed.is_empty() || trimmed == "*" {
                continue;
            }
            let key = trimmed.to_lowercase();
            if seen.insert(key) {
                result.push(trimmed.to_string());
            }
        }
        Ok(result)
    }

    /// Idempotently add an entry to a channel's (optionally account-scoped)
    /// allowFrom file.
    pub fn add_allow_from_entry(
        &self,
        channel: &str,
        account_id: Option<&str>,
        entry: &str,
    ) -> Result<ChangeOutcome, PairingError> {
        let normalized_account = match account_id {
            Some(a) => Some(normalize_account_id(Some(a))?),
            None => None,
        };
        let path = allow_from_path(&self.state_dir, channel, normalized_account.as_deref());
        let mut file: AllowFromFile = load_json(&path);
        let normalized_entry = normalize_allow_from_entry(channel, entry);

        let already_present = file
            .allow_from
            .iter()
            .any(|e| normalize_allow_from_entry(channel, e) == normalized_entry);
        if already_present {
            return Ok(ChangeOutcome {
                changed: false,
                allow_from: file.allow_from,
            });
        }
        file.allow_from.push(normalized_entry);
        save_json(&path, &file)?;
        Ok(ChangeOutcome {
            changed: true,
            allow_from: file.allow_from,
        })
    }

    /// Idempotently remove an entry from a channel's allowFrom file.
    pub fn remove_allow_from_entry(
        &self,
        channel: &str,
        account_id: Option<&str>,
        entry: &str,
    ) -> Result<ChangeOutcome, PairingError> {
        let normalized_account = match account_id {
            Some(a) => Some(normalize_account_id(Some(a))?),
            None => None,
        };
        let path = allow_from_path(&self.state_dir, channel, normalized_account.as_deref());
        let mut file: AllowFromFile = load_json(&path);
        let normalized_entry = normalize_allow_from_entry(channel, entry);

        let before = file.allow_from.len();
        file.allow_from
            .retain(|e| normalize_allow_from_entry(channel, e) != normalized_entry);
        let changed = file.allow_from.len() != before;
        if changed {
            save_json(&path, &file)?;
        }
        Ok(ChangeOutcome {
            changed,
            allow_from: file.allow_from,
        })
    }
}
