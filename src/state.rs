//! Persisted build state.
//!
//! Two JSON documents live under `<workspace>/scripts/`:
//!
//! - `build_history.json` - append-only array of [`BuildAttempt`]s
//! - `build_optimizations.json` - object mapping a platform key to its
//!   [`PlatformConfig`]
//!
//! Loading never fails: a missing, unreadable or malformed document yields the
//! default (the malformed content is discarded). Individual history entries
//! and platform records that do not decode are carried through unchanged, so
//! saving never drops data written by another version or another platform. Saving goes through a
//! temporary file that is renamed over the target, so an interrupted write
//! leaves the previous document intact. There is no cross-process locking.

use crate::config::PlatformConfig;
use crate::platform::Platform;
use chrono::Local;
use colored::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use thiserror::Error;

pub const HISTORY_FILE: &str = "build_history.json";
pub const OPTIMIZATION_FILE: &str = "build_optimizations.json";

/// Entries kept when the history is written back.
pub const HISTORY_LIMIT: usize = 500;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptKind {
    Configure,
    Build,
}

/// One configure or build invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildAttempt {
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: AttemptKind,
    /// Command line exactly as executed.
    pub command: String,
    pub success: bool,
    /// Wall-clock seconds.
    pub duration: f64,
    pub returncode: i32,
}

impl BuildAttempt {
    pub fn new(kind: AttemptKind, command: String, exit_code: i32, elapsed: Duration) -> Self {
        Self {
            timestamp: Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            kind,
            command,
            success: exit_code == 0,
            duration: elapsed.as_secs_f64(),
            returncode: exit_code,
        }
    }

    pub fn is_successful_build(&self) -> bool {
        self.kind == AttemptKind::Build && self.success
    }
}

/// One element of `build_history.json`.
///
/// Entries written by this version decode into [`BuildAttempt`]; anything else
/// is kept as the raw JSON value and written back as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HistoryEntry {
    Attempt(BuildAttempt),
    Raw(Value),
}

impl HistoryEntry {
    pub fn attempt(&self) -> Option<&BuildAttempt> {
        match self {
            HistoryEntry::Attempt(attempt) => Some(attempt),
            HistoryEntry::Raw(_) => None,
        }
    }

    /// Duration of a successful build. Raw entries qualify when their
    /// `type`, `success` and `duration` keys say so; missing keys disqualify.
    pub fn successful_build_duration(&self) -> Option<f64> {
        match self {
            HistoryEntry::Attempt(attempt) => {
                attempt.is_successful_build().then_some(attempt.duration)
            }
            HistoryEntry::Raw(value) => {
                let is_build = value.get("type").and_then(Value::as_str) == Some("build");
                let success = value.get("success").and_then(Value::as_bool) == Some(true);
                if is_build && success {
                    value.get("duration").and_then(Value::as_f64)
                } else {
                    None
                }
            }
        }
    }
}

impl From<BuildAttempt> for HistoryEntry {
    fn from(attempt: BuildAttempt) -> Self {
        HistoryEntry::Attempt(attempt)
    }
}

/// Contents of `build_optimizations.json`: platform key to stored record.
/// Records stay raw until [`StateStore::platform_record`] decodes one.
pub type Optimizations = BTreeMap<String, Value>;

/// Reads a JSON document, falling back to `default` on any problem.
pub fn load_json<T: DeserializeOwned>(path: &Path, default: T) -> T {
    if !path.exists() {
        return default;
    }

    let parsed = fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()));

    match parsed {
        Ok(value) => value,
        Err(e) => {
            warn_discarded(path, &e);
            default
        }
    }
}

/// Writes a JSON document through a temporary file in the same directory.
pub fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StateError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let io_err = |source: io::Error| StateError::Io {
        path: path.to_path_buf(),
        source,
    };

    fs::create_dir_all(dir).map_err(io_err)?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    serde_json::to_writer_pretty(&mut tmp, value)?;
    tmp.write_all(b"\n").map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;

    log::debug!("saved {}", path.display());
    Ok(())
}

fn warn_discarded(path: &Path, reason: &str) {
    eprintln!(
        "   {} Warning: Failed to load {}: {}",
        "⚠".yellow(),
        path.display(),
        reason
    );
}

/// Location of the two state documents.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn history_path(&self) -> PathBuf {
        self.dir.join(HISTORY_FILE)
    }

    pub fn optimizations_path(&self) -> PathBuf {
        self.dir.join(OPTIMIZATION_FILE)
    }

    /// Loads the history. Entries that do not decode are kept raw.
    pub fn load_history(&self) -> Vec<HistoryEntry> {
        let path = self.history_path();
        match load_json(&path, Value::Array(Vec::new())) {
            Value::Array(entries) => entries
                .into_iter()
                .map(|entry| match serde_json::from_value::<BuildAttempt>(entry.clone()) {
                    Ok(attempt) => HistoryEntry::Attempt(attempt),
                    Err(e) => {
                        log::debug!("keeping undecoded history entry: {}", e);
                        HistoryEntry::Raw(entry)
                    }
                })
                .collect(),
            _ => {
                warn_discarded(&path, "expected a JSON array");
                Vec::new()
            }
        }
    }

    /// Saves the most recent [`HISTORY_LIMIT`] entries.
    pub fn save_history(&self, history: &[HistoryEntry]) -> Result<(), StateError> {
        let start = history.len().saturating_sub(HISTORY_LIMIT);
        save_json(&self.history_path(), &history[start..])
    }

    pub fn load_optimizations(&self) -> Optimizations {
        let path = self.optimizations_path();
        match load_json(&path, Value::Object(Default::default())) {
            Value::Object(entries) => entries.into_iter().collect(),
            _ => {
                warn_discarded(&path, "expected a JSON object");
                BTreeMap::new()
            }
        }
    }

    /// Decodes the record stored for `platform`, filling missing keys from
    /// that platform's defaults. A record that does not decode is ignored
    /// with a warning and left untouched in `optimizations`.
    pub fn platform_record(
        &self,
        optimizations: &Optimizations,
        platform: Platform,
        cores: usize,
    ) -> Option<PlatformConfig> {
        let stored = optimizations.get(platform.key())?;
        match PlatformConfig::from_stored(platform, cores, stored) {
            Ok(record) => Some(record),
            Err(e) => {
                warn_discarded(
                    &self.optimizations_path(),
                    &format!("entry '{}': {}", platform.key(), e),
                );
                None
            }
        }
    }

    pub fn save_optimizations(&self, optimizations: &Optimizations) -> Result<(), StateError> {
        save_json(&self.optimizations_path(), optimizations)
    }
}
