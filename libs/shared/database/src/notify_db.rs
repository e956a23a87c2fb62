// libs/shared/database/src/notify_db.rs
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use shared_models::SniperError;

/// Seen-set of already notified appointments.
///
/// Maps a notification key (the doctor's display name) to the appointment
/// timestamps that were already announced for it. The file is a flat JSON
/// object and is rewritten atomically on every `record`, so a crash can only
/// lose the record being written, never an older one. Entries are never
/// evicted.
#[derive(Debug)]
pub struct NotifyDb {
    path: PathBuf,
    entries: BTreeMap<String, Vec<String>>,
}

impl NotifyDb {
    /// Open the store at `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SniperError> {
        let path = path.into();

        let entries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                SniperError::Storage(format!(
                    "Notification database {} is corrupt: {}",
                    path.display(),
                    e
                ))
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("Notification database {} not found, starting empty", path.display());
                BTreeMap::new()
            }
            Err(e) => {
                return Err(SniperError::Storage(format!(
                    "Cannot read notification database {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        debug!(keys = entries.len(), "Opened notification database {}", path.display());
        Ok(Self { path, entries })
    }

    pub fn is_known(&self, key: &str, timestamp: &str) -> bool {
        self.entries
            .get(key)
            .map(|seen| seen.iter().any(|t| t == timestamp))
            .unwrap_or(false)
    }

    /// Add `timestamp` under `key` and flush to disk before returning.
    ///
    /// Returns `Ok(false)` when the pair was already stored. On a failed
    /// write the in-memory state is rolled back so memory and disk agree.
    pub fn record(&mut self, key: &str, timestamp: &str) -> Result<bool, SniperError> {
        if self.is_known(key, timestamp) {
            debug!(key, timestamp, "Already recorded");
            return Ok(false);
        }

        self.entries
            .entry(key.to_string())
            .or_default()
            .push(timestamp.to_string());

        if let Err(e) = self.persist() {
            warn!(key, timestamp, "Rolling back unsaved record: {}", e);
            self.rollback(key, timestamp);
            return Err(e);
        }

        Ok(true)
    }

    pub fn timestamps(&self, key: &str) -> &[String] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of stored (key, timestamp) pairs.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn rollback(&mut self, key: &str, timestamp: &str) {
        if let Some(seen) = self.entries.get_mut(key) {
            seen.retain(|t| t != timestamp);
            if seen.is_empty() {
                self.entries.remove(key);
            }
        }
    }

    fn persist(&self) -> Result<(), SniperError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(tmp.as_file_mut(), &self.entries)
            .map_err(|e| SniperError::Storage(format!("Cannot serialize notifications: {}", e)))?;
        tmp.as_file_mut().flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| {
            SniperError::Storage(format!(
                "Cannot write notification database {}: {}",
                self.path.display(),
                e.error
            ))
        })?;

        Ok(())
    }
}
