//! Append-only JSON-lines journal for the audit trail.
//!
//! Each line is one `JournalRecord`. Resolution of an entry is journaled as
//! its own record; earlier lines are never rewritten. A failed write is
//! truncated away, and a torn final line left by a crash is dropped on open,
//! so later appends always land on a line boundary.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use warden_contracts::{
    audit::AuditEntryId,
    error::{WardenError, WardenResult},
};

use crate::event::SealedEntry;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum JournalRecord {
    Appended { sealed: SealedEntry },
    Resolved { id: AuditEntryId, resolved_at: DateTime<Utc> },
}

/// An open journal file.
#[derive(Debug)]
pub struct Journal {
    path: PathBuf,
    file: File,
}

impl Journal {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: &Path) -> WardenResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| WardenError::AuditWriteFailed {
                reason: format!("failed to open audit journal '{}': {}", path.display(), e),
            })?;
        Ok(Self { path: path.to_path_buf(), file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write one record and sync it to disk before returning.
    ///
    /// On failure the file is cut back to its length before the write.
    pub fn write(&mut self, record: &JournalRecord) -> WardenResult<()> {
        let mut line = serde_json::to_vec(record).map_err(|e| self.failure(e))?;
        line.push(b'\n');
        let committed = self.file.metadata().map_err(|e| self.failure(e))?.len();

        let written = self
            .file
            .write_all(&line)
            .and_then(|()| self.file.sync_data());
        if let Err(e) = written {
            self.truncate_to(committed);
            return Err(self.failure(e));
        }
        Ok(())
    }

    fn truncate_to(&mut self, len: u64) {
        let restored = self.file.set_len(len).and_then(|()| self.file.sync_data());
        if let Err(e) = restored {
            error!(path = %self.path.display(), len, error = %e, "failed to truncate partial journal write");
        }
    }

    /// Drop a torn final line, one with no trailing newline, from `path`.
    /// Returns the number of bytes removed. A missing file needs no repair.
    pub fn repair(path: &Path) -> WardenResult<u64> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(WardenError::ConfigError {
                    reason: format!("failed to read audit journal '{}': {}", path.display(), e),
                })
            }
        };
        if bytes.last().map_or(true, |b| *b == b'\n') {
            return Ok(0);
        }

        let keep = bytes.iter().rposition(|b| *b == b'\n').map_or(0, |i| i + 1);
        let torn = (bytes.len() - keep) as u64;
        OpenOptions::new()
            .write(true)
            .open(path)
            .and_then(|f| {
                f.set_len(keep as u64)?;
                f.sync_data()
            })
            .map_err(|e| WardenError::ConfigError {
                reason: format!("failed to repair audit journal '{}': {}", path.display(), e),
            })?;
        warn!(path = %path.display(), bytes = torn, "dropped torn final line from audit journal");
        Ok(torn)
    }

    /// Read every record in `path`. A missing file is an empty journal.
    pub fn replay(path: &Path) -> WardenResult<Vec<JournalRecord>> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(WardenError::ConfigError {
                    reason: format!("failed to read audit journal '{}': {}", path.display(), e),
                })
            }
        };

        let mut records = Vec::new();
        for (number, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| WardenError::ConfigError {
                reason: format!("failed to read audit journal '{}': {}", path.display(), e),
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|e| WardenError::ConfigError {
                reason: format!(
                    "corrupt audit journal '{}' at line {}: {}",
                    path.display(),
                    number + 1,
                    e
                ),
            })?;
            records.push(record);
        }
        Ok(records)
    }

    fn failure<E: std::fmt::Display>(&self, e: E) -> WardenError {
        WardenError::AuditWriteFailed {
            reason: format!("audit journal '{}': {}", self.path.display(), e),
        }
    }
}
