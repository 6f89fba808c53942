//! The audit trail: the reference `AuditSink`.
//!
//! `AuditTrail` keeps the full hash chain in memory behind a `Mutex` and,
//! when opened with a journal, writes every append and resolution to disk
//! before acknowledging it. Entries are never evicted.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use warden_contracts::{
    audit::{AuditEntry, AuditEntryId, AuditFilter, Page},
    error::{WardenError, WardenResult},
};
use warden_core::traits::AuditSink;

use crate::{
    chain::{hash_entry, verify_chain},
    event::{AuditLog, SealedEntry},
    journal::{Journal, JournalRecord},
    phi::looks_like_phi,
};

// ── Internal mutable state ────────────────────────────────────────────────────

pub(crate) struct TrailState {
    /// All entries in append order.
    pub(crate) entries: Vec<SealedEntry>,

    /// Entry id → position in `entries`.
    index: HashMap<AuditEntryId, usize>,

    /// `this_hash` of the last entry, or `GENESIS_HASH`.
    last_hash: String,

    journal: Option<Journal>,
}

impl TrailState {
    fn empty(journal: Option<Journal>) -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            last_hash: SealedEntry::GENESIS_HASH.to_string(),
            journal,
        }
    }

    fn push(&mut self, sealed: SealedEntry) {
        self.last_hash = sealed.this_hash.clone();
        self.index.insert(sealed.entry.id, self.entries.len());
        self.entries.push(sealed);
    }
}

// ── Public trail ──────────────────────────────────────────────────────────────

/// An append-only, hash-chained audit trail.
///
/// # Thread safety
///
/// All operations take one internal `Mutex`, which also serializes journal
/// writes so the on-disk order matches the chain order. Callers must not
/// hold their own locks across calls into the trail.
pub struct AuditTrail {
    pub(crate) state: Mutex<TrailState>,
}

impl AuditTrail {
    /// A trail with no journal. Entries live for the life of the process.
    pub fn new() -> Self {
        Self { state: Mutex::new(TrailState::empty(None)) }
    }

    /// Open a trail backed by the JSON-lines journal at `path`.
    ///
    /// Existing records are replayed and the chain verified before any new
    /// entry is accepted. A broken chain is a `ConfigError`; a torn final
    /// line from an interrupted write is dropped first.
    pub fn with_journal(path: &Path) -> WardenResult<Self> {
        Journal::repair(path)?;
        let records = Journal::replay(path)?;
        let mut state = TrailState::empty(None);

        for record in records {
            match record {
                JournalRecord::Appended { sealed } => state.push(sealed),
                JournalRecord::Resolved { id, resolved_at } => {
                    let position = *state.index.get(&id).ok_or_else(|| WardenError::ConfigError {
                        reason: format!("journal resolves unknown audit entry {}", id),
                    })?;
                    state.entries[position].entry.resolved_at = Some(resolved_at);
                }
            }
        }

        if !verify_chain(&state.entries) {
            return Err(WardenError::ConfigError {
                reason: format!("audit journal '{}' failed chain verification", path.display()),
            });
        }

        info!(path = %path.display(), entries = state.entries.len(), "audit journal opened");
        state.journal = Some(Journal::open(path)?);
        Ok(Self { state: Mutex::new(state) })
    }

    fn lock(&self) -> WardenResult<MutexGuard<'_, TrailState>> {
        self.state.lock().map_err(|e| WardenError::AuditWriteFailed {
            reason: format!("audit state lock poisoned: {}", e),
        })
    }

    /// Number of entries appended so far.
    pub fn len(&self) -> usize {
        self.lock().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up one entry by id.
    pub fn get(&self, id: AuditEntryId) -> WardenResult<AuditEntry> {
        let state = self.lock()?;
        state
            .index
            .get(&id)
            .map(|&pos| state.entries[pos].entry.clone())
            .ok_or_else(|| WardenError::not_found("audit entry", id))
    }

    /// Export the whole chain.
    pub fn export_log(&self) -> WardenResult<AuditLog> {
        let state = self.lock()?;
        let terminal_hash = state
            .entries
            .last()
            .map(|e| e.this_hash.clone())
            .unwrap_or_default();

        Ok(AuditLog {
            entries: state.entries.clone(),
            exported_at: Utc::now(),
            terminal_hash,
        })
    }

    /// Confirm the in-memory chain has not been tampered with.
    pub fn verify_integrity(&self) -> bool {
        match self.lock() {
            Ok(state) => verify_chain(&state.entries),
            Err(_) => false,
        }
    }
}

impl Default for AuditTrail {
    fn default() -> Self {
        Self::new()
    }
}

// ── AuditSink impl ────────────────────────────────────────────────────────────

impl AuditSink for AuditTrail {
    /// Seal `entry` into the chain, journaling it first when a journal is
    /// open. The in-memory chain only advances once the journal write has
    /// succeeded.
    fn append(&self, mut entry: AuditEntry) -> WardenResult<AuditEntryId> {
        let mut state = self.lock()?;

        if state.index.contains_key(&entry.id) {
            return Err(WardenError::AuditImmutable {
                reason: format!("audit entry {} already exists", entry.id),
            });
        }

        entry.phi_flag = entry.phi_flag || looks_like_phi(&entry.resource);

        let sequence = state.entries.len() as u64;
        let prev_hash = state.last_hash.clone();
        let this_hash = hash_entry(sequence, &entry, &prev_hash)?;
        let id = entry.id;

        let sealed = SealedEntry { sequence, entry, prev_hash, this_hash };

        if let Some(journal) = state.journal.as_mut() {
            if let Err(e) = journal.write(&JournalRecord::Appended { sealed: sealed.clone() }) {
                warn!(entry_id = %id, error = %e, "audit journal append failed");
                return Err(e);
            }
        }

        debug!(entry_id = %id, sequence, action = ?sealed.entry.action, "audit entry appended");
        state.push(sealed);
        Ok(id)
    }

    fn mark_resolved(&self, id: AuditEntryId, at: DateTime<Utc>) -> WardenResult<()> {
        let mut state = self.lock()?;
        let position = *state
            .index
            .get(&id)
            .ok_or_else(|| WardenError::not_found("audit entry", id))?;

        if let Some(previous) = state.entries[position].entry.resolved_at {
            return Err(WardenError::AuditImmutable {
                reason: format!("audit entry {} was already resolved at {}", id, previous),
            });
        }

        if let Some(journal) = state.journal.as_mut() {
            journal.write(&JournalRecord::Resolved { id, resolved_at: at })?;
        }

        state.entries[position].entry.resolved_at = Some(at);
        debug!(entry_id = %id, resolved_at = %at, "audit entry resolved");
        Ok(())
    }

    fn query(&self, filter: &AuditFilter, page: Page) -> WardenResult<Vec<AuditEntry>> {
        let state = self.lock()?;
        Ok(state
            .entries
            .iter()
            .map(|sealed| &sealed.entry)
            .filter(|entry| filter.matches(entry))
            .skip(page.offset)
            .take(page.limit)
            .cloned()
            .collect())
    }
}
