//! Sealed audit entries and exported logs.
//!
//! `SealedEntry` wraps an `AuditEntry` with its chain position and the
//! SHA-256 hashes that make tampering detectable. `AuditLog` is a
//! point-in-time export of the whole chain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use warden_contracts::audit::AuditEntry;

/// A single link in the audit hash chain.
///
/// The hash covers every field of `entry` except `resolved_at`, which is the
/// one field allowed to change after append. Changing anything else
/// invalidates `this_hash` and every later `prev_hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealedEntry {
    /// Position in the chain, starting at 0.
    pub sequence: u64,

    pub entry: AuditEntry,

    /// `this_hash` of the previous entry, or `GENESIS_HASH` for the first.
    pub prev_hash: String,

    /// SHA-256 (hex) over (sequence, prev_hash, canonical JSON of entry).
    pub this_hash: String,
}

impl SealedEntry {
    /// The sentinel `prev_hash` of the first entry in every chain.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}

/// A point-in-time export of the audit chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    pub entries: Vec<SealedEntry>,

    pub exported_at: DateTime<Utc>,

    /// `this_hash` of the last entry. Empty if the log is empty.
    pub terminal_hash: String,
}
