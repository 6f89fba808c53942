//! Hash-chain primitives: hashing and chain integrity verification.
//!
//! Hash input layout (bytes, in order):
//!   1. sequence as 8-byte little-endian
//!   2. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   3. canonical JSON of the entry with `resolved_at` cleared

use sha2::{Digest, Sha256};

use warden_contracts::{
    audit::AuditEntry,
    error::{WardenError, WardenResult},
};

use crate::event::SealedEntry;

/// Compute the SHA-256 hash for one entry at `sequence` linked to `prev_hash`.
///
/// `resolved_at` is excluded so the single permitted post-append write does
/// not break the chain. Returns a lowercase 64-character hex string.
pub fn hash_entry(sequence: u64, entry: &AuditEntry, prev_hash: &str) -> WardenResult<String> {
    let mut sealed_view = entry.clone();
    sealed_view.resolved_at = None;

    let entry_json = serde_json::to_vec(&sealed_view).map_err(|e| WardenError::AuditWriteFailed {
        reason: format!("audit entry {} is not serializable: {}", entry.id, e),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&entry_json);

    Ok(hex::encode(hasher.finalize()))
}

/// Verify the integrity of a hash chain.
///
/// Returns `true` when every entry links to its predecessor (or to
/// `GENESIS_HASH`), carries the expected sequence number, and its
/// `this_hash` matches the recomputed value. An empty chain is valid.
pub fn verify_chain(entries: &[SealedEntry]) -> bool {
    let mut expected_prev = SealedEntry::GENESIS_HASH.to_string();

    for (position, sealed) in entries.iter().enumerate() {
        if sealed.sequence != position as u64 || sealed.prev_hash != expected_prev {
            return false;
        }

        match hash_entry(sealed.sequence, &sealed.entry, &sealed.prev_hash) {
            Ok(recomputed) if recomputed == sealed.this_hash => {}
            _ => return false,
        }

        expected_prev = sealed.this_hash.clone();
    }

    true
}
