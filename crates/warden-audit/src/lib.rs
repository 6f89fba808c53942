//! # warden-audit
//!
//! Append-only, SHA-256 hash-chained audit trail for the Warden engine.
//!
//! ## Overview
//!
//! Every decision and every emergency grant transition is appended as an
//! `AuditEntry`, sealed into a `SealedEntry` that links to the previous
//! entry by hash. Tampering with any sealed field breaks the chain and is
//! detected by `verify_chain`. The trail exposes no update or delete path;
//! `mark_resolved` may set `resolved_at` once per entry and nothing else.
//!
//! The trail itself is unbounded. `RecentAccessCache` is a separate, bounded
//! cache for fast access-pattern lookups and is never the record of truth.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use warden_audit::AuditTrail;
//! use warden_core::traits::AuditSink;
//!
//! let trail = AuditTrail::with_journal(Path::new("/var/lib/warden/audit.jsonl"))?;
//! let id = trail.append(entry)?;
//! assert!(trail.verify_integrity());
//! ```

pub mod chain;
pub mod event;
pub mod journal;
pub mod phi;
pub mod recent;
pub mod trail;

pub use chain::{hash_entry, verify_chain};
pub use event::{AuditLog, SealedEntry};
pub use journal::{Journal, JournalRecord};
pub use phi::looks_like_phi;
pub use recent::RecentAccessCache;
pub use trail::AuditTrail;

// ── Tests ─────────────────────────────────────────────────────────────────────
