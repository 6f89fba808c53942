//! # warden-ref-care
//!
//! Care-home reference runtime for the Warden access-authorization engine.
//!
//! [`Runtime`] wires the permission registry, consent store, decision
//! engine, emergency monitor and audit trail together from a
//! [`RuntimeConfig`]. Three scenarios drive it end to end:
//!
//! 1. **Consent-based access**: every rule of the decision chain, including
//!    partial consent coverage and revocation.
//! 2. **Break-glass at night**: critical access without a supervisor, the
//!    role gate, concurrency alerts, alert resolution and revoke.
//! 3. **Grant expiry**: wall-clock inactivity before the sweep, sweeping,
//!    and admin-only audit queries.
//!
//! All people and assignments are fictional (see [`mock_data`]).

pub mod config;
pub mod directory;
pub mod mock_data;
pub mod runtime;
pub mod scenarios;

pub use config::RuntimeConfig;
pub use directory::StaticAssignmentDirectory;
pub use runtime::Runtime;

// ── Tests ─────────────────────────────────────────────────────────────────────
