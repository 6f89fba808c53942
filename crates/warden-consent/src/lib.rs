//! # warden-consent
//!
//! Patient consent records for Warden.
//!
//! [`ConsentStore`] validates and records consent grants and revocations,
//! and implements [`ConsentLookup`](warden_core::traits::ConsentLookup) for
//! the decision engine. Persistence is delegated to a [`ConsentBackend`];
//! [`InMemoryConsentBackend`] is the reference implementation.
//!
//! Invariants:
//! - At most one active consent per (patient, grantee, purpose).
//! - Consents are never deleted; revocation and expiry are status changes.
//! - Coverage is all-or-nothing: a consent covers a request only if it
//!   declares every requested data type.

pub mod backend;
pub mod store;

pub use backend::{ConsentBackend, InMemoryConsentBackend};
pub use store::ConsentStore;

// ── Tests ─────────────────────────────────────────────────────────────────────
