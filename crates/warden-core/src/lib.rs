//! # warden-core
//!
//! The access decision runtime for Warden.
//!
//! This crate provides:
//! - The collaborator traits (`PermissionMatrix`, `ConsentLookup`,
//!   `AssignmentDirectory`, `AuditSink`, `Notifier`)
//! - The `Clock` abstraction and a `ManualClock` for deterministic tests
//! - The `AccessDecisionEngine`, which walks the fail-closed rule chain
//! - Admin-only audit query helpers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use warden_core::{AccessDecisionEngine, clock::SystemClock};
//!
//! let engine = AccessDecisionEngine::new(registry, consents, directory, audit, Arc::new(SystemClock));
//! let decision = engine.check_access(&request)?;
//! ```

pub mod admin;
pub mod clock;
pub mod engine;
pub mod traits;

pub use engine::AccessDecisionEngine;
