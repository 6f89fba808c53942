//! # warden-policy
//!
//! A TOML-driven, deny-by-default role permission registry for Warden.
//!
//! ## Overview
//!
//! [`PermissionRegistry`] implements the
//! [`PermissionMatrix`](warden_core::traits::PermissionMatrix) trait. The
//! matrix is fixed at deploy time: either [`PermissionRegistry::builtin`] or
//! a TOML file in the format of `policies/default.toml`.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use warden_policy::PermissionRegistry;
//!
//! let registry = PermissionRegistry::from_file(Path::new("policies/default.toml"))?;
//! // Pass `Arc::new(registry)` to `AccessDecisionEngine::new(...)`.
//! ```

pub mod matrix;
pub mod registry;

pub use matrix::{MatrixConfig, RoleEntry};
pub use registry::{PermissionRegistry, DEFAULT_MATRIX_TOML, SENSITIVE_PERMISSIONS};

// ── Tests ─────────────────────────────────────────────────────────────────────
