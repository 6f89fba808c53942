//! Error types for the Warden engine.
//!
//! All fallible operations return `WardenResult<T>`. An access denial is not
//! an error: it is an `AccessDecision` with `granted = false`.

use thiserror::Error;

/// The unified error type for the Warden crates.
#[derive(Debug, Error)]
pub enum WardenError {
    /// A request was malformed or missing required fields.
    ///
    /// Never retried automatically.
    #[error("validation failed: {reason}")]
    Validation { reason: String },

    /// An unknown session, consent, alert, or audit id.
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    /// The caller's role does not permit the requested operation.
    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// A collaborator (consent store, relationship directory) could not answer.
    ///
    /// Decision paths convert this into a denial; they never grant on it.
    #[error("backend unavailable: {reason}")]
    BackendUnavailable { reason: String },

    /// A second active consent for the same (patient, grantee, purpose).
    #[error("consent conflict: {reason}")]
    ConsentConflict { reason: String },

    /// A lifecycle transition that is not allowed from the current state.
    #[error("invalid transition: {reason}")]
    InvalidTransition { reason: String },

    /// The audit trail could not persist an entry.
    ///
    /// Fatal for the operation that produced the entry.
    #[error("audit write failed: {reason}")]
    AuditWriteFailed { reason: String },

    /// An attempt to change an audit entry beyond its one permitted write.
    #[error("audit entry is immutable: {reason}")]
    AuditImmutable { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },
}

impl WardenError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        WardenError::NotFound { kind, id: id.to_string() }
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        WardenError::Validation { reason: reason.into() }
    }
}

/// Convenience alias used throughout the Warden crates.
pub type WardenResult<T> = Result<T, WardenError>;
