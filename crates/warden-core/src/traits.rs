//! Collaborator trait definitions for the Warden engine.
//!
//! These traits define the seams between the decision logic and everything
//! it depends on:
//!
//! - `PermissionMatrix`   : static role → permission lookup (trusted, pure)
//! - `ConsentLookup`      : single-snapshot consent coverage lookup
//! - `AssignmentDirectory`: external care-assignment / relationship store
//! - `AuditSink`          : durable, append-only decision record
//! - `Notifier`           : fire-and-forget supervisor paging
//!
//! Every implementation must be `Send + Sync`; the engine and the emergency
//! monitor are shared across request-handling threads.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};

use warden_contracts::{
    access::Purpose,
    audit::{AuditEntry, AuditEntryId, AuditFilter, Page},
    consent::Consent,
    emergency::{ComplianceAlert, EmergencyLevel, RequestId},
    error::WardenResult,
    identity::{Permission, Role, UserId},
};

/// The static role → permission matrix.
///
/// Absence of an entry means "not granted". Implementations must never fail
/// open.
pub trait PermissionMatrix: Send + Sync {
    fn has_permission(&self, role: Role, permission: Permission) -> bool;

    /// A copy of the role's permission set. Mutating it has no effect on the
    /// matrix.
    fn role_permissions(&self, role: Role) -> HashSet<Permission>;

    /// True when exercising `permission` as `role` must be explicitly audited.
    fn requires_audit_log(&self, role: Role, permission: Permission) -> bool;
}

/// Consent lookup used by the decision engine.
pub trait ConsentLookup: Send + Sync {
    /// Find an active, unexpired consent from `patient` to `grantee` for
    /// `purpose` whose data types cover all of `data_types`.
    ///
    /// Implementations must answer from one consistent snapshot: the match
    /// and the coverage check may not straddle a concurrent revoke.
    fn find_covering(
        &self,
        patient: &UserId,
        grantee: &UserId,
        purpose: &Purpose,
        data_types: &BTreeSet<String>,
        at: DateTime<Utc>,
    ) -> WardenResult<Option<Consent>>;
}

/// The external care-assignment / relationship store.
///
/// Role permission alone is necessary but not sufficient for cross-patient
/// access; this directory confirms the relationship actually exists.
pub trait AssignmentDirectory: Send + Sync {
    fn confirms_relationship(&self, actor: &UserId, subject: &UserId) -> WardenResult<bool>;
}

/// The durable audit trail.
///
/// Append-only. No update or delete path is exposed; `mark_resolved` is the
/// single permitted write to an existing entry and succeeds at most once.
pub trait AuditSink: Send + Sync {
    /// Persist `entry`. Failures must propagate, never be swallowed.
    fn append(&self, entry: AuditEntry) -> WardenResult<AuditEntryId>;

    /// Set `resolved_at` on an existing entry. A second call is rejected
    /// with `WardenError::AuditImmutable`.
    fn mark_resolved(&self, id: AuditEntryId, at: DateTime<Utc>) -> WardenResult<()>;

    /// Entries matching `filter`, in append order, paginated.
    fn query(&self, filter: &AuditFilter, page: Page) -> WardenResult<Vec<AuditEntry>>;
}

/// What a supervisor is told when a high or critical grant is issued.
#[derive(Debug, Clone)]
pub struct SupervisorNotice {
    pub request_id: RequestId,
    pub user_id: UserId,
    /// The named supervisor, or `None` to page whoever is on call.
    pub supervisor_id: Option<UserId>,
    pub emergency_level: EmergencyLevel,
    pub resource_accessed: String,
    pub expires_at: DateTime<Utc>,
    pub alerts: Vec<ComplianceAlert>,
}

/// Fire-and-forget paging. Delivery mechanics are out of scope.
///
/// Called without any monitor lock held.
pub trait Notifier: Send + Sync {
    fn notify_supervisor(&self, notice: &SupervisorNotice) -> WardenResult<()>;
}
