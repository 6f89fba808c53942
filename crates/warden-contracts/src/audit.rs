//! Audit entry, filter, and pagination types.
//!
//! Entries are append-only. The single permitted mutation after append is
//! setting `resolved_at`, exactly once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    emergency::{AlertId, RequestId},
    identity::UserId,
};

/// Unique identifier for an audit entry. Assigned by the writer before append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditEntryId(pub uuid::Uuid);

impl AuditEntryId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for AuditEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AuditEntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    AccessCheck,
    EmergencyAccessGranted,
    EmergencyAccessDenied,
    EmergencyAccessRevoked,
    EmergencyAccessExpired,
    ConsentGranted,
    ConsentRevoked,
    AlertResolved,
}

/// One immutable record in the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditEntryId,
    /// Emergency request this entry belongs to, when there is one.
    pub request_id: Option<RequestId>,
    /// The acting user.
    pub user_id: UserId,
    pub action: AuditAction,
    pub resource: String,
    pub granted: bool,
    /// Decision basis or caller-supplied justification.
    pub justification: String,
    /// Best-effort PHI classification. Reporting only.
    pub phi_flag: bool,
    pub alerts: Vec<AlertId>,
    /// Structured context (basis, consent id, restrictions, ...).
    #[serde(default)]
    pub details: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl AuditEntry {
    /// Start a new entry with a fresh id and no alerts, details, or resolution.
    pub fn new(
        user_id: UserId,
        action: AuditAction,
        resource: impl Into<String>,
        granted: bool,
        justification: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AuditEntryId::new(),
            request_id: None,
            user_id,
            action,
            resource: resource.into(),
            granted,
            justification: justification.into(),
            phi_flag: false,
            alerts: Vec::new(),
            details: serde_json::Value::Null,
            timestamp,
            resolved_at: None,
        }
    }
}

/// Conjunctive filter for audit queries. `None` fields match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditFilter {
    pub user_id: Option<UserId>,
    pub action: Option<AuditAction>,
    pub request_id: Option<RequestId>,
    pub granted: Option<bool>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl AuditFilter {
    pub fn by_user(user_id: UserId) -> Self {
        Self { user_id: Some(user_id), ..Self::default() }
    }

    pub fn by_action(action: AuditAction) -> Self {
        Self { action: Some(action), ..Self::default() }
    }

    pub fn matches(&self, entry: &AuditEntry) -> bool {
        self.user_id.as_ref().map_or(true, |u| *u == entry.user_id)
            && self.action.map_or(true, |a| a == entry.action)
            && self.request_id.map_or(true, |r| Some(r) == entry.request_id)
            && self.granted.map_or(true, |g| g == entry.granted)
            && self.since.map_or(true, |s| entry.timestamp >= s)
            && self.until.map_or(true, |u| entry.timestamp < u)
    }
}

/// Offset/limit pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Page {
    pub const DEFAULT_LIMIT: usize = 100;

    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self { offset: 0, limit: Self::DEFAULT_LIMIT }
    }
}
