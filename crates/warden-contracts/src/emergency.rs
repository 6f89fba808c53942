//! Break-glass (emergency) access types.
//!
//! An `EmergencyGrant` is issued by the emergency monitor after a request
//! passes validation. Grant parameters depend only on the `EmergencyLevel`;
//! see `GrantParameters::for_level`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    audit::AuditEntryId,
    identity::{Role, UserId},
};

/// Unique identifier for one emergency access request (and the grant it produces).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub uuid::Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Unique identifier for a compliance alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertId(pub uuid::Uuid);

impl AlertId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for AlertId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// How urgent the emergency is. Drives duration and restrictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmergencyLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl EmergencyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmergencyLevel::Low => "low",
            EmergencyLevel::Moderate => "moderate",
            EmergencyLevel::High => "high",
            EmergencyLevel::Critical => "critical",
        }
    }

    /// High and critical grants page a supervisor at issue time.
    pub fn notifies_supervisor(&self) -> bool {
        matches!(self, EmergencyLevel::High | EmergencyLevel::Critical)
    }
}

impl fmt::Display for EmergencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmergencyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(EmergencyLevel::Low),
            "moderate" => Ok(EmergencyLevel::Moderate),
            "high" => Ok(EmergencyLevel::High),
            "critical" => Ok(EmergencyLevel::Critical),
            other => Err(format!(
                "unknown emergency level '{other}' (expected low, moderate, high or critical)"
            )),
        }
    }
}

/// The category of data a break-glass grant opens up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    PatientRecords,
    MedicalHistory,
    Medications,
    CarePlan,
    CrisisIntervention,
    EmergencyContacts,
}

impl AccessType {
    pub const ALL: [AccessType; 6] = [
        AccessType::PatientRecords,
        AccessType::MedicalHistory,
        AccessType::Medications,
        AccessType::CarePlan,
        AccessType::CrisisIntervention,
        AccessType::EmergencyContacts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessType::PatientRecords => "patient_records",
            AccessType::MedicalHistory => "medical_history",
            AccessType::Medications => "medications",
            AccessType::CarePlan => "care_plan",
            AccessType::CrisisIntervention => "crisis_intervention",
            AccessType::EmergencyContacts => "emergency_contacts",
        }
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccessType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown access type '{s}'"))
    }
}

/// Restriction labels attached to grants.
pub mod restriction {
    pub const SUPERVISOR_REVIEW_1H: &str = "requires_supervisor_review_within_1_hour";
    pub const SUPERVISOR_REVIEW_2H: &str = "requires_supervisor_review_within_2_hours";
    pub const SUPERVISOR_REVIEW_4H: &str = "requires_supervisor_review_within_4_hours";
    pub const SUPERVISOR_APPROVAL: &str = "requires_supervisor_approval";
    pub const LIMITED_PHI: &str = "limited_phi_access";
    pub const NO_PHI: &str = "no_phi_access";
    pub const READ_ONLY: &str = "read_only_access";
}

/// Duration and restrictions of a grant. A pure function of the level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantParameters {
    pub duration: Duration,
    pub restrictions: Vec<String>,
}

impl GrantParameters {
    pub fn for_level(level: EmergencyLevel) -> Self {
        use restriction::*;

        let (duration, restrictions): (Duration, &[&str]) = match level {
            EmergencyLevel::Critical => (Duration::hours(4), &[SUPERVISOR_REVIEW_1H]),
            EmergencyLevel::High => (Duration::hours(2), &[SUPERVISOR_REVIEW_2H, LIMITED_PHI]),
            EmergencyLevel::Moderate => (
                Duration::hours(1),
                &[SUPERVISOR_REVIEW_4H, LIMITED_PHI, READ_ONLY],
            ),
            EmergencyLevel::Low => (
                Duration::minutes(30),
                &[SUPERVISOR_APPROVAL, READ_ONLY, NO_PHI],
            ),
        };

        Self {
            duration,
            restrictions: restrictions.iter().map(|r| r.to_string()).collect(),
        }
    }
}

/// An inbound break-glass request, as received from an authenticated caller.
///
/// Level and access type arrive as raw strings; the monitor's validator
/// parses them and rejects anything outside the enumerated sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyAccessRequest {
    pub user_id: String,
    pub requester_role: Role,
    pub access_type: String,
    pub emergency_level: String,
    pub justification: String,
    pub resource_accessed: String,
    pub requested_by: String,
    #[serde(default)]
    pub supervisor_id: Option<String>,
}

/// Lifecycle state of an issued grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantState {
    Active,
    Expired,
    Revoked,
}

/// A time-bounded break-glass grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyGrant {
    pub request_id: RequestId,
    pub user_id: UserId,
    pub access_type: AccessType,
    pub emergency_level: EmergencyLevel,
    pub justification: String,
    pub resource_accessed: String,
    pub requested_by: UserId,
    pub supervisor_id: Option<UserId>,
    pub granted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub restrictions: Vec<String>,
    pub access_token: String,
    pub alerts_triggered: Vec<AlertId>,
    pub supervisor_notified: bool,
    /// The audit entry recording the grant; resolved on expiry or revoke.
    pub audit_entry_id: AuditEntryId,
}

impl EmergencyGrant {
    /// Wall-clock liveness. Presence in the active table is not enough:
    /// the sweeper may not have run yet.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// The kinds of compliance alert raised at grant time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    MultipleConcurrentEmergencyAccess,
    CriticalAccessNoSupervisor,
    SuspiciousAccessPattern,
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlertType::MultipleConcurrentEmergencyAccess => "MULTIPLE_CONCURRENT_EMERGENCY_ACCESS",
            AlertType::CriticalAccessNoSupervisor => "CRITICAL_ACCESS_NO_SUPERVISOR",
            AlertType::SuspiciousAccessPattern => "SUSPICIOUS_ACCESS_PATTERN",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Moderate,
    High,
    Critical,
}

/// A non-blocking compliance signal attached to a grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceAlert {
    pub id: AlertId,
    pub request_id: RequestId,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub triggered_at: DateTime<Utc>,
    pub action_required: bool,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Lets callers tell a clean grant from a grant that raised alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Compliant,
    AlertsRaised,
    Denied,
}

/// Response to an emergency access request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyAccessResponse {
    pub request_id: RequestId,
    pub access_granted: bool,
    pub reason: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub access_token: Option<String>,
    pub restrictions: Vec<String>,
    pub audit_trail_id: AuditEntryId,
    pub compliance_status: ComplianceStatus,
    pub alerts_triggered: Vec<ComplianceAlert>,
    pub supervisor_notified: bool,
}

impl EmergencyAccessResponse {
    pub fn has_alert(&self, alert_type: AlertType) -> bool {
        self.alerts_triggered.iter().any(|a| a.alert_type == alert_type)
    }
}

/// Answer to a session-status query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub request_id: RequestId,
    /// Derived from `now < expires_at` and the grant's state, never from
    /// table membership alone.
    pub active: bool,
    pub state: GrantState,
    pub expires_at: DateTime<Utc>,
    pub emergency_level: EmergencyLevel,
    pub access_type: AccessType,
    pub restrictions: Vec<String>,
}

/// Result of an idempotent revoke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RevokeOutcome {
    Revoked { audit_entry_id: AuditEntryId },
    AlreadyInactive { state: GrantState },
}
