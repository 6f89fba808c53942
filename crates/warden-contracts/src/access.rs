//! Access requests and the decisions the engine derives from them.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    consent::ConsentId,
    identity::{Role, UserId},
};

/// Why data is being requested (e.g. "treatment", "care_planning", "emergency").
///
/// Purposes are compared by exact string match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Purpose(pub String);

impl Purpose {
    pub const EMERGENCY: &'static str = "emergency";

    pub fn new(purpose: impl Into<String>) -> Self {
        Self(purpose.into())
    }

    pub fn emergency() -> Self {
        Self(Self::EMERGENCY.to_string())
    }

    pub fn is_emergency(&self) -> bool {
        self.0 == Self::EMERGENCY
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single request to read a subject's data. Ephemeral; never persisted
/// except through the audit entry its decision produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessRequest {
    pub actor_id: UserId,
    pub actor_role: Role,
    pub subject_id: UserId,
    pub purpose: Purpose,
    pub requested_data_types: BTreeSet<String>,
    pub emergency_justification: Option<String>,
}

impl AccessRequest {
    /// Build a request for the given data types with no emergency justification.
    pub fn new<I, S>(actor_id: &str, actor_role: Role, subject_id: &str, purpose: &str, data_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            actor_id: UserId::new(actor_id),
            actor_role,
            subject_id: UserId::new(subject_id),
            purpose: Purpose::new(purpose),
            requested_data_types: data_types.into_iter().map(Into::into).collect(),
            emergency_justification: None,
        }
    }

    pub fn with_justification(mut self, justification: impl Into<String>) -> Self {
        self.emergency_justification = Some(justification.into());
        self
    }

    /// Justification text, if present and not blank.
    pub fn justification(&self) -> Option<&str> {
        self.emergency_justification
            .as_deref()
            .map(str::trim)
            .filter(|j| !j.is_empty())
    }
}

/// The rule that produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessBasis {
    /// Actor is the data subject.
    #[serde(rename = "self")]
    SelfAccess,
    Emergency,
    Consent,
    /// Role permission confirmed by an assignment or relationship.
    Role,
    Denied,
}

impl fmt::Display for AccessBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AccessBasis::SelfAccess => "self",
            AccessBasis::Emergency => "emergency",
            AccessBasis::Consent => "consent",
            AccessBasis::Role => "role",
            AccessBasis::Denied => "denied",
        };
        f.write_str(s)
    }
}

/// The outcome of `CheckAccess`. Persisted only via the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    pub granted: bool,
    pub basis: AccessBasis,
    /// Set only when `basis == Consent`.
    pub consent_id: Option<ConsentId>,
    /// Human-readable explanation, always present.
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

impl AccessDecision {
    pub fn grant(basis: AccessBasis, reason: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            granted: true,
            basis,
            consent_id: None,
            reason: reason.into(),
            timestamp,
        }
    }

    pub fn deny(reason: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            granted: false,
            basis: AccessBasis::Denied,
            consent_id: None,
            reason: reason.into(),
            timestamp,
        }
    }
}
