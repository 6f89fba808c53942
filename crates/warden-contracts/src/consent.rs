//! Patient consent records.
//!
//! A `Consent` is owned by the (patient, grantor) pair and is never physically
//! deleted. Revocation is a status transition, and expiry is derived from
//! `expires_at` at read time, so the record itself keeps its full history.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{access::Purpose, identity::UserId};

/// Unique identifier for a consent record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConsentId(pub uuid::Uuid);

impl ConsentId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ConsentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConsentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle state of a consent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentStatus {
    Active,
    Revoked,
    Expired,
}

/// A patient-granted authorization for one grantee, purpose, and set of data types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consent {
    pub id: ConsentId,
    /// The data subject.
    pub patient_id: UserId,
    /// Who granted the consent: the patient, or an actor with override rights.
    pub grantor_id: UserId,
    /// Who may access data under this consent.
    pub grantee_id: UserId,
    pub purpose: Purpose,
    /// Data categories covered. Requests must be a subset of this set.
    pub data_types: BTreeSet<String>,
    /// Stored status. `Expired` is also derived on read from `expires_at`.
    pub status: ConsentStatus,
    pub granted_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revoked_by: Option<UserId>,
}

impl Consent {
    /// The status as observed at `now`: a stored `Active` consent whose
    /// `expires_at` has passed reads as `Expired`.
    pub fn status_at(&self, now: DateTime<Utc>) -> ConsentStatus {
        match self.status {
            ConsentStatus::Active if self.expires_at.is_some_and(|exp| exp <= now) => {
                ConsentStatus::Expired
            }
            other => other,
        }
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status_at(now) == ConsentStatus::Active
    }

    /// True when every requested data type is declared on this consent.
    ///
    /// Coverage is all-or-nothing: a partial overlap does not cover.
    pub fn covers<'a, I>(&self, requested: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        requested.into_iter().all(|t| self.data_types.contains(t))
    }
}

/// Input for creating a new consent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentGrant {
    pub patient_id: UserId,
    pub grantee_id: UserId,
    pub purpose: Purpose,
    pub data_types: BTreeSet<String>,
    pub expires_at: Option<DateTime<Utc>>,
}
