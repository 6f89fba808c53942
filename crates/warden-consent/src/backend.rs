//! Consent persistence.
//!
//! `ConsentBackend` is the persistence collaborator behind `ConsentStore`.
//! It owns the one-active-consent invariant: `insert_exclusive` must check
//! for a conflicting active consent and insert in a single critical section,
//! the way a unique partial index would in a relational store.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use warden_contracts::{
    access::Purpose,
    consent::{Consent, ConsentId, ConsentStatus},
    error::{WardenError, WardenResult},
    identity::UserId,
};

pub trait ConsentBackend: Send + Sync {
    /// Insert `consent` unless an active consent already exists for the same
    /// (patient, grantee, purpose) at `now`, in which case return
    /// `ConsentConflict`.
    fn insert_exclusive(&self, consent: Consent, now: DateTime<Utc>) -> WardenResult<Consent>;

    fn get(&self, id: ConsentId) -> WardenResult<Option<Consent>>;

    /// Transition an active consent to `Revoked`. A consent that is not
    /// active at `at` yields `InvalidTransition`.
    fn revoke(&self, id: ConsentId, revoked_by: &UserId, at: DateTime<Utc>) -> WardenResult<Consent>;

    /// Every consent from `patient` to `grantee`, read in one snapshot.
    fn for_pair(&self, patient: &UserId, grantee: &UserId) -> WardenResult<Vec<Consent>>;

    fn for_patient(&self, patient: &UserId) -> WardenResult<Vec<Consent>>;
}

/// A process-local backend. Records are never removed.
#[derive(Debug, Default)]
pub struct InMemoryConsentBackend {
    records: RwLock<HashMap<ConsentId, Consent>>,
}

impl InMemoryConsentBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> WardenError {
    WardenError::BackendUnavailable {
        reason: format!("consent table lock poisoned: {}", e),
    }
}

fn same_tuple(a: &Consent, patient: &UserId, grantee: &UserId, purpose: &Purpose) -> bool {
    a.patient_id == *patient && a.grantee_id == *grantee && a.purpose == *purpose
}

impl ConsentBackend for InMemoryConsentBackend {
    fn insert_exclusive(&self, consent: Consent, now: DateTime<Utc>) -> WardenResult<Consent> {
        let mut records = self.records.write().map_err(poisoned)?;

        let conflict = records.values().find(|c| {
            same_tuple(c, &consent.patient_id, &consent.grantee_id, &consent.purpose)
                && c.is_active_at(now)
        });
        if let Some(existing) = conflict {
            return Err(WardenError::ConsentConflict {
                reason: format!(
                    "consent {} is already active for patient '{}', grantee '{}', purpose '{}'",
                    existing.id, consent.patient_id, consent.grantee_id, consent.purpose
                ),
            });
        }

        records.insert(consent.id, consent.clone());
        Ok(consent)
    }

    fn get(&self, id: ConsentId) -> WardenResult<Option<Consent>> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.get(&id).cloned())
    }

    fn revoke(&self, id: ConsentId, revoked_by: &UserId, at: DateTime<Utc>) -> WardenResult<Consent> {
        let mut records = self.records.write().map_err(poisoned)?;
        let consent = records
            .get_mut(&id)
            .ok_or_else(|| WardenError::not_found("consent", id))?;

        let status = consent.status_at(at);
        if status != ConsentStatus::Active {
            return Err(WardenError::InvalidTransition {
                reason: format!("consent {} is {:?}, not active", id, status),
            });
        }

        consent.status = ConsentStatus::Revoked;
        consent.revoked_at = Some(at);
        consent.revoked_by = Some(revoked_by.clone());
        Ok(consent.clone())
    }

    fn for_pair(&self, patient: &UserId, grantee: &UserId) -> WardenResult<Vec<Consent>> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records
            .values()
            .filter(|c| c.patient_id == *patient && c.grantee_id == *grantee)
            .cloned()
            .collect())
    }

    fn for_patient(&self, patient: &UserId) -> WardenResult<Vec<Consent>> {
        let records = self.records.read().map_err(poisoned)?;
        let mut consents: Vec<Consent> = records
            .values()
            .filter(|c| c.patient_id == *patient)
            .cloned()
            .collect();
        consents.sort_by_key(|c| c.granted_at);
        Ok(consents)
    }
}
