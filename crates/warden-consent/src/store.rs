//! The consent store: validated grant and revoke, and the coverage lookup
//! the decision engine relies on.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, info, warn};

use warden_contracts::{
    access::Purpose,
    audit::{AuditAction, AuditEntry},
    consent::{Consent, ConsentGrant, ConsentId, ConsentStatus},
    error::{WardenError, WardenResult},
    identity::{Actor, Permission, UserId},
};
use warden_core::{
    clock::Clock,
    traits::{AuditSink, ConsentLookup, PermissionMatrix},
};

use crate::backend::ConsentBackend;

/// Grants, revokes, and looks up patient consents.
///
/// Consents are never deleted. Every grant and revoke is audited; an audit
/// failure is returned to the caller.
pub struct ConsentStore {
    backend: Arc<dyn ConsentBackend>,
    permissions: Arc<dyn PermissionMatrix>,
    audit: Arc<dyn AuditSink>,
    clock: Arc<dyn Clock>,
}

impl ConsentStore {
    pub fn new(
        backend: Arc<dyn ConsentBackend>,
        permissions: Arc<dyn PermissionMatrix>,
        audit: Arc<dyn AuditSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { backend, permissions, audit, clock }
    }

    /// Record a new consent on behalf of `grantor`.
    ///
    /// The grantor must be the patient (holding `manage-own-consent`) or hold
    /// `override-consent`. A second active consent for the same
    /// (patient, grantee, purpose) is rejected with `ConsentConflict`.
    pub fn grant(&self, grantor: &Actor, request: ConsentGrant) -> WardenResult<Consent> {
        let now = self.clock.now();
        validate_grant(&request, now)?;
        self.authorize(grantor, &request.patient_id, "grant")?;

        let consent = Consent {
            id: ConsentId::new(),
            patient_id: request.patient_id,
            grantor_id: grantor.id.clone(),
            grantee_id: request.grantee_id,
            purpose: request.purpose,
            data_types: request.data_types,
            status: ConsentStatus::Active,
            granted_at: now,
            expires_at: request.expires_at,
            revoked_at: None,
            revoked_by: None,
        };

        let consent = self.backend.insert_exclusive(consent, now)?;

        let mut entry = AuditEntry::new(
            grantor.id.clone(),
            AuditAction::ConsentGranted,
            consent.patient_id.to_string(),
            true,
            format!("consent granted for purpose '{}'", consent.purpose),
            now,
        );
        entry.details = json!({
            "consent_id": consent.id,
            "grantee_id": consent.grantee_id,
            "purpose": consent.purpose,
            "data_types": consent.data_types,
            "expires_at": consent.expires_at,
        });
        self.audit.append(entry)?;

        info!(
            consent_id = %consent.id,
            patient_id = %consent.patient_id,
            grantee_id = %consent.grantee_id,
            purpose = %consent.purpose,
            "consent granted"
        );
        Ok(consent)
    }

    /// Revoke an active consent. Only the patient, the original grantor, or
    /// an `override-consent` holder may revoke.
    ///
    /// Revoking a consent that is already revoked or expired is
    /// `InvalidTransition`.
    pub fn revoke(&self, actor: &Actor, id: ConsentId) -> WardenResult<Consent> {
        let now = self.clock.now();
        let existing = self.get(id)?;

        if actor.id != existing.grantor_id {
            self.authorize(actor, &existing.patient_id, "revoke")?;
        }

        let revoked = self.backend.revoke(id, &actor.id, now)?;

        let mut entry = AuditEntry::new(
            actor.id.clone(),
            AuditAction::ConsentRevoked,
            revoked.patient_id.to_string(),
            true,
            format!("consent revoked for purpose '{}'", revoked.purpose),
            now,
        );
        entry.details = json!({
            "consent_id": revoked.id,
            "grantee_id": revoked.grantee_id,
        });
        self.audit.append(entry)?;

        info!(consent_id = %id, revoked_by = %actor.id, "consent revoked");
        Ok(revoked)
    }

    pub fn get(&self, id: ConsentId) -> WardenResult<Consent> {
        self.backend.get(id)?.ok_or_else(|| WardenError::not_found("consent", id))
    }

    /// All consents where `patient` is the data subject, oldest first.
    pub fn list_for_patient(&self, patient: &UserId) -> WardenResult<Vec<Consent>> {
        self.backend.for_patient(patient)
    }

    fn authorize(&self, actor: &Actor, patient: &UserId, operation: &str) -> WardenResult<()> {
        let own = actor.id == *patient
            && self.permissions.has_permission(actor.role, Permission::ManageOwnConsent);
        let overriding = self.permissions.has_permission(actor.role, Permission::OverrideConsent);

        if own || overriding {
            return Ok(());
        }

        warn!(actor_id = %actor.id, role = %actor.role, patient_id = %patient, operation, "consent change refused");
        Err(WardenError::Unauthorized {
            reason: format!(
                "'{}' may not {} consent on behalf of patient '{}'",
                actor.id, operation, patient
            ),
        })
    }
}

fn validate_grant(request: &ConsentGrant, now: DateTime<Utc>) -> WardenResult<()> {
    if request.purpose.as_str().trim().is_empty() {
        return Err(WardenError::validation("consent purpose is required"));
    }
    if request.data_types.is_empty() {
        return Err(WardenError::validation("consent must name at least one data type"));
    }
    if request.data_types.iter().any(|t| t.trim().is_empty()) {
        return Err(WardenError::validation("consent data types must not be blank"));
    }
    if request.grantee_id == request.patient_id {
        return Err(WardenError::validation("a patient cannot grant consent to themselves"));
    }
    if request.expires_at.is_some_and(|exp| exp <= now) {
        return Err(WardenError::validation("consent expiry must be in the future"));
    }
    Ok(())
}

impl ConsentLookup for ConsentStore {
    fn find_covering(
        &self,
        patient: &UserId,
        grantee: &UserId,
        purpose: &Purpose,
        data_types: &BTreeSet<String>,
        at: DateTime<Utc>,
    ) -> WardenResult<Option<Consent>> {
        // One read of the pair; match, liveness and coverage are all decided
        // on that snapshot.
        let snapshot = self.backend.for_pair(patient, grantee)?;

        let found = snapshot
            .into_iter()
            .find(|c| c.purpose == *purpose && c.is_active_at(at) && c.covers(data_types));

        debug!(
            patient_id = %patient,
            grantee_id = %grantee,
            purpose = %purpose,
            found = found.is_some(),
            "consent coverage lookup"
        );
        Ok(found)
    }
}
