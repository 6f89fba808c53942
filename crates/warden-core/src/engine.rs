//! The access decision engine: the ordered, fail-closed rule chain.
//!
//! Every request is resolved by the first rule that applies:
//!
//!   Self-access → Emergency → Consent → Role assignment → Default deny
//!
//! No rule re-evaluates after another has decided. Collaborator failures
//! (consent store, assignment directory) resolve to a denial, never a grant.
//! Every decision produces exactly one audit entry; if that entry cannot be
//! written the call fails with `AuditWriteFailed` and no decision is returned.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, info, warn};

use warden_contracts::{
    access::{AccessBasis, AccessDecision, AccessRequest},
    audit::{AuditAction, AuditEntry},
    error::WardenResult,
    identity::Permission,
};

use crate::{
    clock::Clock,
    traits::{AssignmentDirectory, AuditSink, ConsentLookup, PermissionMatrix},
};

/// Reason attached to the final, catch-all denial.
pub const DEFAULT_DENY_REASON: &str = "no valid authorization found";

/// Resolves `AccessRequest`s into audited `AccessDecision`s.
///
/// The engine holds no mutable state of its own; it is a pure function of
/// the permission matrix, consent state, and assignment directory at the
/// moment of the call. Share it across threads behind an `Arc`.
pub struct AccessDecisionEngine {
    permissions: Arc<dyn PermissionMatrix>,
    consents: Arc<dyn ConsentLookup>,
    directory: Arc<dyn AssignmentDirectory>,
    audit: Arc<dyn AuditSink>,
    clock: Arc<dyn Clock>,
}

/// A decision plus the permission whose exercise produced it.
struct Resolution {
    decision: AccessDecision,
    exercised: Option<Permission>,
}

impl Resolution {
    fn new(decision: AccessDecision, exercised: Option<Permission>) -> Self {
        Self { decision, exercised }
    }
}

impl AccessDecisionEngine {
    pub fn new(
        permissions: Arc<dyn PermissionMatrix>,
        consents: Arc<dyn ConsentLookup>,
        directory: Arc<dyn AssignmentDirectory>,
        audit: Arc<dyn AuditSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { permissions, consents, directory, audit, clock }
    }

    /// Decide whether `request` is permitted and record the decision.
    ///
    /// # Errors
    ///
    /// Only audit failures are errors. Denials, including fail-closed
    /// denials caused by an unreachable backend, are `Ok` with
    /// `granted = false`.
    pub fn check_access(&self, request: &AccessRequest) -> WardenResult<AccessDecision> {
        let now = self.clock.now();

        debug!(
            actor_id = %request.actor_id,
            actor_role = %request.actor_role,
            subject_id = %request.subject_id,
            purpose = %request.purpose,
            data_types = request.requested_data_types.len(),
            "evaluating access request"
        );

        let Resolution { decision, exercised } = self.resolve(request, now);

        let audit_required = exercised
            .map(|p| self.permissions.requires_audit_log(request.actor_role, p))
            .unwrap_or(false);

        let data_types: Vec<&str> = request.requested_data_types.iter().map(String::as_str).collect();
        let mut entry = AuditEntry::new(
            request.actor_id.clone(),
            AuditAction::AccessCheck,
            format!("{}:{}", request.subject_id, data_types.join(",")),
            decision.granted,
            decision.reason.clone(),
            now,
        );
        entry.details = json!({
            "subject_id": request.subject_id,
            "actor_role": request.actor_role,
            "purpose": request.purpose,
            "data_types": data_types,
            "basis": decision.basis,
            "consent_id": decision.consent_id,
            "emergency_justification": request.justification(),
            "audit_required": audit_required,
        });
        self.audit.append(entry)?;

        if decision.granted {
            info!(
                actor_id = %request.actor_id,
                subject_id = %request.subject_id,
                basis = %decision.basis,
                "access granted"
            );
        } else {
            warn!(
                actor_id = %request.actor_id,
                subject_id = %request.subject_id,
                reason = %decision.reason,
                "access denied"
            );
        }

        Ok(decision)
    }

    /// Walk the rule chain. First applicable rule wins.
    fn resolve(&self, request: &AccessRequest, now: DateTime<Utc>) -> Resolution {
        let role = request.actor_role;

        // ── Rule 1: self-access ──────────────────────────────────────────────
        //
        // A role may legitimately lack even own-data access; the check is not
        // skipped just because actor and subject coincide.
        if request.actor_id == request.subject_id {
            let decision = if self.permissions.has_permission(role, Permission::AccessOwnData) {
                AccessDecision::grant(AccessBasis::SelfAccess, "self-access permitted", now)
            } else {
                AccessDecision::deny(
                    format!("role '{role}' lacks the access-own-data permission"),
                    now,
                )
            };
            return Resolution::new(decision, Some(Permission::AccessOwnData));
        }

        // ── Rule 2: emergency ────────────────────────────────────────────────
        //
        // Consent is not consulted for a justified emergency request.
        if request.purpose.is_emergency() {
            if let Some(justification) = request.justification() {
                let decision = if role.is_emergency_responder() {
                    debug!(actor_id = %request.actor_id, justification, "emergency rule applied");
                    AccessDecision::grant(
                        AccessBasis::Emergency,
                        format!("emergency access by designated role '{role}'"),
                        now,
                    )
                } else {
                    AccessDecision::deny(
                        format!("role '{role}' is not permitted emergency access"),
                        now,
                    )
                };
                return Resolution::new(decision, Some(Permission::AccessEmergencyData));
            }
        }

        // ── Rule 3: consent ──────────────────────────────────────────────────
        match self.consents.find_covering(
            &request.subject_id,
            &request.actor_id,
            &request.purpose,
            &request.requested_data_types,
            now,
        ) {
            Ok(Some(consent)) => {
                let mut decision = AccessDecision::grant(
                    AccessBasis::Consent,
                    format!("covered by consent {} for purpose '{}'", consent.id, consent.purpose),
                    now,
                );
                decision.consent_id = Some(consent.id);
                return Resolution::new(decision, None);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(
                    actor_id = %request.actor_id,
                    subject_id = %request.subject_id,
                    error = %e,
                    "consent lookup failed; failing closed"
                );
                return Resolution::new(
                    AccessDecision::deny(format!("consent lookup unavailable, access denied: {e}"), now),
                    None,
                );
            }
        }

        // ── Rule 4: role-based cross-patient access ──────────────────────────
        //
        // Permission is necessary but not sufficient: the directory must
        // confirm the assignment or relationship exists.
        let role_permission = [Permission::AccessAssignedPatients, Permission::AccessOthersData]
            .into_iter()
            .find(|p| self.permissions.has_permission(role, *p));

        if let Some(permission) = role_permission {
            match self.directory.confirms_relationship(&request.actor_id, &request.subject_id) {
                Ok(true) => {
                    return Resolution::new(
                        AccessDecision::grant(
                            AccessBasis::Role,
                            format!("'{permission}' confirmed by care assignment"),
                            now,
                        ),
                        Some(permission),
                    );
                }
                Ok(false) => {
                    debug!(
                        actor_id = %request.actor_id,
                        subject_id = %request.subject_id,
                        "role permission present but no assignment found"
                    );
                }
                Err(e) => {
                    warn!(
                        actor_id = %request.actor_id,
                        subject_id = %request.subject_id,
                        error = %e,
                        "assignment lookup failed; failing closed"
                    );
                    return Resolution::new(
                        AccessDecision::deny(
                            format!("assignment lookup unavailable, access denied: {e}"),
                            now,
                        ),
                        Some(permission),
                    );
                }
            }
        }

        // ── Default: deny ────────────────────────────────────────────────────
        Resolution::new(AccessDecision::deny(DEFAULT_DENY_REASON, now), None)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
