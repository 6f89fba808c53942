//! # warden-contracts
//!
//! Shared types and error definitions for the Warden access-authorization
//! engine.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate beyond small derivations on the data itself (consent coverage,
//! grant parameters by level, audit filter matching).

pub mod access;
pub mod audit;
pub mod consent;
pub mod emergency;
pub mod error;
pub mod identity;

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use access::{AccessBasis, AccessRequest, Purpose};
    use audit::{AuditAction, AuditEntry, AuditFilter};
    use consent::{Consent, ConsentId, ConsentStatus};
    use emergency::{restriction, AccessType, AlertType, EmergencyLevel, GrantParameters};
    use error::WardenError;
    use identity::{Role, UserId};

    fn consent(data_types: &[&str]) -> Consent {
        Consent {
            id: ConsentId::new(),
            patient_id: UserId::new("resident-1"),
            grantor_id: UserId::new("resident-1"),
            grantee_id: UserId::new("nurse-1"),
            purpose: Purpose::new("treatment"),
            data_types: data_types.iter().map(|s| s.to_string()).collect(),
            status: ConsentStatus::Active,
            granted_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            expires_at: None,
            revoked_at: None,
            revoked_by: None,
        }
    }

    // ── Consent coverage ────────────────────────────────────────────────────

    #[test]
    fn consent_covers_subset() {
        let c = consent(&["labs", "meds"]);
        let requested: BTreeSet<String> = ["labs".to_string()].into();
        assert!(c.covers(&requested));
    }

    #[test]
    fn consent_partial_overlap_does_not_cover() {
        let c = consent(&["labs", "meds"]);
        let requested: BTreeSet<String> = ["labs".to_string(), "notes".to_string()].into();
        assert!(!c.covers(&requested));
    }

    #[test]
    fn consent_status_derives_expiry() {
        let mut c = consent(&["labs"]);
        let now = c.granted_at + Duration::days(2);
        c.expires_at = Some(c.granted_at + Duration::days(1));

        assert_eq!(c.status, ConsentStatus::Active);
        assert_eq!(c.status_at(now), ConsentStatus::Expired);
        assert!(!c.is_active_at(now));
        assert!(c.is_active_at(c.granted_at));
    }

    #[test]
    fn revoked_consent_never_reads_active() {
        let mut c = consent(&["labs"]);
        c.status = ConsentStatus::Revoked;
        assert_eq!(c.status_at(c.granted_at), ConsentStatus::Revoked);
    }

    // ── Grant parameters ────────────────────────────────────────────────────

    #[test]
    fn grant_parameters_by_level() {
        let critical = GrantParameters::for_level(EmergencyLevel::Critical);
        assert_eq!(critical.duration, Duration::hours(4));
        assert_eq!(critical.restrictions, vec![restriction::SUPERVISOR_REVIEW_1H]);

        let high = GrantParameters::for_level(EmergencyLevel::High);
        assert_eq!(high.duration, Duration::hours(2));
        assert!(high.restrictions.contains(&restriction::LIMITED_PHI.to_string()));

        let moderate = GrantParameters::for_level(EmergencyLevel::Moderate);
        assert_eq!(moderate.duration, Duration::hours(1));
        assert_eq!(moderate.restrictions.len(), 3);

        let low = GrantParameters::for_level(EmergencyLevel::Low);
        assert_eq!(low.duration, Duration::minutes(30));
        assert_eq!(
            low.restrictions,
            vec![
                restriction::SUPERVISOR_APPROVAL,
                restriction::READ_ONLY,
                restriction::NO_PHI
            ]
        );
    }

    #[test]
    fn emergency_level_parses_only_known_values() {
        assert_eq!("critical".parse::<EmergencyLevel>().unwrap(), EmergencyLevel::Critical);
        assert!("severe".parse::<EmergencyLevel>().is_err());
        assert!("Critical".parse::<EmergencyLevel>().is_err());
    }

    #[test]
    fn access_type_parses_only_known_values() {
        assert_eq!("care_plan".parse::<AccessType>().unwrap(), AccessType::CarePlan);
        assert!("billing".parse::<AccessType>().is_err());
    }

    // ── Serde representations ───────────────────────────────────────────────

    #[test]
    fn wire_names_are_stable() {
        assert_eq!(serde_json::to_string(&Role::CareStaff).unwrap(), "\"care_staff\"");
        assert_eq!(
            serde_json::to_string(&identity::Permission::AccessOwnData).unwrap(),
            "\"access-own-data\""
        );
        assert_eq!(serde_json::to_string(&AccessBasis::SelfAccess).unwrap(), "\"self\"");
        assert_eq!(
            serde_json::to_string(&AlertType::CriticalAccessNoSupervisor).unwrap(),
            "\"CRITICAL_ACCESS_NO_SUPERVISOR\""
        );
    }

    // ── AccessRequest ───────────────────────────────────────────────────────

    #[test]
    fn blank_justification_is_absent() {
        let req = AccessRequest::new("nurse-1", Role::CareStaff, "resident-1", "emergency", ["vitals"])
            .with_justification("   ");
        assert!(req.justification().is_none());
        assert!(req.purpose.is_emergency());
    }

    // ── AuditFilter ─────────────────────────────────────────────────────────

    #[test]
    fn audit_filter_is_conjunctive() {
        let now = Utc::now();
        let entry = AuditEntry::new(
            UserId::new("nurse-1"),
            AuditAction::AccessCheck,
            "resident-1",
            true,
            "consent",
            now,
        );

        assert!(AuditFilter::default().matches(&entry));
        assert!(AuditFilter::by_user(UserId::new("nurse-1")).matches(&entry));
        assert!(!AuditFilter::by_user(UserId::new("nurse-2")).matches(&entry));

        let filter = AuditFilter {
            user_id: Some(UserId::new("nurse-1")),
            action: Some(AuditAction::ConsentGranted),
            ..AuditFilter::default()
        };
        assert!(!filter.matches(&entry));
    }

    // ── WardenError display messages ────────────────────────────────────────

    #[test]
    fn error_not_found_display() {
        let err = WardenError::not_found("emergency session", "abc");
        let msg = err.to_string();
        assert!(msg.contains("emergency session"));
        assert!(msg.contains("abc"));
    }

    #[test]
    fn error_audit_write_failed_display() {
        let err = WardenError::AuditWriteFailed { reason: "disk full".to_string() };
        let msg = err.to_string();
        assert!(msg.contains("audit write failed"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn error_backend_unavailable_display() {
        let err = WardenError::BackendUnavailable { reason: "consent store timeout".to_string() };
        assert!(err.to_string().contains("consent store timeout"));
    }
}
