//! # warden-emergency
//!
//! Break-glass access for Warden.
//!
//! [`EmergencyAccessMonitor`] validates emergency requests, issues
//! time-bounded grants whose duration and restrictions depend only on the
//! emergency level, raises non-blocking compliance alerts, pages
//! supervisors for high and critical grants, and retires grants on revoke
//! or expiry. [`spawn_sweeper`] runs the periodic expiry sweep on a
//! background thread.
//!
//! Session liveness is always `now < expires_at`. A grant the sweeper has
//! not reached yet still reports inactive once its time is up.

pub mod alerts;
pub mod config;
pub mod monitor;
pub mod notifier;
pub mod sweeper;
pub mod token;
pub mod validation;

pub use config::MonitorConfig;
pub use monitor::{EmergencyAccessMonitor, MonitorStats};
pub use notifier::TracingNotifier;
pub use sweeper::{spawn_sweeper, SweeperHandle};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::thread;

    use chrono::{DateTime, Duration, TimeZone, Utc};

    use warden_audit::AuditTrail;
    use warden_contracts::{
        audit::{AuditAction, AuditEntry, AuditEntryId, AuditFilter, Page},
        emergency::{
            restriction, AlertType, ComplianceStatus, EmergencyAccessRequest, GrantState,
            RequestId, RevokeOutcome,
        },
        error::{WardenError, WardenResult},
        identity::{Actor, Role, UserId},
    };
    use warden_core::{
        clock::ManualClock,
        traits::{AuditSink, Notifier, SupervisorNotice},
    };
    use warden_policy::PermissionRegistry;

    use super::{spawn_sweeper, EmergencyAccessMonitor, MonitorConfig};

    const JUSTIFICATION: &str = "resident found unresponsive in room 12, need medication history";

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 2, 0, 0).unwrap()
    }

    #[derive(Default)]
    struct RecordingNotifier {
        notices: Mutex<Vec<SupervisorNotice>>,
        fail: bool,
    }

    impl Notifier for RecordingNotifier {
        fn notify_supervisor(&self, notice: &SupervisorNotice) -> WardenResult<()> {
            if self.fail {
                return Err(WardenError::BackendUnavailable { reason: "pager offline".into() });
            }
            self.notices.lock().unwrap().push(notice.clone());
            Ok(())
        }
    }

    /// Audit sink over a real trail that fails the first `appends` entries
    /// carrying `action`, and the first `resolves` resolutions.
    struct FailingSink {
        trail: Arc<AuditTrail>,
        action: AuditAction,
        appends: Mutex<usize>,
        resolves: Mutex<usize>,
    }

    impl FailingSink {
        fn new(trail: Arc<AuditTrail>, action: AuditAction, appends: usize, resolves: usize) -> Self {
            Self { trail, action, appends: Mutex::new(appends), resolves: Mutex::new(resolves) }
        }

        fn take(budget: &Mutex<usize>) -> bool {
            let mut left = budget.lock().unwrap();
            if *left == 0 {
                return false;
            }
            *left -= 1;
            true
        }
    }

    impl AuditSink for FailingSink {
        fn append(&self, entry: AuditEntry) -> WardenResult<AuditEntryId> {
            if entry.action == self.action && Self::take(&self.appends) {
                return Err(WardenError::AuditWriteFailed { reason: "disk full".into() });
            }
            self.trail.append(entry)
        }

        fn mark_resolved(&self, id: AuditEntryId, at: DateTime<Utc>) -> WardenResult<()> {
            if Self::take(&self.resolves) {
                return Err(WardenError::AuditWriteFailed { reason: "disk full".into() });
            }
            self.trail.mark_resolved(id, at)
        }

        fn query(&self, filter: &AuditFilter, page: Page) -> WardenResult<Vec<AuditEntry>> {
            self.trail.query(filter, page)
        }
    }

    struct Harness {
        monitor: Arc<EmergencyAccessMonitor>,
        audit: Arc<AuditTrail>,
        notifier: Arc<RecordingNotifier>,
        clock: ManualClock,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_notifier(RecordingNotifier::default())
        }

        fn with_notifier(notifier: RecordingNotifier) -> Self {
            Self::over(Arc::new(AuditTrail::new()), notifier)
        }

        fn over(audit: Arc<AuditTrail>, notifier: RecordingNotifier) -> Self {
            Self::with_sink(audit.clone(), audit, notifier)
        }

        /// A harness whose monitor writes through `sink`, which must wrap
        /// `audit`.
        fn with_sink(sink: Arc<dyn AuditSink>, audit: Arc<AuditTrail>, notifier: RecordingNotifier) -> Self {
            let clock = ManualClock::new(start());
            let notifier = Arc::new(notifier);
            let monitor = EmergencyAccessMonitor::new(
                MonitorConfig::default(),
                Arc::new(PermissionRegistry::builtin()),
                sink,
                notifier.clone(),
                Arc::new(clock.clone()),
            );
            Self { monitor: Arc::new(monitor), audit, notifier, clock }
        }

        fn count(&self, action: AuditAction) -> usize {
            self.audit.query(&AuditFilter::by_action(action), Page::default()).unwrap().len()
        }
    }

    fn request(user: &str, level: &str, resource: &str, supervisor: Option<&str>) -> EmergencyAccessRequest {
        EmergencyAccessRequest {
            user_id: user.to_string(),
            requester_role: Role::CareStaff,
            access_type: "medical_history".to_string(),
            emergency_level: level.to_string(),
            justification: JUSTIFICATION.to_string(),
            resource_accessed: resource.to_string(),
            requested_by: user.to_string(),
            supervisor_id: supervisor.map(str::to_string),
        }
    }

    fn admin() -> Actor {
        Actor::new("admin-1", Role::Admin)
    }

    // ── Grant parameters ──────────────────────────────────────────────────────

    #[test]
    fn critical_grant_without_supervisor_raises_alert_and_pages() {
        let h = Harness::new();
        let resp = h.monitor.request_access(&request("nurse-1", "critical", "resident-12/history", None)).unwrap();

        assert!(resp.access_granted);
        assert_eq!(resp.expires_at, Some(start() + Duration::hours(4)));
        assert_eq!(resp.restrictions, vec![restriction::SUPERVISOR_REVIEW_1H.to_string()]);
        assert!(resp.supervisor_notified);
        assert!(resp.has_alert(AlertType::CriticalAccessNoSupervisor));
        assert_eq!(resp.alerts_triggered.len(), 1);
        assert_eq!(resp.compliance_status, ComplianceStatus::AlertsRaised);

        let notices = h.notifier.notices.lock().unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].request_id, resp.request_id);
        assert!(notices[0].supervisor_id.is_none());
    }

    #[test]
    fn low_grant_is_short_restricted_and_silent() {
        let h = Harness::new();
        let resp = h.monitor.request_access(&request("nurse-1", "low", "resident-3/contacts", None)).unwrap();

        assert!(resp.access_granted);
        assert_eq!(resp.expires_at, Some(start() + Duration::minutes(30)));
        assert_eq!(
            resp.restrictions,
            vec![
                restriction::SUPERVISOR_APPROVAL.to_string(),
                restriction::READ_ONLY.to_string(),
                restriction::NO_PHI.to_string(),
            ]
        );
        assert!(!resp.supervisor_notified);
        assert_eq!(resp.compliance_status, ComplianceStatus::Compliant);
        assert!(h.notifier.notices.lock().unwrap().is_empty());
    }

    #[test]
    fn tokens_are_unique_and_tied_to_live_grants() {
        let h = Harness::new();
        let a = h.monitor.request_access(&request("nurse-1", "moderate", "r-1", None)).unwrap();
        let b = h.monitor.request_access(&request("nurse-1", "moderate", "r-2", None)).unwrap();

        let token_a = a.access_token.clone().unwrap();
        assert_eq!(token_a.len(), 64);
        assert_ne!(Some(token_a.clone()), b.access_token);
        assert!(h.monitor.validate_token(a.request_id, &token_a));
        assert!(!h.monitor.validate_token(b.request_id, &token_a));

        h.clock.advance(Duration::hours(1));
        assert!(!h.monitor.validate_token(a.request_id, &token_a), "token must die with the grant");
    }

    // ── Validation and role gate ──────────────────────────────────────────────

    #[test]
    fn short_justification_is_rejected_and_audited() {
        let h = Harness::new();
        let mut req = request("nurse-1", "high", "r-1", Some("sup-1"));
        req.justification = "  urgent   ".to_string();

        let err = h.monitor.request_access(&req).unwrap_err();
        assert!(matches!(err, WardenError::Validation { .. }));
        assert_eq!(h.count(AuditAction::EmergencyAccessDenied), 1);
        assert_eq!(h.monitor.stats().unwrap().active_sessions, 0);
    }

    #[test]
    fn unknown_level_and_access_type_are_rejected() {
        let h = Harness::new();

        let err = h.monitor.request_access(&request("nurse-1", "severe", "r-1", None)).unwrap_err();
        assert!(matches!(&err, WardenError::Validation { reason } if reason.contains("severe")));

        let mut req = request("nurse-1", "high", "r-1", None);
        req.access_type = "everything".to_string();
        assert!(matches!(h.monitor.request_access(&req), Err(WardenError::Validation { .. })));
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let h = Harness::new();
        let mut req = request("", "high", "", None);
        req.requested_by = String::new();

        match h.monitor.request_access(&req).unwrap_err() {
            WardenError::Validation { reason } => {
                assert!(reason.contains("user_id"));
                assert!(reason.contains("resource_accessed"));
                assert!(reason.contains("requested_by"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        let denied = h.audit.query(&AuditFilter::by_action(AuditAction::EmergencyAccessDenied), Page::default()).unwrap();
        assert_eq!(denied[0].user_id, UserId::new("unknown"));
    }

    #[test]
    fn non_responder_role_is_denied_without_session() {
        let h = Harness::new();
        let mut req = request("daughter-1", "critical", "resident-12/history", None);
        req.requester_role = Role::FamilyMember;

        let resp = h.monitor.request_access(&req).unwrap();
        assert!(!resp.access_granted);
        assert_eq!(resp.compliance_status, ComplianceStatus::Denied);
        assert!(resp.access_token.is_none());
        assert_eq!(h.monitor.stats().unwrap().active_sessions, 0);
        assert_eq!(h.count(AuditAction::EmergencyAccessDenied), 1);
        assert!(h.notifier.notices.lock().unwrap().is_empty());
    }

    // ── Compliance alerts ─────────────────────────────────────────────────────

    #[test]
    fn fourth_concurrent_session_raises_one_alert() {
        let h = Harness::new();
        for i in 0..3 {
            let resp = h
                .monitor
                .request_access(&request("nurse-1", "high", &format!("r-{i}"), Some("sup-1")))
                .unwrap();
            assert!(resp.alerts_triggered.is_empty(), "request {i} should be clean");
        }

        let fourth = h.monitor.request_access(&request("nurse-1", "high", "r-3", Some("sup-1"))).unwrap();
        assert!(fourth.access_granted, "alerts never block a grant");
        assert_eq!(fourth.alerts_triggered.len(), 1);
        assert!(fourth.has_alert(AlertType::MultipleConcurrentEmergencyAccess));
    }

    #[test]
    fn expired_sessions_do_not_count_as_concurrent() {
        let h = Harness::new();
        for i in 0..3 {
            h.monitor.request_access(&request("nurse-1", "low", &format!("r-{i}"), None)).unwrap();
        }
        h.clock.advance(Duration::minutes(31));

        let resp = h.monitor.request_access(&request("nurse-1", "low", "r-9", None)).unwrap();
        assert!(resp.alerts_triggered.is_empty());
    }

    #[test]
    fn repeated_access_to_one_resource_is_flagged() {
        let h = Harness::new();
        let nurse = Actor::new("nurse-1", Role::CareStaff);
        for _ in 0..3 {
            let resp = h.monitor.request_access(&request("nurse-1", "high", "resident-7/meds", Some("sup-1"))).unwrap();
            assert!(resp.alerts_triggered.is_empty());
            h.monitor.revoke(resp.request_id, &nurse).unwrap();
        }

        let fourth = h.monitor.request_access(&request("nurse-1", "high", "resident-7/meds", Some("sup-1"))).unwrap();
        assert_eq!(fourth.alerts_triggered.len(), 1);
        assert!(fourth.has_alert(AlertType::SuspiciousAccessPattern));
    }

    #[test]
    fn accesses_outside_the_window_are_forgotten() {
        let h = Harness::new();
        for _ in 0..3 {
            h.monitor.request_access(&request("nurse-1", "low", "resident-7/meds", None)).unwrap();
        }
        h.clock.advance(Duration::minutes(61));

        let resp = h.monitor.request_access(&request("nurse-1", "low", "resident-7/meds", None)).unwrap();
        assert!(!resp.has_alert(AlertType::SuspiciousAccessPattern));
    }

    #[test]
    fn pattern_check_survives_restart_via_audit_warmup() {
        let audit = Arc::new(AuditTrail::new());
        let first = Harness::over(audit.clone(), RecordingNotifier::default());
        let nurse = Actor::new("nurse-1", Role::CareStaff);
        for _ in 0..3 {
            let resp = first.monitor.request_access(&request("nurse-1", "high", "resident-7/meds", Some("sup-1"))).unwrap();
            first.monitor.revoke(resp.request_id, &nurse).unwrap();
        }

        let second = Harness::over(audit, RecordingNotifier::default());
        assert_eq!(second.monitor.warm_from_audit().unwrap(), 3);

        let resp = second.monitor.request_access(&request("nurse-1", "high", "resident-7/meds", Some("sup-1"))).unwrap();
        assert!(resp.has_alert(AlertType::SuspiciousAccessPattern));
    }

    #[test]
    fn concurrent_requests_count_sessions_exactly() {
        let h = Harness::new();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let monitor = h.monitor.clone();
                thread::spawn(move || {
                    monitor
                        .request_access(&request("nurse-1", "high", &format!("r-{i}"), Some("sup-1")))
                        .unwrap()
                })
            })
            .collect();

        let alerted = handles
            .into_iter()
            .map(|t| t.join().unwrap())
            .filter(|r| r.has_alert(AlertType::MultipleConcurrentEmergencyAccess))
            .count();

        assert_eq!(alerted, 5, "every request past the third must alert, and only those");
        assert_eq!(h.monitor.stats().unwrap().live_sessions, 8);
    }

    // ── Session status and expiry ─────────────────────────────────────────────

    #[test]
    fn status_reports_inactive_after_expiry_before_sweep() {
        let h = Harness::new();
        let resp = h.monitor.request_access(&request("nurse-1", "moderate", "r-1", None)).unwrap();
        assert!(h.monitor.session_status(resp.request_id).unwrap().active);

        h.clock.advance(Duration::minutes(61));
        let status = h.monitor.session_status(resp.request_id).unwrap();
        assert!(!status.active);
        assert_eq!(status.state, GrantState::Expired);
        assert_eq!(h.monitor.stats().unwrap().active_sessions, 1, "not swept yet");
    }

    #[test]
    fn sweep_retires_and_resolves_expired_grants() {
        let h = Harness::new();
        let short = h.monitor.request_access(&request("nurse-1", "low", "r-1", None)).unwrap();
        let long = h.monitor.request_access(&request("nurse-2", "critical", "r-2", Some("sup-1"))).unwrap();

        h.clock.advance(Duration::minutes(45));
        assert_eq!(h.monitor.sweep_expired().unwrap(), 1);
        assert_eq!(h.monitor.sweep_expired().unwrap(), 0);

        assert_eq!(h.monitor.session_status(short.request_id).unwrap().state, GrantState::Expired);
        assert!(h.monitor.session_status(long.request_id).unwrap().active);

        let grant_entry = h.audit.get(short.audit_trail_id).unwrap();
        assert_eq!(grant_entry.resolved_at, Some(start() + Duration::minutes(30)));
        assert_eq!(h.count(AuditAction::EmergencyAccessExpired), 1);
        assert!(h.audit.verify_integrity());
    }

    #[test]
    fn unknown_session_is_not_found() {
        let h = Harness::new();
        let err = h.monitor.session_status(RequestId::new()).unwrap_err();
        assert!(matches!(err, WardenError::NotFound { .. }));
    }

    // ── Revoke ────────────────────────────────────────────────────────────────

    #[test]
    fn revoke_is_idempotent() {
        let h = Harness::new();
        let nurse = Actor::new("nurse-1", Role::CareStaff);
        let resp = h.monitor.request_access(&request("nurse-1", "high", "r-1", Some("sup-1"))).unwrap();

        let first = h.monitor.revoke(resp.request_id, &nurse).unwrap();
        assert!(matches!(first, RevokeOutcome::Revoked { .. }));
        let second = h.monitor.revoke(resp.request_id, &nurse).unwrap();
        assert_eq!(second, RevokeOutcome::AlreadyInactive { state: GrantState::Revoked });

        assert_eq!(h.count(AuditAction::EmergencyAccessRevoked), 1);
        assert!(h.audit.get(resp.audit_trail_id).unwrap().resolved_at.is_some());
        assert!(!h.monitor.session_status(resp.request_id).unwrap().active);
    }

    #[test]
    fn revoke_of_lapsed_grant_records_expiry() {
        let h = Harness::new();
        let nurse = Actor::new("nurse-1", Role::CareStaff);
        let resp = h.monitor.request_access(&request("nurse-1", "low", "r-1", None)).unwrap();
        h.clock.advance(Duration::hours(1));

        let outcome = h.monitor.revoke(resp.request_id, &nurse).unwrap();
        assert_eq!(outcome, RevokeOutcome::AlreadyInactive { state: GrantState::Expired });
        assert_eq!(h.count(AuditAction::EmergencyAccessExpired), 1);
        assert_eq!(h.count(AuditAction::EmergencyAccessRevoked), 0);
    }

    #[test]
    fn only_holder_or_override_role_may_revoke() {
        let h = Harness::new();
        let resp = h.monitor.request_access(&request("nurse-1", "high", "r-1", Some("sup-1"))).unwrap();

        let colleague = Actor::new("nurse-2", Role::CareStaff);
        let err = h.monitor.revoke(resp.request_id, &colleague).unwrap_err();
        assert!(matches!(err, WardenError::Unauthorized { .. }));
        assert!(h.monitor.session_status(resp.request_id).unwrap().active);

        let manager = Actor::new("manager-1", Role::CareManager);
        assert!(matches!(
            h.monitor.revoke(resp.request_id, &manager).unwrap(),
            RevokeOutcome::Revoked { .. }
        ));
    }

    #[test]
    fn revoke_unknown_session_is_not_found() {
        let h = Harness::new();
        let err = h.monitor.revoke(RequestId::new(), &admin()).unwrap_err();
        assert!(matches!(err, WardenError::NotFound { .. }));
    }

    // ── Failure handling ──────────────────────────────────────────────────────

    #[test]
    fn failed_grant_audit_rolls_back_session() {
        let trail = Arc::new(AuditTrail::new());
        let sink = FailingSink::new(trail.clone(), AuditAction::EmergencyAccessGranted, 3, 0);
        let h = Harness::with_sink(Arc::new(sink), trail, RecordingNotifier::default());

        let err = h.monitor.request_access(&request("nurse-1", "critical", "resident-7/meds", None)).unwrap_err();
        assert!(matches!(err, WardenError::AuditWriteFailed { .. }));

        let stats = h.monitor.stats().unwrap();
        assert_eq!(stats.active_sessions, 0);
        assert_eq!(stats.total_alerts, 0);

        // Two more failures on the same resource, then a grant that lands.
        for _ in 0..2 {
            assert!(h.monitor.request_access(&request("nurse-1", "high", "resident-7/meds", Some("sup-1"))).is_err());
        }
        let resp = h.monitor.request_access(&request("nurse-1", "high", "resident-7/meds", Some("sup-1"))).unwrap();
        assert!(resp.access_granted);
        assert_eq!(h.count(AuditAction::EmergencyAccessGranted), 1);
        assert!(
            resp.alerts_triggered.is_empty(),
            "grants that never reached the trail must not count toward the access pattern"
        );
    }

    #[test]
    fn failed_revoke_audit_is_written_on_retry() {
        let trail = Arc::new(AuditTrail::new());
        let sink = FailingSink::new(trail.clone(), AuditAction::EmergencyAccessRevoked, 1, 0);
        let h = Harness::with_sink(Arc::new(sink), trail, RecordingNotifier::default());
        let resp = h.monitor.request_access(&request("nurse-1", "high", "r-1", Some("sup-1"))).unwrap();
        let nurse = Actor::new("nurse-1", Role::CareStaff);

        let err = h.monitor.revoke(resp.request_id, &nurse).unwrap_err();
        assert!(matches!(err, WardenError::AuditWriteFailed { .. }));
        assert!(!h.monitor.session_status(resp.request_id).unwrap().active);
        assert_eq!(h.monitor.stats().unwrap().unrecorded_retirements, 1);

        let retried = h.monitor.revoke(resp.request_id, &nurse).unwrap();
        assert!(matches!(retried, RevokeOutcome::Revoked { .. }));
        assert_eq!(h.count(AuditAction::EmergencyAccessRevoked), 1);
        assert_eq!(h.audit.get(resp.audit_trail_id).unwrap().resolved_at, Some(start()));
        assert_eq!(h.monitor.stats().unwrap().unrecorded_retirements, 0);

        assert_eq!(
            h.monitor.revoke(resp.request_id, &nurse).unwrap(),
            RevokeOutcome::AlreadyInactive { state: GrantState::Revoked }
        );
        assert_eq!(h.count(AuditAction::EmergencyAccessRevoked), 1);
    }

    #[test]
    fn failed_resolution_is_retried_without_duplicate_entry() {
        let trail = Arc::new(AuditTrail::new());
        let sink = FailingSink::new(trail.clone(), AuditAction::EmergencyAccessRevoked, 0, 1);
        let h = Harness::with_sink(Arc::new(sink), trail, RecordingNotifier::default());
        let resp = h.monitor.request_access(&request("nurse-1", "high", "r-1", Some("sup-1"))).unwrap();
        let nurse = Actor::new("nurse-1", Role::CareStaff);

        assert!(h.monitor.revoke(resp.request_id, &nurse).is_err());
        assert_eq!(h.count(AuditAction::EmergencyAccessRevoked), 1);
        assert!(h.audit.get(resp.audit_trail_id).unwrap().resolved_at.is_none());

        // The sweeper picks up the unfinished revoke.
        assert_eq!(h.monitor.sweep_expired().unwrap(), 0);
        assert_eq!(h.count(AuditAction::EmergencyAccessRevoked), 1);
        assert_eq!(h.audit.get(resp.audit_trail_id).unwrap().resolved_at, Some(start()));
        assert_eq!(h.monitor.stats().unwrap().unrecorded_retirements, 0);
    }

    #[test]
    fn failed_expiry_audit_is_retried_by_next_sweep() {
        let trail = Arc::new(AuditTrail::new());
        let sink = FailingSink::new(trail.clone(), AuditAction::EmergencyAccessExpired, 1, 0);
        let h = Harness::with_sink(Arc::new(sink), trail, RecordingNotifier::default());
        let resp = h.monitor.request_access(&request("nurse-1", "low", "r-1", None)).unwrap();
        h.clock.advance(Duration::minutes(31));

        assert!(h.monitor.sweep_expired().is_err());
        assert_eq!(h.count(AuditAction::EmergencyAccessExpired), 0);
        assert_eq!(h.monitor.session_status(resp.request_id).unwrap().state, GrantState::Expired);

        assert_eq!(h.monitor.sweep_expired().unwrap(), 0);
        assert_eq!(h.count(AuditAction::EmergencyAccessExpired), 1);
        assert_eq!(
            h.audit.get(resp.audit_trail_id).unwrap().resolved_at,
            Some(start() + Duration::minutes(30))
        );
    }

    #[test]
    fn notifier_failure_does_not_block_grant() {
        let h = Harness::with_notifier(RecordingNotifier { fail: true, ..Default::default() });
        let resp = h.monitor.request_access(&request("nurse-1", "critical", "r-1", Some("sup-1"))).unwrap();

        assert!(resp.access_granted);
        assert!(!resp.supervisor_notified);
        assert!(h.monitor.session_status(resp.request_id).unwrap().active);
    }

    // ── Alert administration ──────────────────────────────────────────────────

    #[test]
    fn alerts_are_admin_only_and_resolve_once() {
        let h = Harness::new();
        let resp = h.monitor.request_access(&request("nurse-1", "critical", "r-1", None)).unwrap();
        let alert_id = resp.alerts_triggered[0].id;

        let nurse = Actor::new("nurse-1", Role::CareStaff);
        assert!(matches!(h.monitor.unresolved_alerts(&nurse), Err(WardenError::Unauthorized { .. })));
        assert!(matches!(h.monitor.resolve_alert(&nurse, alert_id), Err(WardenError::Unauthorized { .. })));

        assert_eq!(h.monitor.unresolved_alerts(&admin()).unwrap().len(), 1);
        let resolved = h.monitor.resolve_alert(&admin(), alert_id).unwrap();
        assert_eq!(resolved.resolved_at, Some(start()));
        assert!(h.monitor.unresolved_alerts(&admin()).unwrap().is_empty());

        let again = h.monitor.resolve_alert(&admin(), alert_id).unwrap_err();
        assert!(matches!(again, WardenError::InvalidTransition { .. }));
        assert_eq!(h.count(AuditAction::AlertResolved), 1);
    }

    // ── Sweeper thread ────────────────────────────────────────────────────────

    #[test]
    fn background_sweeper_retires_expired_sessions() {
        let h = Harness::new();
        h.monitor.request_access(&request("nurse-1", "low", "r-1", None)).unwrap();
        h.clock.advance(Duration::minutes(31));

        let sweeper = spawn_sweeper(h.monitor.clone(), std::time::Duration::from_millis(10)).unwrap();
        let mut retired = 0;
        for _ in 0..200 {
            retired = h.monitor.stats().unwrap().retired_sessions;
            if retired == 1 {
                break;
            }
            thread::sleep(std::time::Duration::from_millis(10));
        }
        sweeper.stop();

        assert_eq!(retired, 1);
        assert_eq!(h.count(AuditAction::EmergencyAccessExpired), 1);
    }
}
