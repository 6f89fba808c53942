//! Scenario 2: Break-glass at night
//!
//! A carer on the night shift finds a resident unresponsive and breaks the
//! glass without a named supervisor. The scenario then shows the role gate,
//! the concurrent-session alert, the emergency rule of the decision engine,
//! alert resolution by an administrator, and idempotent revoke.

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use warden_contracts::{
    access::{AccessBasis, AccessDecision, AccessRequest, Purpose},
    emergency::{AlertType, EmergencyAccessRequest, EmergencyAccessResponse, RevokeOutcome},
    error::WardenResult,
    identity::{Actor, Role},
};
use warden_core::clock::ManualClock;
use warden_emergency::MonitorStats;

use crate::{
    config::RuntimeConfig,
    mock_data::{ADMIN_SAM, CARER_NIA, FAMILY_TOM, MANAGER_RUTH, RESIDENT_ADA, RESIDENT_CORA},
    runtime::Runtime,
};

#[derive(Debug)]
pub struct BreakGlassOutcome {
    pub critical: EmergencyAccessResponse,
    pub family_denied: EmergencyAccessResponse,
    pub follow_ups: Vec<EmergencyAccessResponse>,
    pub emergency_decision: AccessDecision,
    pub alerts_resolved: usize,
    pub first_revoke: RevokeOutcome,
    pub second_revoke: RevokeOutcome,
    pub stats: MonitorStats,
}

fn emergency(user: &str, role: Role, level: &str, resource: &str, supervisor: Option<&str>) -> EmergencyAccessRequest {
    EmergencyAccessRequest {
        user_id: user.to_string(),
        requester_role: role,
        access_type: "medical_history".to_string(),
        emergency_level: level.to_string(),
        justification: "resident found unresponsive at 02:10, checking allergies and meds".to_string(),
        resource_accessed: resource.to_string(),
        requested_by: user.to_string(),
        supervisor_id: supervisor.map(str::to_string),
    }
}

fn show(label: &str, resp: &EmergencyAccessResponse) {
    let alerts: Vec<String> = resp.alerts_triggered.iter().map(|a| a.alert_type.to_string()).collect();
    println!(
        "  {label:<32} granted={:<5} paged={:<5} alerts=[{}]",
        resp.access_granted,
        resp.supervisor_notified,
        alerts.join(", ")
    );
}

pub fn run(rt: &Runtime) -> WardenResult<BreakGlassOutcome> {
    let nia = Actor::new(CARER_NIA, Role::CareStaff);
    let admin = Actor::new(ADMIN_SAM, Role::Admin);

    let ada_history = format!("{RESIDENT_ADA}/medical_history");
    let critical = rt
        .monitor
        .request_access(&emergency(CARER_NIA, Role::CareStaff, "critical", &ada_history, None))?;
    show("critical, no supervisor", &critical);
    if let Some(expires_at) = critical.expires_at {
        println!("    expires {expires_at}, restrictions {:?}", critical.restrictions);
    }

    let family_denied = rt
        .monitor
        .request_access(&emergency(FAMILY_TOM, Role::FamilyMember, "critical", &ada_history, None))?;
    show("family member breaks glass", &family_denied);
    println!("    {}", family_denied.reason);

    let mut follow_ups = Vec::new();
    for resource in ["care_plan", "emergency_contacts", "medications"] {
        let resp = rt.monitor.request_access(&emergency(
            CARER_NIA,
            Role::CareStaff,
            "high",
            &format!("{RESIDENT_ADA}/{resource}"),
            Some(MANAGER_RUTH),
        ))?;
        show(&format!("high, {resource}"), &resp);
        follow_ups.push(resp);
    }

    // Cora is not on Nia's list; the emergency rule does not need an assignment.
    let emergency_decision = rt.engine.check_access(
        &AccessRequest::new(CARER_NIA, Role::CareStaff, RESIDENT_CORA, Purpose::EMERGENCY, ["allergies"])
            .with_justification("second resident showing the same symptoms"),
    )?;
    println!(
        "  engine, emergency purpose        granted={} basis={}",
        emergency_decision.granted, emergency_decision.basis
    );

    let open = rt.monitor.unresolved_alerts(&admin)?;
    println!();
    println!("  {} unresolved alert(s) for the administrator", open.len());
    for alert in &open {
        rt.monitor.resolve_alert(&admin, alert.id)?;
        println!("    resolved {} ({:?})", alert.alert_type, alert.severity);
    }

    let first_revoke = rt.monitor.revoke(critical.request_id, &nia)?;
    let second_revoke = rt.monitor.revoke(critical.request_id, &nia)?;
    println!();
    println!("  revoke #1: {first_revoke:?}");
    println!("  revoke #2: {second_revoke:?}");

    let stats = rt.monitor.stats()?;
    println!(
        "  sessions live={} retired={}, alerts unresolved={}",
        stats.live_sessions, stats.retired_sessions, stats.unresolved_alerts
    );

    Ok(BreakGlassOutcome {
        critical,
        family_denied,
        follow_ups,
        emergency_decision,
        alerts_resolved: open.len(),
        first_revoke,
        second_revoke,
        stats,
    })
}

/// Run Scenario 2 at a fixed night-time instant.
pub fn run_scenario() -> WardenResult<()> {
    println!("=== Scenario 2: Break-glass at night ===");
    println!();

    let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 1, 15, 2, 10, 0).single().unwrap_or_else(Utc::now));
    let rt = Runtime::care_home(RuntimeConfig::default(), Arc::new(clock))?;
    let outcome = run(&rt)?;

    let expected = outcome.critical.has_alert(AlertType::CriticalAccessNoSupervisor)
        && !outcome.family_denied.access_granted
        && outcome.emergency_decision.basis == AccessBasis::Emergency;
    println!();
    println!("  RESULT: {}", if expected { "as expected" } else { "UNEXPECTED" });
    println!();
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;
    use warden_contracts::emergency::{restriction, ComplianceStatus, GrantState};
    use warden_core::clock::Clock;

    fn runtime() -> (Runtime, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 1, 15, 2, 10, 0).unwrap());
        let rt = Runtime::care_home(RuntimeConfig::default(), Arc::new(clock.clone())).unwrap();
        (rt, clock)
    }

    #[test]
    fn critical_without_supervisor_matches_policy() {
        let (rt, clock) = runtime();
        let outcome = run(&rt).unwrap();

        let critical = &outcome.critical;
        assert!(critical.access_granted);
        assert!(critical.has_alert(AlertType::CriticalAccessNoSupervisor));
        assert!(critical.supervisor_notified);
        assert_eq!(critical.restrictions, vec![restriction::SUPERVISOR_REVIEW_1H.to_string()]);
        assert_eq!(critical.expires_at, Some(clock.now() + Duration::hours(4)));
    }

    #[test]
    fn family_member_cannot_break_glass() {
        let (rt, _) = runtime();
        let outcome = run(&rt).unwrap();
        assert!(!outcome.family_denied.access_granted);
        assert_eq!(outcome.family_denied.compliance_status, ComplianceStatus::Denied);
    }

    #[test]
    fn fourth_session_raises_concurrency_alert() {
        let (rt, _) = runtime();
        let outcome = run(&rt).unwrap();

        assert!(outcome.follow_ups[..2].iter().all(|r| r.alerts_triggered.is_empty()));
        assert!(outcome.follow_ups[2].has_alert(AlertType::MultipleConcurrentEmergencyAccess));
    }

    #[test]
    fn engine_grants_justified_emergency_without_assignment() {
        let (rt, _) = runtime();
        let outcome = run(&rt).unwrap();
        assert!(outcome.emergency_decision.granted);
        assert_eq!(outcome.emergency_decision.basis, AccessBasis::Emergency);
    }

    #[test]
    fn alerts_resolved_and_revoke_idempotent() {
        let (rt, _) = runtime();
        let outcome = run(&rt).unwrap();

        assert_eq!(outcome.alerts_resolved, 2);
        assert_eq!(outcome.stats.unresolved_alerts, 0);
        assert!(matches!(outcome.first_revoke, RevokeOutcome::Revoked { .. }));
        assert_eq!(outcome.second_revoke, RevokeOutcome::AlreadyInactive { state: GrantState::Revoked });
        assert_eq!(outcome.stats.live_sessions, 3);
        assert_eq!(outcome.stats.retired_sessions, 1);
        assert!(rt.audit.verify_integrity());
    }
}
