//! Scenario 3: Grant expiry and the audit record
//!
//! A moderate grant is issued and the clock is moved past its expiry. The
//! session reports inactive straight away, before any sweep; the sweep then
//! retires it and resolves its audit entry. Finally an administrator reads
//! the trail and a carer is refused the same query.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};

use warden_contracts::{
    audit::{AuditAction, AuditFilter, Page},
    emergency::{EmergencyAccessRequest, EmergencyAccessResponse, SessionStatus},
    error::{WardenError, WardenResult},
    identity::{Actor, Role},
};
use warden_core::clock::ManualClock;

use crate::{
    config::RuntimeConfig,
    mock_data::{ADMIN_SAM, CARER_OWEN, RESIDENT_CORA},
    runtime::Runtime,
};

#[derive(Debug)]
pub struct ExpiryOutcome {
    pub grant: EmergencyAccessResponse,
    pub before_expiry: SessionStatus,
    pub after_expiry_unswept: SessionStatus,
    pub swept: usize,
    pub after_sweep: SessionStatus,
    pub grant_entry_resolved: bool,
    pub expired_entries: usize,
    pub carer_query_refused: bool,
    pub audit_verified: bool,
}

fn describe(status: &SessionStatus) -> String {
    format!("active={} state={:?}", status.active, status.state)
}

/// Walk the expiry scenario. `clock` must be the clock `rt` was built with.
pub fn run(rt: &Runtime, clock: &ManualClock) -> WardenResult<ExpiryOutcome> {
    let grant = rt.monitor.request_access(&EmergencyAccessRequest {
        user_id: CARER_OWEN.to_string(),
        requester_role: Role::CareStaff,
        access_type: "care_plan".to_string(),
        emergency_level: "moderate".to_string(),
        justification: "fall in the garden, need mobility notes before moving her".to_string(),
        resource_accessed: format!("{RESIDENT_CORA}/care_plan"),
        requested_by: CARER_OWEN.to_string(),
        supervisor_id: None,
    })?;
    println!("  moderate grant issued, restrictions {:?}", grant.restrictions);

    let before_expiry = rt.monitor.session_status(grant.request_id)?;
    println!("  status at issue:              {}", describe(&before_expiry));

    clock.advance(Duration::minutes(61));
    let after_expiry_unswept = rt.monitor.session_status(grant.request_id)?;
    println!("  status +61m, before sweep:    {}", describe(&after_expiry_unswept));

    let swept = rt.monitor.sweep_expired()?;
    let after_sweep = rt.monitor.session_status(grant.request_id)?;
    println!("  sweep retired {swept} session(s)");
    println!("  status after sweep:           {}", describe(&after_sweep));

    let grant_entry_resolved = rt.audit.get(grant.audit_trail_id)?.resolved_at.is_some();

    let admin = Actor::new(ADMIN_SAM, Role::Admin);
    let expired_entries = rt
        .query_audit(&admin, &AuditFilter::by_action(AuditAction::EmergencyAccessExpired), Page::default())?
        .len();

    let carer = Actor::new(CARER_OWEN, Role::CareStaff);
    let carer_query_refused = matches!(
        rt.query_audit(&carer, &AuditFilter::default(), Page::default()),
        Err(WardenError::Unauthorized { .. })
    );

    let log = rt.audit.export_log()?;
    let audit_verified = rt.audit.verify_integrity();
    println!();
    println!("  grant entry resolved:         {grant_entry_resolved}");
    println!("  carer audit query refused:    {carer_query_refused}");
    println!(
        "  Audit chain integrity:        {} ({} entries, head {})",
        if audit_verified { "VERIFIED" } else { "FAILED" },
        log.entries.len(),
        log.terminal_hash.get(..12).unwrap_or("-")
    );

    Ok(ExpiryOutcome {
        grant,
        before_expiry,
        after_expiry_unswept,
        swept,
        after_sweep,
        grant_entry_resolved,
        expired_entries,
        carer_query_refused,
        audit_verified,
    })
}

pub fn run_scenario() -> WardenResult<()> {
    println!("=== Scenario 3: Grant expiry and the audit record ===");
    println!();

    let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 5, 9, 14, 30, 0).single().unwrap_or_else(Utc::now));
    let rt = Runtime::care_home(RuntimeConfig::default(), Arc::new(clock.clone()))?;
    let outcome = run(&rt, &clock)?;

    let expected = !outcome.after_expiry_unswept.active && outcome.swept == 1 && outcome.grant_entry_resolved;
    println!();
    println!("  RESULT: {}", if expected { "as expected" } else { "UNEXPECTED" });
    println!();
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
