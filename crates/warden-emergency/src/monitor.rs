//! The emergency access monitor.
//!
//! All session, alert and recent-access state sits behind one `RwLock`, so
//! the concurrent-session count, the pattern count and the insert of a new
//! grant happen as a single step. Audit writes and supervisor paging run
//! after the lock is released.
//!
//! A grant that fails its audit write is rolled back. A revoke or expiry
//! whose audit write fails stays retired but is marked unrecorded, and the
//! next revoke or sweep that sees it writes the missing records.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, info, warn};

use warden_audit::RecentAccessCache;
use warden_contracts::{
    audit::{AuditAction, AuditEntry, AuditEntryId, AuditFilter, Page},
    emergency::{
        AlertId, ComplianceAlert, ComplianceStatus, EmergencyAccessRequest,
        EmergencyAccessResponse, EmergencyGrant, GrantParameters, GrantState, RequestId,
        RevokeOutcome, SessionStatus,
    },
    error::{WardenError, WardenResult},
    identity::{Actor, Permission, UserId},
};
use warden_core::{
    admin::require_permission,
    clock::Clock,
    traits::{AuditSink, Notifier, PermissionMatrix, SupervisorNotice},
};

use crate::{
    alerts::{self, AlertContext},
    config::MonitorConfig,
    token::issue_access_token,
    validation::{validate, ValidatedRequest},
};

/// A grant that has left the active table, kept so status and revoke stay
/// answerable afterwards.
#[derive(Debug, Clone)]
struct RetiredGrant {
    grant: EmergencyGrant,
    state: GrantState,
    retired_at: DateTime<Utc>,
    revoked_by: Option<Actor>,
    audit: RetirementAudit,
}

/// Progress of the two audit writes that record a retirement: the
/// revoke/expire entry, then resolution of the grant entry.
#[derive(Debug, Clone, Copy, Default)]
struct RetirementAudit {
    entry_id: Option<AuditEntryId>,
    grant_resolved: bool,
    in_flight: bool,
}

impl RetirementAudit {
    fn claimed() -> Self {
        Self { in_flight: true, ..Self::default() }
    }

    fn is_complete(&self) -> bool {
        self.entry_id.is_some() && self.grant_resolved
    }

    /// Unrecorded and not being written by another caller.
    fn is_pending(&self) -> bool {
        !self.in_flight && !self.is_complete()
    }
}

struct MonitorState {
    active: HashMap<RequestId, EmergencyGrant>,
    retired: HashMap<RequestId, RetiredGrant>,
    alerts: Vec<ComplianceAlert>,
    recent: RecentAccessCache,
}

/// Point-in-time counters for dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonitorStats {
    /// Sessions still in the active table, including ones past expiry that
    /// the sweeper has not retired yet.
    pub active_sessions: usize,
    pub live_sessions: usize,
    pub retired_sessions: usize,
    /// Retired sessions whose revoke or expiry is not yet in the audit trail.
    pub unrecorded_retirements: usize,
    pub total_alerts: usize,
    pub unresolved_alerts: usize,
}

/// Issues, tracks and retires break-glass grants.
pub struct EmergencyAccessMonitor {
    config: MonitorConfig,
    permissions: Arc<dyn PermissionMatrix>,
    audit: Arc<dyn AuditSink>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    state: RwLock<MonitorState>,
}

impl EmergencyAccessMonitor {
    pub fn new(
        config: MonitorConfig,
        permissions: Arc<dyn PermissionMatrix>,
        audit: Arc<dyn AuditSink>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let recent = RecentAccessCache::new(config.recent_cache_capacity);
        Self {
            config,
            permissions,
            audit,
            notifier,
            clock,
            state: RwLock::new(MonitorState {
                active: HashMap::new(),
                retired: HashMap::new(),
                alerts: Vec::new(),
                recent,
            }),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    fn read_state(&self) -> WardenResult<RwLockReadGuard<'_, MonitorState>> {
        self.state.read().map_err(|_| WardenError::BackendUnavailable {
            reason: "emergency monitor state lock poisoned".to_string(),
        })
    }

    fn write_state(&self) -> WardenResult<RwLockWriteGuard<'_, MonitorState>> {
        self.state.write().map_err(|_| WardenError::BackendUnavailable {
            reason: "emergency monitor state lock poisoned".to_string(),
        })
    }

    fn pattern_window(&self) -> Duration {
        Duration::minutes(self.config.pattern_window_minutes)
    }

    /// Load grant history inside the pattern window from the audit trail into
    /// the recent-access cache. Returns the number of accesses loaded.
    ///
    /// Call once after construction when the trail outlives the process
    /// (journal-backed), so the pattern check survives a restart.
    pub fn warm_from_audit(&self) -> WardenResult<usize> {
        let since = self.clock.now() - self.pattern_window();
        let filter = AuditFilter {
            action: Some(AuditAction::EmergencyAccessGranted),
            since: Some(since),
            ..AuditFilter::default()
        };

        let mut loaded = Vec::new();
        let mut offset = 0;
        loop {
            let page = self.audit.query(&filter, Page::new(offset, Page::DEFAULT_LIMIT))?;
            let fetched = page.len();
            loaded.extend(page.into_iter().map(|e| (e.user_id, e.resource, e.timestamp)));
            if fetched < Page::DEFAULT_LIMIT {
                break;
            }
            offset += fetched;
        }

        let mut state = self.write_state()?;
        for (user_id, resource, at) in &loaded {
            state.recent.record(user_id, resource, *at);
        }
        info!(loaded = loaded.len(), "recent-access cache warmed from audit trail");
        Ok(loaded.len())
    }

    // ── Requests ─────────────────────────────────────────────────────────────

    /// Handle a break-glass request.
    ///
    /// # Errors
    ///
    /// `Validation` for malformed input (after the rejection is audited), and
    /// any audit failure. A requester whose role may not break glass gets an
    /// `Ok` response with `access_granted = false`.
    pub fn request_access(&self, request: &EmergencyAccessRequest) -> WardenResult<EmergencyAccessResponse> {
        let now = self.clock.now();
        let request_id = RequestId::new();

        let validated = match validate(request, self.config.min_justification_length) {
            Ok(v) => v,
            Err(e) => {
                warn!(request_id = %request_id, user_id = %request.user_id, error = %e, "emergency request rejected");
                self.audit_denial(request_id, request, &e.to_string(), now)?;
                return Err(e);
            }
        };

        if !validated.requester_role.is_emergency_responder() {
            let reason = format!(
                "role '{}' may not request emergency access",
                validated.requester_role
            );
            warn!(request_id = %request_id, user_id = %validated.user_id, %reason, "emergency request denied");
            let audit_trail_id = self.audit_denial(request_id, request, &reason, now)?;
            return Ok(EmergencyAccessResponse {
                request_id,
                access_granted: false,
                reason,
                expires_at: None,
                access_token: None,
                restrictions: Vec::new(),
                audit_trail_id,
                compliance_status: ComplianceStatus::Denied,
                alerts_triggered: Vec::new(),
                supervisor_notified: false,
            });
        }

        self.grant(request_id, validated, now)
    }

    fn grant(
        &self,
        request_id: RequestId,
        req: ValidatedRequest,
        now: DateTime<Utc>,
    ) -> WardenResult<EmergencyAccessResponse> {
        let params = GrantParameters::for_level(req.level);
        let audit_entry_id = AuditEntryId::new();
        let paging = req.level.notifies_supervisor();

        let (grant, raised) = {
            let mut state = self.write_state()?;
            let window_start = now - self.pattern_window();
            state.recent.prune_before(window_start);

            let ctx = AlertContext {
                live_sessions: state
                    .active
                    .values()
                    .filter(|g| g.user_id == req.user_id && g.is_live_at(now))
                    .count(),
                recent_accesses: state
                    .recent
                    .count_since(&req.user_id, &req.resource_accessed, window_start),
                level: req.level,
                supervisor_named: req.supervisor_id.is_some(),
            };
            let raised = alerts::evaluate(&ctx, request_id, now, &self.config);

            let grant = EmergencyGrant {
                request_id,
                access_token: issue_access_token(request_id, &req.user_id, now),
                user_id: req.user_id,
                access_type: req.access_type,
                emergency_level: req.level,
                justification: req.justification,
                resource_accessed: req.resource_accessed,
                requested_by: req.requested_by,
                supervisor_id: req.supervisor_id,
                granted_at: now,
                expires_at: now + params.duration,
                restrictions: params.restrictions,
                alerts_triggered: raised.iter().map(|a| a.id).collect(),
                supervisor_notified: paging,
                audit_entry_id,
            };

            state.active.insert(request_id, grant.clone());
            state.alerts.extend(raised.iter().cloned());
            state.recent.record(&grant.user_id, &grant.resource_accessed, now);
            (grant, raised)
        };

        if let Err(e) = self.audit_grant(&grant, &raised) {
            error!(request_id = %request_id, error = %e, "grant audit failed; rolling back session");
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.active.remove(&request_id);
            state.alerts.retain(|a| a.request_id != request_id);
            state.recent.forget(&grant.user_id, &grant.resource_accessed, now);
            return Err(e);
        }

        let mut supervisor_notified = paging;
        if paging {
            let notice = SupervisorNotice {
                request_id,
                user_id: grant.user_id.clone(),
                supervisor_id: grant.supervisor_id.clone(),
                emergency_level: grant.emergency_level,
                resource_accessed: grant.resource_accessed.clone(),
                expires_at: grant.expires_at,
                alerts: raised.clone(),
            };
            if let Err(e) = self.notifier.notify_supervisor(&notice) {
                warn!(request_id = %request_id, error = %e, "supervisor notification failed");
                supervisor_notified = false;
                let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
                if let Some(g) = state.active.get_mut(&request_id) {
                    g.supervisor_notified = false;
                }
            }
        }

        info!(
            request_id = %request_id,
            user_id = %grant.user_id,
            level = %grant.emergency_level,
            access_type = %grant.access_type,
            expires_at = %grant.expires_at,
            alerts = raised.len(),
            "emergency access granted"
        );
        for alert in &raised {
            warn!(
                request_id = %request_id,
                alert = %alert.alert_type,
                severity = ?alert.severity,
                "compliance alert raised"
            );
        }

        Ok(EmergencyAccessResponse {
            request_id,
            access_granted: true,
            reason: format!("emergency access granted at level '{}'", grant.emergency_level),
            expires_at: Some(grant.expires_at),
            access_token: Some(grant.access_token),
            restrictions: grant.restrictions,
            audit_trail_id: audit_entry_id,
            compliance_status: if raised.is_empty() {
                ComplianceStatus::Compliant
            } else {
                ComplianceStatus::AlertsRaised
            },
            alerts_triggered: raised,
            supervisor_notified,
        })
    }

    // ── Sessions ─────────────────────────────────────────────────────────────

    /// Status of a grant. `active` is computed from the clock, so a session
    /// past its expiry reports inactive even before the sweeper runs.
    pub fn session_status(&self, request_id: RequestId) -> WardenResult<SessionStatus> {
        let now = self.clock.now();
        let state = self.read_state()?;

        let (grant, grant_state) = if let Some(grant) = state.active.get(&request_id) {
            let s = if grant.is_live_at(now) { GrantState::Active } else { GrantState::Expired };
            (grant, s)
        } else if let Some(retired) = state.retired.get(&request_id) {
            (&retired.grant, retired.state)
        } else {
            return Err(WardenError::not_found("emergency session", request_id));
        };

        Ok(SessionStatus {
            request_id,
            active: grant_state == GrantState::Active,
            state: grant_state,
            expires_at: grant.expires_at,
            emergency_level: grant.emergency_level,
            access_type: grant.access_type,
            restrictions: grant.restrictions.clone(),
        })
    }

    /// True only for a live grant presenting its own token.
    pub fn validate_token(&self, request_id: RequestId, token: &str) -> bool {
        let now = self.clock.now();
        match self.state.read() {
            Ok(state) => state
                .active
                .get(&request_id)
                .map_or(false, |g| g.is_live_at(now) && g.access_token == token),
            Err(_) => false,
        }
    }

    /// Live grants currently held by `user_id`.
    pub fn live_sessions_for(&self, user_id: &UserId) -> WardenResult<Vec<EmergencyGrant>> {
        let now = self.clock.now();
        let state = self.read_state()?;
        let mut grants: Vec<EmergencyGrant> = state
            .active
            .values()
            .filter(|g| g.user_id == *user_id && g.is_live_at(now))
            .cloned()
            .collect();
        grants.sort_by_key(|g| g.granted_at);
        Ok(grants)
    }

    /// End a grant early. Idempotent: revoking an inactive grant returns
    /// `AlreadyInactive` and writes nothing, unless an earlier revoke or
    /// expiry of it failed to reach the audit trail, in which case the
    /// missing records are written now.
    ///
    /// Only the grant holder or a caller allowed to override consent may
    /// revoke a live grant.
    pub fn revoke(&self, request_id: RequestId, caller: &Actor) -> WardenResult<RevokeOutcome> {
        let now = self.clock.now();

        let retired = {
            let mut state = self.write_state()?;
            if let Some(retired) = state.retired.get_mut(&request_id) {
                if !retired.audit.is_pending() {
                    debug!(request_id = %request_id, state = ?retired.state, "revoke of inactive session");
                    return Ok(RevokeOutcome::AlreadyInactive { state: retired.state });
                }
                debug!(request_id = %request_id, state = ?retired.state, "retrying unrecorded retirement");
                retired.audit.in_flight = true;
                retired.clone()
            } else {
                let Some(grant) = state.active.get(&request_id) else {
                    return Err(WardenError::not_found("emergency session", request_id));
                };
                let live = grant.is_live_at(now);
                if live && grant.user_id != caller.id {
                    require_permission(self.permissions.as_ref(), caller, Permission::OverrideConsent)?;
                }
                let Some(grant) = state.active.remove(&request_id) else {
                    return Err(WardenError::not_found("emergency session", request_id));
                };
                let retired = if live {
                    RetiredGrant {
                        grant,
                        state: GrantState::Revoked,
                        retired_at: now,
                        revoked_by: Some(caller.clone()),
                        audit: RetirementAudit::claimed(),
                    }
                } else {
                    RetiredGrant {
                        retired_at: grant.expires_at,
                        grant,
                        state: GrantState::Expired,
                        revoked_by: None,
                        audit: RetirementAudit::claimed(),
                    }
                };
                state.retired.insert(request_id, retired.clone());
                retired
            }
        };

        let audit_entry_id = self.record_retirement(&retired)?;
        match (retired.state, &retired.revoked_by) {
            (GrantState::Revoked, Some(revoker)) => {
                info!(request_id = %request_id, revoked_by = %revoker.id, "emergency access revoked");
                Ok(RevokeOutcome::Revoked { audit_entry_id })
            }
            (state, _) => {
                debug!(request_id = %request_id, "revoke found session already expired");
                Ok(RevokeOutcome::AlreadyInactive { state })
            }
        }
    }

    /// Retire every session whose expiry has passed and retry any earlier
    /// retirement that never reached the audit trail. Returns how many
    /// sessions this sweep retired.
    ///
    /// Sessions are moved out under the write lock first, so a failing
    /// audit write cannot leave an expired grant live. The first audit error
    /// is returned after every write has been attempted.
    pub fn sweep_expired(&self) -> WardenResult<usize> {
        let now = self.clock.now();

        let (to_record, newly_retired) = {
            let mut state = self.write_state()?;
            let ids: Vec<RequestId> = state
                .active
                .iter()
                .filter(|(_, g)| !g.is_live_at(now))
                .map(|(id, _)| *id)
                .collect();
            let mut to_record = Vec::with_capacity(ids.len());
            for id in ids {
                if let Some(grant) = state.active.remove(&id) {
                    let retired = RetiredGrant {
                        retired_at: grant.expires_at,
                        grant,
                        state: GrantState::Expired,
                        revoked_by: None,
                        audit: RetirementAudit::claimed(),
                    };
                    state.retired.insert(id, retired.clone());
                    to_record.push(retired);
                }
            }
            let newly_retired = to_record.len();

            for retired in state.retired.values_mut() {
                if retired.audit.is_pending() {
                    retired.audit.in_flight = true;
                    to_record.push(retired.clone());
                }
            }

            let window_start = now - self.pattern_window();
            state.recent.prune_before(window_start);
            (to_record, newly_retired)
        };

        let mut first_error = None;
        for retired in &to_record {
            let grant = &retired.grant;
            match self.record_retirement(retired) {
                Err(e) => {
                    error!(request_id = %grant.request_id, error = %e, "failed to audit session retirement");
                    first_error.get_or_insert(e);
                }
                Ok(_) if retired.state == GrantState::Revoked => {
                    info!(request_id = %grant.request_id, "recorded earlier revoke");
                }
                Ok(_) => {
                    info!(request_id = %grant.request_id, user_id = %grant.user_id, "emergency access expired");
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                if !to_record.is_empty() {
                    debug!(retired = newly_retired, recorded = to_record.len(), "sweep complete");
                }
                Ok(newly_retired)
            }
        }
    }

    // ── Alerts (admin) ───────────────────────────────────────────────────────

    /// Unresolved compliance alerts, oldest first. Requires `view-audit-logs`.
    pub fn unresolved_alerts(&self, caller: &Actor) -> WardenResult<Vec<ComplianceAlert>> {
        require_permission(self.permissions.as_ref(), caller, Permission::ViewAuditLogs)?;
        let state = self.read_state()?;
        Ok(state.alerts.iter().filter(|a| a.resolved_at.is_none()).cloned().collect())
    }

    /// Mark an alert resolved. Requires `view-audit-logs`; an alert resolves
    /// once.
    pub fn resolve_alert(&self, caller: &Actor, alert_id: AlertId) -> WardenResult<ComplianceAlert> {
        require_permission(self.permissions.as_ref(), caller, Permission::ViewAuditLogs)?;
        let now = self.clock.now();

        let resolved = {
            let mut state = self.write_state()?;
            let alert = state
                .alerts
                .iter_mut()
                .find(|a| a.id == alert_id)
                .ok_or_else(|| WardenError::not_found("compliance alert", alert_id))?;
            if alert.resolved_at.is_some() {
                return Err(WardenError::InvalidTransition {
                    reason: format!("alert {alert_id} is already resolved"),
                });
            }
            alert.resolved_at = Some(now);
            alert.clone()
        };

        let mut entry = AuditEntry::new(
            caller.id.clone(),
            AuditAction::AlertResolved,
            format!("alert:{alert_id}"),
            true,
            resolved.message.clone(),
            now,
        );
        entry.request_id = Some(resolved.request_id);
        entry.alerts = vec![alert_id];
        entry.details = json!({ "alert_type": resolved.alert_type, "severity": resolved.severity });
        self.audit.append(entry)?;

        info!(alert_id = %alert_id, resolved_by = %caller.id, "compliance alert resolved");
        Ok(resolved)
    }

    pub fn stats(&self) -> WardenResult<MonitorStats> {
        let now = self.clock.now();
        let state = self.read_state()?;
        Ok(MonitorStats {
            active_sessions: state.active.len(),
            live_sessions: state.active.values().filter(|g| g.is_live_at(now)).count(),
            retired_sessions: state.retired.len(),
            unrecorded_retirements: state.retired.values().filter(|r| !r.audit.is_complete()).count(),
            total_alerts: state.alerts.len(),
            unresolved_alerts: state.alerts.iter().filter(|a| a.resolved_at.is_none()).count(),
        })
    }

    // ── Audit records ────────────────────────────────────────────────────────

    fn audit_denial(
        &self,
        request_id: RequestId,
        request: &EmergencyAccessRequest,
        reason: &str,
        now: DateTime<Utc>,
    ) -> WardenResult<AuditEntryId> {
        let user = match request.user_id.trim() {
            "" => "unknown",
            id => id,
        };
        let mut entry = AuditEntry::new(
            UserId::new(user),
            AuditAction::EmergencyAccessDenied,
            request.resource_accessed.trim(),
            false,
            request.justification.trim(),
            now,
        );
        entry.request_id = Some(request_id);
        entry.details = json!({
            "reason": reason,
            "requester_role": request.requester_role,
            "access_type": request.access_type,
            "emergency_level": request.emergency_level,
            "requested_by": request.requested_by,
        });
        self.audit.append(entry)
    }

    fn audit_grant(&self, grant: &EmergencyGrant, raised: &[ComplianceAlert]) -> WardenResult<AuditEntryId> {
        let mut entry = AuditEntry::new(
            grant.user_id.clone(),
            AuditAction::EmergencyAccessGranted,
            grant.resource_accessed.clone(),
            true,
            grant.justification.clone(),
            grant.granted_at,
        );
        entry.id = grant.audit_entry_id;
        entry.request_id = Some(grant.request_id);
        entry.alerts = grant.alerts_triggered.clone();
        entry.details = json!({
            "access_type": grant.access_type,
            "emergency_level": grant.emergency_level,
            "requested_by": grant.requested_by,
            "supervisor_id": grant.supervisor_id,
            "expires_at": grant.expires_at,
            "restrictions": grant.restrictions,
            "supervisor_paged": grant.supervisor_notified,
            "alert_types": raised.iter().map(|a| a.alert_type).collect::<Vec<_>>(),
        });
        self.audit.append(entry)
    }

    /// Write whichever retirement records are still missing, then store the
    /// progress and release the claim, whether or not the writes succeeded.
    fn record_retirement(&self, retired: &RetiredGrant) -> WardenResult<AuditEntryId> {
        let mut progress = retired.audit;
        let result = self.write_retirement_records(retired, &mut progress);
        progress.in_flight = false;

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(r) = state.retired.get_mut(&retired.grant.request_id) {
            r.audit = progress;
        }
        result
    }

    fn write_retirement_records(
        &self,
        retired: &RetiredGrant,
        progress: &mut RetirementAudit,
    ) -> WardenResult<AuditEntryId> {
        let grant = &retired.grant;
        let entry_id = match progress.entry_id {
            Some(id) => id,
            None => {
                let id = self.audit.append(retirement_entry(retired))?;
                progress.entry_id = Some(id);
                id
            }
        };
        if !progress.grant_resolved {
            self.audit.mark_resolved(grant.audit_entry_id, retired.retired_at)?;
            progress.grant_resolved = true;
        }
        Ok(entry_id)
    }
}

/// The revoke or expire entry for `retired`.
fn retirement_entry(retired: &RetiredGrant) -> AuditEntry {
    let grant = &retired.grant;
    let (action, user, note) = match (retired.state, &retired.revoked_by) {
        (GrantState::Revoked, Some(actor)) => (
            AuditAction::EmergencyAccessRevoked,
            actor.id.clone(),
            format!("revoked by {}", actor.id),
        ),
        _ => (
            AuditAction::EmergencyAccessExpired,
            grant.user_id.clone(),
            "grant duration elapsed".to_string(),
        ),
    };

    let mut entry = AuditEntry::new(user, action, grant.resource_accessed.clone(), false, note, retired.retired_at);
    entry.request_id = Some(grant.request_id);
    entry.details = json!({
        "grant_holder": grant.user_id,
        "granted_at": grant.granted_at,
        "expires_at": grant.expires_at,
        "grant_entry_id": grant.audit_entry_id,
    });
    entry
}
