//! Grant-time compliance rules.
//!
//! Alerts never block a grant. They are attached to the response, stored
//! for administrators, and recorded on the grant's audit entry.

use chrono::{DateTime, Utc};

use warden_contracts::emergency::{
    AlertId, AlertSeverity, AlertType, ComplianceAlert, EmergencyLevel, RequestId,
};

use crate::config::MonitorConfig;

/// What the rules look at, captured under the monitor's write lock.
#[derive(Debug, Clone, Copy)]
pub struct AlertContext {
    /// Live sessions the user already holds, not counting this request.
    pub live_sessions: usize,
    /// Earlier accesses by the user to the same resource inside the window.
    pub recent_accesses: usize,
    pub level: EmergencyLevel,
    pub supervisor_named: bool,
}

pub fn evaluate(
    ctx: &AlertContext,
    request_id: RequestId,
    now: DateTime<Utc>,
    config: &MonitorConfig,
) -> Vec<ComplianceAlert> {
    let mut alerts = Vec::new();
    let mut raise = |alert_type: AlertType, severity: AlertSeverity, message: String| {
        alerts.push(ComplianceAlert {
            id: AlertId::new(),
            request_id,
            alert_type,
            severity,
            message,
            triggered_at: now,
            action_required: severity >= AlertSeverity::High,
            resolved_at: None,
        });
    };

    if ctx.live_sessions + 1 > config.max_concurrent_sessions {
        raise(
            AlertType::MultipleConcurrentEmergencyAccess,
            AlertSeverity::High,
            format!(
                "user holds {} concurrent emergency sessions (limit {})",
                ctx.live_sessions + 1,
                config.max_concurrent_sessions
            ),
        );
    }

    if ctx.level == EmergencyLevel::Critical && !ctx.supervisor_named {
        raise(
            AlertType::CriticalAccessNoSupervisor,
            AlertSeverity::Critical,
            "critical emergency access granted with no supervisor named".to_string(),
        );
    }

    if ctx.recent_accesses > config.pattern_threshold {
        raise(
            AlertType::SuspiciousAccessPattern,
            AlertSeverity::Moderate,
            format!(
                "resource accessed {} times in the last {} minutes",
                ctx.recent_accesses + 1,
                config.pattern_window_minutes
            ),
        );
    }

    alerts
}
