use tracing::warn;

use warden_contracts::error::WardenResult;
use warden_core::traits::{Notifier, SupervisorNotice};

/// Pages supervisors by emitting a structured `warn!` event.
///
/// Suitable when log shipping is the paging channel; swap in a real
/// `Notifier` otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify_supervisor(&self, notice: &SupervisorNotice) -> WardenResult<()> {
        let supervisor = notice
            .supervisor_id
            .as_ref()
            .map(|s| s.as_str())
            .unwrap_or("on-call");
        warn!(
            request_id = %notice.request_id,
            user_id = %notice.user_id,
            supervisor,
            level = %notice.emergency_level,
            resource = %notice.resource_accessed,
            expires_at = %notice.expires_at,
            alerts = notice.alerts.len(),
            "supervisor paged for emergency access"
        );
        Ok(())
    }
}
