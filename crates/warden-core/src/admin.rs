//! Admin-only read paths over the audit trail.

use tracing::warn;

use warden_contracts::{
    audit::{AuditEntry, AuditFilter, Page},
    error::{WardenError, WardenResult},
    identity::{Actor, Permission},
};

use crate::traits::{AuditSink, PermissionMatrix};

/// Fail with `Unauthorized` unless `caller`'s role carries `permission`.
pub fn require_permission(
    permissions: &dyn PermissionMatrix,
    caller: &Actor,
    permission: Permission,
) -> WardenResult<()> {
    if permissions.has_permission(caller.role, permission) {
        return Ok(());
    }
    warn!(
        caller_id = %caller.id,
        role = %caller.role,
        permission = %permission,
        "caller lacks required permission"
    );
    Err(WardenError::Unauthorized {
        reason: format!("role '{}' lacks the '{}' permission", caller.role, permission),
    })
}

/// Query the audit trail on behalf of `caller`, who must hold `view-audit-logs`.
pub fn query_audit(
    permissions: &dyn PermissionMatrix,
    audit: &dyn AuditSink,
    caller: &Actor,
    filter: &AuditFilter,
    page: Page,
) -> WardenResult<Vec<AuditEntry>> {
    require_permission(permissions, caller, Permission::ViewAuditLogs)?;
    audit.query(filter, page)
}
