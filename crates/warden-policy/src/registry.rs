//! The role → permission registry.
//!
//! `PermissionRegistry` is built once at startup, either from the built-in
//! matrix or from a TOML document, and is read-only afterwards. Lookups are
//! plain set membership; anything not listed is denied.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::{debug, info};

use warden_contracts::{
    error::{WardenError, WardenResult},
    identity::{Permission, Role},
};
use warden_core::traits::PermissionMatrix;

use crate::matrix::MatrixConfig;

/// The TOML source of the default matrix, shipped with the crate.
pub const DEFAULT_MATRIX_TOML: &str = include_str!("../policies/default.toml");

/// Permissions that are audited whenever exercised, whatever the role.
pub const SENSITIVE_PERMISSIONS: [Permission; 5] = [
    Permission::AccessOthersData,
    Permission::AccessEmergencyData,
    Permission::OverrideConsent,
    Permission::ModifySystemSettings,
    Permission::ManageUsers,
];

/// A static, fail-closed role → permission matrix.
///
/// ```rust,ignore
/// use warden_policy::PermissionRegistry;
///
/// let registry = PermissionRegistry::from_file(Path::new("policies/default.toml"))?;
/// assert!(registry.has_permission(Role::Admin, Permission::ViewAuditLogs));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRegistry {
    matrix: HashMap<Role, HashSet<Permission>>,
}

impl PermissionRegistry {
    /// The deploy-time default matrix.
    pub fn builtin() -> Self {
        use Permission::*;

        let rows: [(Role, &[Permission]); 6] = [
            (Role::Resident, &[AccessOwnData, ManageOwnConsent]),
            (Role::FamilyMember, &[AccessOwnData, ManageOwnConsent]),
            (
                Role::CareStaff,
                &[AccessOwnData, AccessAssignedPatients, AccessEmergencyData, EscalateCrisis],
            ),
            (Role::CaseManager, &[AccessOwnData, AccessAssignedPatients, EscalateCrisis]),
            (
                Role::CareManager,
                &[
                    AccessOwnData,
                    AccessAssignedPatients,
                    AccessOthersData,
                    AccessEmergencyData,
                    EscalateCrisis,
                    OverrideConsent,
                ],
            ),
            (Role::Admin, &Permission::ALL),
        ];

        Self {
            matrix: rows
                .into_iter()
                .map(|(role, perms)| (role, perms.iter().copied().collect()))
                .collect(),
        }
    }

    /// Build a registry from an already-parsed config.
    ///
    /// Returns `ConfigError` if a role appears more than once.
    pub fn from_config(config: MatrixConfig) -> WardenResult<Self> {
        let mut matrix: HashMap<Role, HashSet<Permission>> = HashMap::new();
        for entry in config.roles {
            if matrix.contains_key(&entry.role) {
                return Err(WardenError::ConfigError {
                    reason: format!("role '{}' is listed more than once", entry.role),
                });
            }
            debug!(role = %entry.role, permissions = entry.permissions.len(), "loaded role");
            matrix.insert(entry.role, entry.permissions.into_iter().collect());
        }
        Ok(Self { matrix })
    }

    /// Parse `s` as a TOML permission matrix.
    ///
    /// Returns `ConfigError` if the TOML is malformed, names an unknown role
    /// or permission, or repeats a role.
    pub fn from_toml_str(s: &str) -> WardenResult<Self> {
        let config: MatrixConfig = toml::from_str(s).map_err(|e| WardenError::ConfigError {
            reason: format!("failed to parse permission matrix TOML: {}", e),
        })?;
        Self::from_config(config)
    }

    /// Read and parse the permission matrix at `path`.
    pub fn from_file(path: &Path) -> WardenResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| WardenError::ConfigError {
            reason: format!("failed to read permission matrix '{}': {}", path.display(), e),
        })?;
        let registry = Self::from_toml_str(&contents)?;
        info!(path = %path.display(), roles = registry.matrix.len(), "permission matrix loaded");
        Ok(registry)
    }

    /// `HasPermission(role, permission)`. Unknown pairs are `false`.
    pub fn has_permission(&self, role: Role, permission: Permission) -> bool {
        self.matrix
            .get(&role)
            .map(|perms| perms.contains(&permission))
            .unwrap_or(false)
    }

    /// `GetRolePermissions(role)`. Returns a copy; the registry is unaffected
    /// by changes to it.
    pub fn role_permissions(&self, role: Role) -> HashSet<Permission> {
        self.matrix.get(&role).cloned().unwrap_or_default()
    }

    /// `RequiresAuditLog(role, permission)`: always for admin, and for the
    /// sensitive permissions whoever exercises them.
    pub fn requires_audit_log(&self, role: Role, permission: Permission) -> bool {
        role == Role::Admin || SENSITIVE_PERMISSIONS.contains(&permission)
    }
}

impl Default for PermissionRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PermissionMatrix for PermissionRegistry {
    fn has_permission(&self, role: Role, permission: Permission) -> bool {
        PermissionRegistry::has_permission(self, role, permission)
    }

    fn role_permissions(&self, role: Role) -> HashSet<Permission> {
        PermissionRegistry::role_permissions(self, role)
    }

    fn requires_audit_log(&self, role: Role, permission: Permission) -> bool {
        PermissionRegistry::requires_audit_log(self, role, permission)
    }
}
