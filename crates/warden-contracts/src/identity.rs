//! Actor identity, roles, and permissions.
//!
//! Roles and permissions are immutable reference data. The role → permission
//! matrix itself lives in `warden-policy`; this module only names the values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier for a person known to the system (resident, staff member,
/// family member, administrator).
///
/// Callers arrive with a verified `(UserId, Role)` claim; Warden never
/// authenticates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Enumerated healthcare actor type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Resident,
    FamilyMember,
    CareStaff,
    CaseManager,
    CareManager,
    Admin,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Resident,
        Role::FamilyMember,
        Role::CareStaff,
        Role::CaseManager,
        Role::CareManager,
        Role::Admin,
    ];

    /// Roles allowed to break the glass.
    pub const EMERGENCY_RESPONDERS: [Role; 3] = [Role::CareStaff, Role::CareManager, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Resident => "resident",
            Role::FamilyMember => "family_member",
            Role::CareStaff => "care_staff",
            Role::CaseManager => "case_manager",
            Role::CareManager => "care_manager",
            Role::Admin => "admin",
        }
    }

    /// True for roles that may invoke break-glass access.
    pub fn is_emergency_responder(&self) -> bool {
        Self::EMERGENCY_RESPONDERS.contains(self)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Enumerated capability a role may carry.
///
/// Serialized in kebab-case (`"access-own-data"`) so permission matrices
/// read naturally in TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Permission {
    AccessOwnData,
    AccessOthersData,
    AccessAssignedPatients,
    AccessEmergencyData,
    EscalateCrisis,
    OverrideConsent,
    ManageOwnConsent,
    ViewAuditLogs,
    ModifySystemSettings,
    ManageUsers,
}

impl Permission {
    pub const ALL: [Permission; 10] = [
        Permission::AccessOwnData,
        Permission::AccessOthersData,
        Permission::AccessAssignedPatients,
        Permission::AccessEmergencyData,
        Permission::EscalateCrisis,
        Permission::OverrideConsent,
        Permission::ManageOwnConsent,
        Permission::ViewAuditLogs,
        Permission::ModifySystemSettings,
        Permission::ManageUsers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::AccessOwnData => "access-own-data",
            Permission::AccessOthersData => "access-others-data",
            Permission::AccessAssignedPatients => "access-assigned-patients",
            Permission::AccessEmergencyData => "access-emergency-data",
            Permission::EscalateCrisis => "escalate-crisis",
            Permission::OverrideConsent => "override-consent",
            Permission::ManageOwnConsent => "manage-own-consent",
            Permission::ViewAuditLogs => "view-audit-logs",
            Permission::ModifySystemSettings => "modify-system-settings",
            Permission::ManageUsers => "manage-users",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A verified caller: who is asking, and in which role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self { id: UserId::new(id), role }
    }
}
