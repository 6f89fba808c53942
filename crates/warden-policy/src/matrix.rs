//! Permission matrix configuration schema.
//!
//! A `MatrixConfig` is deserialized from TOML and lists, per role, the
//! permissions that role carries. Roles that do not appear get nothing.
//!
//! Example:
//! ```toml
//! [[roles]]
//! role = "care_staff"
//! description = "Floor staff on shift"
//! permissions = ["access-own-data", "access-assigned-patients"]
//! ```

use serde::{Deserialize, Serialize};

use warden_contracts::identity::{Permission, Role};

/// One role's row in the matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleEntry {
    /// Role name in snake_case (`"care_manager"`). Unknown names fail to parse.
    pub role: Role,

    /// Human-readable note for operators. Not used in evaluation.
    #[serde(default)]
    pub description: Option<String>,

    /// Permission names in kebab-case (`"access-own-data"`).
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

/// The top-level structure deserialized from a TOML permission file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatrixConfig {
    #[serde(default)]
    pub roles: Vec<RoleEntry>,
}
