//! Runtime configuration.
//!
//! ```toml
//! permissions_file = "/etc/warden/permissions.toml"
//! audit_journal = "/var/lib/warden/audit.jsonl"
//!
//! [emergency]
//! max_concurrent_sessions = 3
//! sweep_interval_secs = 300
//! ```
//!
//! Every key is optional. Without `permissions_file` the built-in matrix is
//! used; without `audit_journal` the audit trail lives in memory only.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use warden_contracts::error::{WardenError, WardenResult};
use warden_emergency::MonitorConfig;
use warden_policy::PermissionRegistry;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    pub emergency: MonitorConfig,
    pub permissions_file: Option<PathBuf>,
    pub audit_journal: Option<PathBuf>,
}

impl RuntimeConfig {
    pub fn from_toml_str(s: &str) -> WardenResult<Self> {
        toml::from_str(s).map_err(|e| WardenError::ConfigError {
            reason: format!("failed to parse runtime config TOML: {e}"),
        })
    }

    pub fn from_file(path: &Path) -> WardenResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| WardenError::ConfigError {
            reason: format!("failed to read runtime config '{}': {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// The permission matrix this config selects.
    pub fn load_permissions(&self) -> WardenResult<PermissionRegistry> {
        match &self.permissions_file {
            Some(path) => PermissionRegistry::from_file(path),
            None => Ok(PermissionRegistry::builtin()),
        }
    }
}
