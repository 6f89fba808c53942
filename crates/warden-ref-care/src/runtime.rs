//! Composition root.
//!
//! `Runtime` builds every Warden component from a `RuntimeConfig` and wires
//! them to one shared audit trail and one clock.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use warden_audit::AuditTrail;
use warden_consent::{ConsentStore, InMemoryConsentBackend};
use warden_contracts::{
    audit::{AuditEntry, AuditFilter, Page},
    error::WardenResult,
    identity::Actor,
};
use warden_core::{
    admin,
    clock::{Clock, SystemClock},
    traits::{AssignmentDirectory, Notifier},
    AccessDecisionEngine,
};
use warden_emergency::{spawn_sweeper, EmergencyAccessMonitor, SweeperHandle, TracingNotifier};
use warden_policy::PermissionRegistry;

use crate::{config::RuntimeConfig, directory::StaticAssignmentDirectory, mock_data};

pub struct Runtime {
    pub permissions: Arc<PermissionRegistry>,
    pub audit: Arc<AuditTrail>,
    pub consents: Arc<ConsentStore>,
    pub engine: AccessDecisionEngine,
    pub monitor: Arc<EmergencyAccessMonitor>,
    pub clock: Arc<dyn Clock>,
    config: RuntimeConfig,
}

impl Runtime {
    pub fn new(
        config: RuntimeConfig,
        clock: Arc<dyn Clock>,
        directory: Arc<dyn AssignmentDirectory>,
        notifier: Arc<dyn Notifier>,
    ) -> WardenResult<Self> {
        let permissions = Arc::new(config.load_permissions()?);
        let audit = Arc::new(match &config.audit_journal {
            Some(path) => AuditTrail::with_journal(path)?,
            None => AuditTrail::new(),
        });

        let consents = Arc::new(ConsentStore::new(
            Arc::new(InMemoryConsentBackend::new()),
            permissions.clone(),
            audit.clone(),
            clock.clone(),
        ));
        let engine = AccessDecisionEngine::new(
            permissions.clone(),
            consents.clone(),
            directory,
            audit.clone(),
            clock.clone(),
        );
        let monitor = Arc::new(EmergencyAccessMonitor::new(
            config.emergency.clone(),
            permissions.clone(),
            audit.clone(),
            notifier,
            clock.clone(),
        ));

        if config.audit_journal.is_some() {
            monitor.warm_from_audit()?;
        }

        info!(
            journal = config.audit_journal.is_some(),
            custom_matrix = config.permissions_file.is_some(),
            audit_entries = audit.len(),
            "warden runtime ready"
        );

        Ok(Self { permissions, audit, consents, engine, monitor, clock, config })
    }

    /// The care-home runtime: mock assignments and log-based paging.
    pub fn care_home(config: RuntimeConfig, clock: Arc<dyn Clock>) -> WardenResult<Self> {
        let directory = Arc::new(StaticAssignmentDirectory::from_pairs(mock_data::assignments()));
        Self::new(config, clock, directory, Arc::new(TracingNotifier))
    }

    /// `care_home` on the system clock.
    pub fn care_home_live(config: RuntimeConfig) -> WardenResult<Self> {
        Self::care_home(config, Arc::new(SystemClock))
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Start the background expiry sweeper at the configured interval.
    pub fn start_sweeper(&self) -> WardenResult<SweeperHandle> {
        let interval = Duration::from_secs(self.config.emergency.sweep_interval_secs.max(1));
        spawn_sweeper(self.monitor.clone(), interval)
    }

    /// Audit query on behalf of `caller`, who must hold `view-audit-logs`.
    pub fn query_audit(&self, caller: &Actor, filter: &AuditFilter, page: Page) -> WardenResult<Vec<AuditEntry>> {
        admin::query_audit(self.permissions.as_ref(), self.audit.as_ref(), caller, filter, page)
    }
}
