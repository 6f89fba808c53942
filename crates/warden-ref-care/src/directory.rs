use std::collections::HashSet;
use std::sync::RwLock;

use warden_contracts::{
    error::{WardenError, WardenResult},
    identity::UserId,
};
use warden_core::traits::AssignmentDirectory;

/// Care assignments held in memory: (staff member, resident) pairs.
#[derive(Debug, Default)]
pub struct StaticAssignmentDirectory {
    pairs: RwLock<HashSet<(UserId, UserId)>>,
}

impl StaticAssignmentDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let pairs = pairs
            .into_iter()
            .map(|(staff, resident)| (UserId::new(staff), UserId::new(resident)))
            .collect();
        Self { pairs: RwLock::new(pairs) }
    }

    pub fn assign(&self, staff: &UserId, resident: &UserId) -> WardenResult<()> {
        self.pairs
            .write()
            .map_err(|_| poisoned())?
            .insert((staff.clone(), resident.clone()));
        Ok(())
    }

    pub fn unassign(&self, staff: &UserId, resident: &UserId) -> WardenResult<bool> {
        Ok(self
            .pairs
            .write()
            .map_err(|_| poisoned())?
            .remove(&(staff.clone(), resident.clone())))
    }
}

fn poisoned() -> WardenError {
    WardenError::BackendUnavailable { reason: "assignment directory lock poisoned".to_string() }
}

impl AssignmentDirectory for StaticAssignmentDirectory {
    fn confirms_relationship(&self, actor: &UserId, subject: &UserId) -> WardenResult<bool> {
        let pairs = self.pairs.read().map_err(|_| poisoned())?;
        Ok(pairs.contains(&(actor.clone(), subject.clone())))
    }
}
