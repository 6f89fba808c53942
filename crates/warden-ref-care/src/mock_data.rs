//! Simulated roster for a small residential care home.
//!
//! All people in this module are fictional. The roster stands in for the
//! identity provider and rota system a real deployment would query.

use warden_contracts::identity::{Actor, Role};

// ── Residents ─────────────────────────────────────────────────────────────────

pub const RESIDENT_ADA: &str = "resident-ada";
pub const RESIDENT_BEN: &str = "resident-ben";
pub const RESIDENT_CORA: &str = "resident-cora";

// ── Staff and visitors ────────────────────────────────────────────────────────

/// Night-shift carer, assigned to Ada and Ben.
pub const CARER_NIA: &str = "carer-nia";
/// Day-shift carer, assigned to Cora only.
pub const CARER_OWEN: &str = "carer-owen";
/// Social-care case manager for Ben.
pub const CASE_MANAGER_PRIYA: &str = "case-priya";
pub const MANAGER_RUTH: &str = "manager-ruth";
pub const ADMIN_SAM: &str = "admin-sam";
/// Ada's daughter.
pub const FAMILY_TOM: &str = "family-tom";

/// Everyone known to the home, with their role.
pub fn roster() -> Vec<Actor> {
    vec![
        Actor::new(RESIDENT_ADA, Role::Resident),
        Actor::new(RESIDENT_BEN, Role::Resident),
        Actor::new(RESIDENT_CORA, Role::Resident),
        Actor::new(CARER_NIA, Role::CareStaff),
        Actor::new(CARER_OWEN, Role::CareStaff),
        Actor::new(CASE_MANAGER_PRIYA, Role::CaseManager),
        Actor::new(MANAGER_RUTH, Role::CareManager),
        Actor::new(ADMIN_SAM, Role::Admin),
        Actor::new(FAMILY_TOM, Role::FamilyMember),
    ]
}

/// Look up a roster member by id.
pub fn actor(id: &str) -> Option<Actor> {
    roster().into_iter().find(|a| a.id.as_str() == id)
}

/// Current care assignments as (staff, resident) pairs.
pub fn assignments() -> Vec<(&'static str, &'static str)> {
    vec![
        (CARER_NIA, RESIDENT_ADA),
        (CARER_NIA, RESIDENT_BEN),
        (CARER_OWEN, RESIDENT_CORA),
        (CASE_MANAGER_PRIYA, RESIDENT_BEN),
        (MANAGER_RUTH, RESIDENT_ADA),
        (MANAGER_RUTH, RESIDENT_BEN),
        (MANAGER_RUTH, RESIDENT_CORA),
    ]
}
