//! End-to-end care-home scenarios.
//!
//! Each scenario builds a `Runtime`, drives it through one storyline and
//! prints what happened. `run` returns the observed outcome for tests;
//! `run_scenario` is what the demo CLI calls.

pub mod break_glass;
pub mod consent_access;
pub mod expiry;
