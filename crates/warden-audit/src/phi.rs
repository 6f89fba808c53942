//! Best-effort PHI tagging for audit reporting.
//!
//! A keyword match over resource and data-type names. It only decorates
//! audit entries; access decisions never consult it.

const PHI_KEYWORDS: &[&str] = &[
    "allerg",
    "care_plan",
    "clinical",
    "condition",
    "diagnos",
    "health",
    "history",
    "lab",
    "medic",
    "meds",
    "mental",
    "notes",
    "patient",
    "prescri",
    "psych",
    "therap",
    "treatment",
    "vital",
];

/// True when `text` looks like it names protected health information.
pub fn looks_like_phi(text: &str) -> bool {
    let lowered = text.to_lowercase();
    PHI_KEYWORDS.iter().any(|k| lowered.contains(k))
}
