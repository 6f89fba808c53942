//! Emergency monitor configuration.

use serde::{Deserialize, Serialize};

/// Tunables for the emergency monitor. Every field has a default, so an
/// empty `[emergency]` TOML table is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Minimum justification length, in characters after trimming.
    ///
    /// An input-quality heuristic only; it is not a safeguard against a
    /// determined caller.
    pub min_justification_length: usize,

    /// More live sessions than this for one user raises
    /// `MULTIPLE_CONCURRENT_EMERGENCY_ACCESS`.
    pub max_concurrent_sessions: usize,

    /// Trailing window for the repeated-access pattern check.
    pub pattern_window_minutes: i64,

    /// More prior accesses than this to the same resource inside the window
    /// raises `SUSPICIOUS_ACCESS_PATTERN`.
    pub pattern_threshold: usize,

    /// How often the background sweeper retires expired sessions.
    pub sweep_interval_secs: u64,

    /// Capacity of the in-memory recent-access cache.
    pub recent_cache_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            min_justification_length: 20,
            max_concurrent_sessions: 3,
            pattern_window_minutes: 60,
            pattern_threshold: 2,
            sweep_interval_secs: 300,
            recent_cache_capacity: 10_000,
        }
    }
}
