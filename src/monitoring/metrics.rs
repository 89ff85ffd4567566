/*!
 * Timing Metrics
 * Turnaround, waiting and response times plus per-run statistics
 */

use crate::core::types::{Millis, Policy};
use serde::{Deserialize, Serialize};

/// Derived timing metrics for one completed process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingMetrics {
    pub turnaround: Millis,
    pub waiting: Millis,
    pub response: Millis,
}

impl TimingMetrics {
    /// `turnaround = completion - arrival`, `waiting = turnaround - burst`,
    /// `response = start - arrival`.
    ///
    /// Callers keep `arrival <= start <= completion` and
    /// `burst <= completion - arrival`, so `turnaround == waiting + burst`.
    #[inline]
    pub fn compute(arrival: Millis, start: Millis, completion: Millis, burst: Millis) -> Self {
        debug_assert!(arrival <= start && start <= completion);
        debug_assert!(burst <= completion - arrival);
        let turnaround = completion.saturating_sub(arrival);
        Self {
            turnaround,
            waiting: turnaround.saturating_sub(burst),
            response: start.saturating_sub(arrival),
        }
    }
}

/// Statistics for one scheduling run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RunStats {
    pub policy: Policy,
    /// Logical clock value when the run ended
    pub elapsed_ms: Millis,
    pub dispatches: u64,
    pub preemptions: u64,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub boosts: Vec<Millis>,
    pub errors: u64,
}

impl RunStats {
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            elapsed_ms: 0,
            dispatches: 0,
            preemptions: 0,
            boosts: Vec::new(),
            errors: 0,
        }
    }
}
