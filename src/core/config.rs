/*!
 * Scheduler Configuration
 *
 * Quanta, boost interval, poll delays and report locations for every policy.
 * Loaded from TOML; any field left out keeps its default.
 */

use super::errors::{SchedError, SchedResult};
use super::types::{Millis, DEFAULT_PREDICTED_BURST_MS, MLFQ_LEVELS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Directory receiving the CSV (and optional JSON) summaries
    pub output_dir: PathBuf,

    /// Round robin quantum (default: 50ms)
    pub rr_quantum_ms: Millis,

    /// Per-level MLFQ quanta, highest priority first (default: 10/20/40ms)
    pub mlfq_quanta_ms: [Millis; MLFQ_LEVELS],

    /// Logical time between MLFQ priority boosts (default: 200ms)
    pub mlfq_boost_ms: Millis,

    /// Delay between online arrival checks (default: 100ms)
    pub sjf_poll_interval_ms: Millis,

    /// Predicted burst for never-seen commands (default: 1000ms)
    pub default_burst_ms: Millis,

    /// Input line that stops the online engine
    pub exit_sentinel: String,

    /// Captured output kept per process, in bytes (default: 64 KiB)
    pub output_capacity: usize,
}

impl SchedulerConfig {
    /// Create default configuration writing into the current directory
    pub fn new() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            rr_quantum_ms: 50,
            mlfq_quanta_ms: [10, 20, 40],
            mlfq_boost_ms: 200,
            sjf_poll_interval_ms: 100,
            default_burst_ms: DEFAULT_PREDICTED_BURST_MS,
            exit_sentinel: "exit".to_string(),
            output_capacity: 64 * 1024,
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(raw: &str) -> SchedResult<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> SchedResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SchedError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&raw)
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_rr_quantum(mut self, quantum_ms: Millis) -> Self {
        self.rr_quantum_ms = quantum_ms;
        self
    }

    pub fn with_mlfq(mut self, quanta_ms: [Millis; MLFQ_LEVELS], boost_ms: Millis) -> Self {
        self.mlfq_quanta_ms = quanta_ms;
        self.mlfq_boost_ms = boost_ms;
        self
    }

    pub fn with_poll_interval(mut self, interval_ms: Millis) -> Self {
        self.sjf_poll_interval_ms = interval_ms;
        self
    }

    /// Reject values that would make a policy spin or never preempt
    pub fn validate(&self) -> SchedResult<()> {
        if self.rr_quantum_ms == 0 {
            return Err(SchedError::Config("rr_quantum_ms must be > 0".into()));
        }
        if let Some(level) = self.mlfq_quanta_ms.iter().position(|&q| q == 0) {
            return Err(SchedError::Config(format!(
                "mlfq_quanta_ms[{}] must be > 0",
                level
            )));
        }
        if self.mlfq_boost_ms == 0 {
            return Err(SchedError::Config("mlfq_boost_ms must be > 0".into()));
        }
        if self.sjf_poll_interval_ms == 0 {
            return Err(SchedError::Config(
                "sjf_poll_interval_ms must be > 0".into(),
            ));
        }
        if self.exit_sentinel.is_empty() {
            return Err(SchedError::Config("exit_sentinel must not be empty".into()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.sjf_poll_interval_ms)
    }

    /// Path of the summary file for a policy
    pub fn result_path(&self, policy: super::types::Policy) -> PathBuf {
        self.output_dir.join(policy.result_file())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new()
    }
}
