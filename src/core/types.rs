/*!
 * Core Types
 * Common types used across the engine
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// OS-level process ID
pub type Pid = u32;

/// Logical or wall-clock time in milliseconds
pub type Millis = u64;

/// Index of a process inside its workload
pub type ProcessIndex = usize;

/// Number of MLFQ priority levels
pub const MLFQ_LEVELS: usize = 3;

/// Predicted burst for a command that has never completed
pub const DEFAULT_PREDICTED_BURST_MS: Millis = 1000;

/// Scheduling policy driving a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// First-come first-served, run to completion in submission order
    Fcfs,
    /// Round robin with a fixed quantum
    RoundRobin,
    /// Multi-level feedback queue with periodic priority boost
    Mlfq,
    /// Online shortest-job-first over a live arrival stream
    ShortestJobFirst,
}

impl Policy {
    /// File name of the CSV summary written by this policy
    pub const fn result_file(&self) -> &'static str {
        match self {
            Policy::Fcfs => "result_offline_FCFS.csv",
            Policy::RoundRobin => "result_offline_RR.csv",
            Policy::Mlfq => "result_offline_MLFQ.csv",
            Policy::ShortestJobFirst => "result_online_SJF.csv",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Policy::Fcfs => "FCFS",
            Policy::RoundRobin => "RR",
            Policy::Mlfq => "MLFQ",
            Policy::ShortestJobFirst => "SJF",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_file_names() {
        assert_eq!(Policy::Fcfs.result_file(), "result_offline_FCFS.csv");
        assert_eq!(Policy::RoundRobin.result_file(), "result_offline_RR.csv");
        assert_eq!(Policy::Mlfq.result_file(), "result_offline_MLFQ.csv");
        assert_eq!(
            Policy::ShortestJobFirst.result_file(),
            "result_online_SJF.csv"
        );
    }
}
