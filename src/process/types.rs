/*!
 * Process Types
 * The scheduled work item, its lifecycle, and harness errors
 */

use crate::core::types::{Millis, Pid};
use crate::monitoring::metrics::TimingMetrics;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Process operation result
///
/// # Must Use
/// Harness operations can fail and must be handled to avoid leaking children
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Execution harness and lifecycle errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Exec failed: {0}")]
    ExecFailed(String),

    #[error("Failed to send {signal} to OS PID {pid}: {reason}")]
    SignalFailed {
        pid: Pid,
        signal: &'static str,
        reason: String,
    },

    #[error("Wait failed for OS PID {pid}: {reason}")]
    WaitFailed { pid: Pid, reason: String },

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidStateTransition {
        from: ProcessState,
        to: ProcessState,
    },
}

/// Process lifecycle state
///
/// `New -> Ready -> Running -> {Stopped <-> Running}* -> Done`.
/// `Stopped` is only reachable under preemptive policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    /// Parsed from the workload, not yet admitted
    New,
    /// Admitted and waiting for its first dispatch
    Ready,
    /// Live child currently running
    Running,
    /// Live child paused with SIGSTOP between turns
    Stopped,
    /// Exited (or failed to start); metrics are final
    Done,
}

impl ProcessState {
    #[inline]
    pub const fn can_transition_to(self, to: ProcessState) -> bool {
        use ProcessState::*;
        matches!(
            (self, to),
            (New, Ready)
                | (Ready, Running)
                | (Running, Stopped)
                | (Stopped, Running)
                | (Running, Done)
        )
    }
}

/// One scheduled unit of work
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Process {
    pub command: String,
    pub arrival_time: Millis,
    pub start_time: Millis,
    pub completion_time: Millis,
    pub burst_time: Millis,
    pub turnaround_time: Millis,
    pub waiting_time: Millis,
    pub response_time: Millis,
    pub error: bool,
    pub state: ProcessState,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub os_pid: Option<Pid>,
    /// MLFQ level, 0 is the highest priority
    pub current_queue: usize,
    /// Time credited at the current MLFQ level
    pub time_in_queue: Millis,
}

impl Process {
    #[must_use]
    pub fn new(command: impl Into<String>, arrival_time: Millis) -> Self {
        Self {
            command: command.into(),
            arrival_time,
            start_time: 0,
            completion_time: 0,
            burst_time: 0,
            turnaround_time: 0,
            waiting_time: 0,
            response_time: 0,
            error: false,
            state: ProcessState::New,
            output: String::new(),
            os_pid: None,
            current_queue: 0,
            time_in_queue: 0,
        }
    }

    #[inline]
    pub const fn started(&self) -> bool {
        !matches!(self.state, ProcessState::New | ProcessState::Ready)
    }

    #[inline]
    pub const fn completed(&self) -> bool {
        matches!(self.state, ProcessState::Done)
    }

    fn transition(&mut self, to: ProcessState) -> ProcessResult<()> {
        if !self.state.can_transition_to(to) {
            return Err(ProcessError::InvalidStateTransition {
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }

    /// Admit into the ready set
    pub fn admit(&mut self) -> ProcessResult<()> {
        self.transition(ProcessState::Ready)
    }

    /// Clear all run state so a batch can be replayed with every arrival at 0
    pub fn reset_for_batch(&mut self) {
        *self = Process::new(std::mem::take(&mut self.command), 0);
        self.state = ProcessState::Ready;
    }

    /// Switch in at logical time `at`. Returns true on the first dispatch.
    pub fn dispatch(&mut self, at: Millis) -> ProcessResult<bool> {
        let first = self.state == ProcessState::Ready;
        self.transition(ProcessState::Running)?;
        if first {
            self.start_time = at;
        }
        Ok(first)
    }

    /// Switch out a still-live child, crediting `credit` ms of burst
    pub fn preempt(&mut self, credit: Millis) -> ProcessResult<()> {
        self.transition(ProcessState::Stopped)?;
        self.burst_time += credit;
        Ok(())
    }

    /// Final switch out at logical time `at`, crediting the last `credit` ms
    pub fn complete(&mut self, credit: Millis, at: Millis) -> ProcessResult<()> {
        self.transition(ProcessState::Done)?;
        self.burst_time += credit;
        self.completion_time = at;
        let metrics = TimingMetrics::compute(
            self.arrival_time,
            self.start_time,
            self.completion_time,
            self.burst_time,
        );
        self.turnaround_time = metrics.turnaround;
        self.waiting_time = metrics.waiting;
        self.response_time = metrics.response;
        Ok(())
    }

    /// MLFQ demotion, floored at the lowest level
    pub fn demote(&mut self, lowest: usize) {
        if self.current_queue < lowest {
            self.current_queue += 1;
            self.time_in_queue = 0;
        }
    }

    /// MLFQ priority boost back to level 0
    pub fn boost(&mut self) {
        self.current_queue = 0;
        self.time_in_queue = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_happy_path() {
        let mut p = Process::new("echo a", 0);
        assert!(!p.started());
        p.admit().unwrap();
        assert!(p.dispatch(5).unwrap());
        p.preempt(10).unwrap();
        assert!(!p.dispatch(20).unwrap());
        p.complete(3, 23).unwrap();

        assert!(p.completed());
        assert_eq!(p.start_time, 5);
        assert_eq!(p.burst_time, 13);
        assert_eq!(p.turnaround_time, 23);
        assert_eq!(p.waiting_time, 10);
        assert_eq!(p.response_time, 5);
    }

    #[test]
    fn test_invalid_transition() {
        let mut p = Process::new("echo a", 0);
        let err = p.dispatch(0).unwrap_err();
        assert_eq!(
            err,
            ProcessError::InvalidStateTransition {
                from: ProcessState::New,
                to: ProcessState::Running,
            }
        );
    }

    #[test]
    fn test_done_is_terminal() {
        let mut p = Process::new("true", 0);
        p.admit().unwrap();
        p.dispatch(0).unwrap();
        p.complete(1, 1).unwrap();
        assert!(p.dispatch(2).is_err());
        assert!(p.preempt(1).is_err());
    }

    #[test]
    fn test_demote_floors_at_lowest_level() {
        let mut p = Process::new("yes", 0);
        p.time_in_queue = 7;
        p.demote(2);
        p.demote(2);
        p.demote(2);
        assert_eq!(p.current_queue, 2);
        p.boost();
        assert_eq!(p.current_queue, 0);
        assert_eq!(p.time_in_queue, 0);
    }

    #[test]
    fn test_reset_for_batch_keeps_command() {
        let mut p = Process::new("ls -l", 40);
        p.error = true;
        p.burst_time = 9;
        p.reset_for_batch();
        assert_eq!(p.command, "ls -l");
        assert_eq!(p.arrival_time, 0);
        assert_eq!(p.burst_time, 0);
        assert!(!p.error);
        assert_eq!(p.state, ProcessState::Ready);
    }
}
