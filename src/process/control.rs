/*!
 * Process Control Capability
 *
 * What a scheduling policy may do to a live child: start it, pause and
 * resume it, check whether it exited, and wait for it. Policies only talk to
 * this trait, so the same scheduler logic runs against real OS processes
 * (`OsExecutor`) or against simulated time (`SimulatedExecutor`).
 */

use super::types::ProcessResult;
use crate::core::types::{Millis, Pid};
use std::time::Duration;

/// How the harness treats the output channel of a spawned child
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discipline {
    /// Output channel is non-blocking and drained opportunistically
    /// (offline FCFS/RR/MLFQ)
    NonBlocking,
    /// Output is read to end of stream before reaping (online SJF)
    Blocking,
}

pub trait ProcessControl {
    /// Live child handle
    type Handle;

    /// Monotonic time since the backend was created
    fn now_ms(&self) -> Millis;

    fn sleep(&mut self, duration: Duration);

    /// Allocate output channels for a whole batch before anything runs.
    /// Failure here aborts the batch.
    fn reserve_channels(&mut self, _count: usize) -> ProcessResult<()> {
        Ok(())
    }

    /// Start `command`, split on single spaces with no quoting.
    ///
    /// `Err(ExecFailed)` means the program could not be started,
    /// `Err(SpawnFailed)` means channel or process creation failed.
    fn spawn(&mut self, command: &str, discipline: Discipline) -> ProcessResult<Self::Handle>;

    fn os_pid(&self, handle: &Self::Handle) -> Pid;

    /// SIGSTOP
    fn pause(&mut self, handle: &mut Self::Handle) -> ProcessResult<()>;

    /// SIGCONT
    fn resume(&mut self, handle: &mut Self::Handle) -> ProcessResult<()>;

    /// Non-blocking exit check
    fn poll_exited(&mut self, handle: &mut Self::Handle) -> ProcessResult<bool>;

    /// Let the child run until it exits or `timeout` elapses.
    /// Returns true if it exited.
    fn wait_exit_timeout(
        &mut self,
        handle: &mut Self::Handle,
        timeout: Duration,
    ) -> ProcessResult<bool>;

    /// Block until the child exits
    fn wait(&mut self, handle: &mut Self::Handle) -> ProcessResult<()>;

    /// Captured stdout/stderr so far
    fn take_output(&mut self, handle: &mut Self::Handle) -> String;
}

/// Split a command line on literal spaces. Runs of spaces produce no empty
/// arguments; there is no quoting or escaping.
pub fn split_command(command: &str) -> Vec<&str> {
    command.split(' ').filter(|arg| !arg.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_on_spaces() {
        assert_eq!(split_command("ls -l /tmp"), vec!["ls", "-l", "/tmp"]);
    }

    #[test]
    fn test_split_no_quoting() {
        assert_eq!(
            split_command("echo \"a b\""),
            vec!["echo", "\"a", "b\""]
        );
    }

    #[test]
    fn test_split_collapses_runs() {
        assert_eq!(split_command("  sleep   1 "), vec!["sleep", "1"]);
        assert!(split_command("   ").is_empty());
    }
}
