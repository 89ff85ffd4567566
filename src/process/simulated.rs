/*!
 * Simulated Executor
 *
 * A purely simulated-time backend. Commands have scripted runtimes, the
 * clock only moves when a policy sleeps or waits, and every control call is
 * journaled so tests can assert on the exact pause/resume sequence.
 */

use super::control::{split_command, Discipline, ProcessControl};
use super::types::{ProcessError, ProcessResult};
use crate::core::types::{Millis, Pid};
use std::collections::HashMap;
use std::time::Duration;

/// Control call recorded by the simulated backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    Spawn(Pid),
    Pause(Pid),
    Resume(Pid),
    Exit(Pid),
}

#[derive(Debug)]
pub struct SimHandle {
    pid: Pid,
    command: String,
    remaining: Millis,
    paused: bool,
    exited: bool,
}

impl SimHandle {
    pub fn remaining(&self) -> Millis {
        self.remaining
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

/// Simulated-time process backend
#[derive(Debug)]
pub struct SimulatedExecutor {
    now: Millis,
    next_pid: Pid,
    runtimes: HashMap<String, Millis>,
    default_runtime: Millis,
    missing: Vec<String>,
    spawn_failures: Vec<String>,
    channel_limit: Option<usize>,
    events: Vec<ControlEvent>,
}

impl SimulatedExecutor {
    pub fn new() -> Self {
        Self {
            now: 0,
            next_pid: 1000,
            runtimes: HashMap::new(),
            default_runtime: 10,
            missing: Vec::new(),
            spawn_failures: Vec::new(),
            channel_limit: None,
            events: Vec::new(),
        }
    }

    /// Runtime of an exact command text
    pub fn with_runtime(mut self, command: impl Into<String>, runtime_ms: Millis) -> Self {
        self.runtimes.insert(command.into(), runtime_ms);
        self
    }

    /// Runtime of any command not registered with `with_runtime`
    pub fn with_default_runtime(mut self, runtime_ms: Millis) -> Self {
        self.default_runtime = runtime_ms;
        self
    }

    /// Program that fails to exec, like a missing binary
    pub fn with_missing(mut self, program: impl Into<String>) -> Self {
        self.missing.push(program.into());
        self
    }

    /// Command whose spawn fails before exec
    pub fn with_spawn_failure(mut self, command: impl Into<String>) -> Self {
        self.spawn_failures.push(command.into());
        self
    }

    /// Maximum channels `reserve_channels` can allocate
    pub fn with_channel_limit(mut self, limit: usize) -> Self {
        self.channel_limit = Some(limit);
        self
    }

    pub fn events(&self) -> &[ControlEvent] {
        &self.events
    }

    fn run(&mut self, handle: &mut SimHandle, budget: Millis) -> bool {
        let ran = handle.remaining.min(budget);
        self.now += ran;
        handle.remaining -= ran;
        if handle.remaining == 0 && !handle.exited {
            handle.exited = true;
            self.events.push(ControlEvent::Exit(handle.pid));
        }
        handle.exited
    }
}

impl Default for SimulatedExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessControl for SimulatedExecutor {
    type Handle = SimHandle;

    fn now_ms(&self) -> Millis {
        self.now
    }

    fn sleep(&mut self, duration: Duration) {
        self.now += duration.as_millis() as Millis;
    }

    fn reserve_channels(&mut self, count: usize) -> ProcessResult<()> {
        match self.channel_limit {
            Some(limit) if count > limit => Err(ProcessError::SpawnFailed(format!(
                "pipe: only {} channels available",
                limit
            ))),
            _ => Ok(()),
        }
    }

    fn spawn(&mut self, command: &str, _discipline: Discipline) -> ProcessResult<SimHandle> {
        let program = split_command(command)
            .first()
            .map(|p| p.to_string())
            .ok_or_else(|| ProcessError::ExecFailed("empty command".to_string()))?;
        if self.spawn_failures.iter().any(|c| c == command) {
            return Err(ProcessError::SpawnFailed(format!("{}: fork failed", command)));
        }
        if self.missing.contains(&program) {
            return Err(ProcessError::ExecFailed(format!(
                "{}: No such file or directory",
                program
            )));
        }

        let pid = self.next_pid;
        self.next_pid += 1;
        self.events.push(ControlEvent::Spawn(pid));

        let remaining = self
            .runtimes
            .get(command)
            .copied()
            .unwrap_or(self.default_runtime);
        Ok(SimHandle {
            pid,
            command: command.to_string(),
            remaining,
            paused: false,
            exited: remaining == 0,
        })
    }

    fn os_pid(&self, handle: &SimHandle) -> Pid {
        handle.pid
    }

    fn pause(&mut self, handle: &mut SimHandle) -> ProcessResult<()> {
        handle.paused = true;
        self.events.push(ControlEvent::Pause(handle.pid));
        Ok(())
    }

    fn resume(&mut self, handle: &mut SimHandle) -> ProcessResult<()> {
        handle.paused = false;
        self.events.push(ControlEvent::Resume(handle.pid));
        Ok(())
    }

    fn poll_exited(&mut self, handle: &mut SimHandle) -> ProcessResult<bool> {
        Ok(handle.exited)
    }

    fn wait_exit_timeout(&mut self, handle: &mut SimHandle, timeout: Duration) -> ProcessResult<bool> {
        if handle.paused {
            self.now += timeout.as_millis() as Millis;
            return Ok(handle.exited);
        }
        Ok(self.run(handle, timeout.as_millis() as Millis))
    }

    fn wait(&mut self, handle: &mut SimHandle) -> ProcessResult<()> {
        handle.paused = false;
        self.run(handle, Millis::MAX);
        Ok(())
    }

    fn take_output(&mut self, handle: &mut SimHandle) -> String {
        if handle.exited {
            format!("simulated: {}\n", handle.command)
        } else {
            String::new()
        }
    }
}
