/*!
 * Scheduling Engine
 * Drives live processes under FCFS, round robin, MLFQ and online SJF
 *
 * A single driver thread owns the workload, the command statistics and the
 * backend. Concurrency comes only from the child processes it controls.
 */

use crate::core::config::SchedulerConfig;
use crate::core::errors::{SchedError, SchedResult};
use crate::core::types::{Millis, Policy, ProcessIndex};
use crate::monitoring::{Dispatch, RunStats, SummaryWriter, Trace};
use crate::process::{Discipline, Process, ProcessControl, Workload};
use std::time::Duration;
use tracing::{info, warn};

mod command_stats;
mod fcfs;
mod mlfq;
mod round_robin;
mod sjf;

pub use command_stats::{CommandStat, CommandStats};
pub use sjf::OnlineRun;

/// How one preemptive turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Turn {
    pub credit: Millis,
    pub finished: bool,
}

/// Scheduling engine over a process-control backend
pub struct Engine<B: ProcessControl> {
    backend: B,
    config: SchedulerConfig,
    trace: Trace,
    command_stats: CommandStats,
}

impl<B: ProcessControl> Engine<B> {
    /// Create an engine tracing to stdout
    pub fn new(backend: B, config: SchedulerConfig) -> Self {
        let command_stats = CommandStats::new(config.default_burst_ms);
        Self {
            backend,
            config,
            trace: Trace::stdout(),
            command_stats,
        }
    }

    pub fn with_trace(mut self, trace: Trace) -> Self {
        self.trace = trace;
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub fn trace_mut(&mut self) -> &mut Trace {
        &mut self.trace
    }

    pub fn command_stats(&self) -> &CommandStats {
        &self.command_stats
    }

    /// Normalize the batch, allocate every output channel up front and open
    /// the summary file. Any failure here aborts the batch before it runs.
    fn prepare_batch(&mut self, workload: &mut Workload, policy: Policy) -> SchedResult<SummaryWriter> {
        workload.reset_for_batch();
        self.backend
            .reserve_channels(workload.len())
            .map_err(|source| SchedError::ChannelSetup {
                count: workload.len(),
                source,
            })?;
        let writer = SummaryWriter::create(self.config.result_path(policy))?;
        info!(%policy, processes = workload.len(), "Starting offline batch");
        Ok(writer)
    }

    fn finish_batch(
        &mut self,
        mut writer: SummaryWriter,
        workload: &Workload,
        stats: &mut RunStats,
    ) -> SchedResult<()> {
        writer.append_all(workload)?;
        stats.errors = workload.iter().filter(|p| p.error).count() as u64;
        info!(
            policy = %stats.policy,
            elapsed_ms = stats.elapsed_ms,
            dispatches = stats.dispatches,
            preemptions = stats.preemptions,
            errors = stats.errors,
            summary = %writer.path().display(),
            "Batch complete"
        );
        Ok(())
    }

    /// Spawn a process' command. Failures are recorded on the process and
    /// yield no handle.
    fn start(&mut self, process: &mut Process, discipline: Discipline) -> Option<B::Handle> {
        match self.backend.spawn(&process.command, discipline) {
            Ok(handle) => {
                process.os_pid = Some(self.backend.os_pid(&handle));
                Some(handle)
            }
            Err(e) => {
                warn!(command = %process.command, error = %e, "Command failed to start");
                process.error = true;
                None
            }
        }
    }

    /// Collect the captured output of an exited child
    fn reap(&mut self, process: &mut Process, handle: &mut B::Handle) {
        let output = self.backend.take_output(handle);
        process.output.push_str(&output);
    }

    /// One preemptive turn: start or resume, run for at most `quantum`, then
    /// pause and check for exit. An exit inside the quantum is credited only
    /// the time since dispatch.
    fn run_turn(
        &mut self,
        workload: &mut Workload,
        handles: &mut [Option<B::Handle>],
        index: ProcessIndex,
        quantum: Millis,
        clock: &mut Millis,
        stats: &mut RunStats,
    ) -> SchedResult<Turn> {
        let switch_in = *clock;
        let process = &mut workload[index];
        let first = process.dispatch(switch_in)?;
        stats.dispatches += 1;
        let dispatched_at = self.backend.now_ms();

        if first {
            handles[index] = self.start(process, Discipline::NonBlocking);
        } else if let Some(handle) = handles[index].as_mut() {
            if let Err(e) = self.backend.resume(handle) {
                warn!(command = %process.command, error = %e, "Resume failed");
            }
        }

        let turn = match handles[index].as_mut() {
            // Never started: finishes with nothing to credit
            None => Turn {
                credit: 0,
                finished: true,
            },
            Some(handle) => {
                let exited = self
                    .backend
                    .wait_exit_timeout(handle, Duration::from_millis(quantum))
                    .unwrap_or_else(|e| {
                        warn!(command = %process.command, error = %e, "Exit wait failed");
                        process.error = true;
                        true
                    });
                let exited = exited || {
                    if let Err(e) = self.backend.pause(handle) {
                        warn!(command = %process.command, error = %e, "Pause failed");
                    }
                    self.backend.poll_exited(handle).unwrap_or_else(|e| {
                        warn!(command = %process.command, error = %e, "Exit check failed");
                        process.error = true;
                        true
                    })
                };
                if exited {
                    let elapsed = self.backend.now_ms().saturating_sub(dispatched_at);
                    Turn {
                        credit: elapsed.min(quantum),
                        finished: true,
                    }
                } else {
                    Turn {
                        credit: quantum,
                        finished: false,
                    }
                }
            }
        };

        *clock += turn.credit;
        if turn.finished {
            if let Some(mut handle) = handles[index].take() {
                self.reap(process, &mut handle);
            }
            process.complete(turn.credit, *clock)?;
        } else {
            process.preempt(turn.credit)?;
            stats.preemptions += 1;
        }
        Ok(turn)
    }

    fn record_dispatch(
        &mut self,
        workload: &Workload,
        index: ProcessIndex,
        switch_in: Millis,
        switch_out: Millis,
        level: Option<usize>,
        finished: bool,
    ) -> SchedResult<()> {
        self.trace.record(Dispatch {
            index,
            command: workload[index].command.clone(),
            switch_in,
            switch_out,
            level,
            finished,
        })
    }
}

fn require_positive(name: &str, value: Millis) -> SchedResult<()> {
    if value == 0 {
        return Err(SchedError::Config(format!("{} must be > 0", name)));
    }
    Ok(())
}
