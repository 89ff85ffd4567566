/*!
 * Online Shortest-Job-First
 *
 * Commands stream in one per line. At every decision point the admitted
 * process with the smallest predicted burst runs to completion; ties go to
 * the earliest arrival. Each measured run feeds back into the command
 * statistics store.
 */

use super::Engine;
use crate::core::errors::SchedResult;
use crate::core::types::{Millis, Policy, ProcessIndex};
use crate::monitoring::{RunStats, SummaryWriter};
use crate::process::{ArrivalSource, Discipline, ProcessControl, Workload};
use tracing::{debug, info, warn};

/// Result of an online run
#[derive(Debug)]
pub struct OnlineRun {
    pub workload: Workload,
    pub stats: RunStats,
}

impl<B: ProcessControl> Engine<B> {
    /// Run until the sentinel line (or end of input) has been seen and every
    /// admitted command has completed. Rows are appended and flushed to the
    /// summary as each command finishes.
    pub fn shortest_job_first(&mut self, source: &mut impl ArrivalSource) -> SchedResult<OnlineRun> {
        let mut writer = SummaryWriter::create(self.config.result_path(Policy::ShortestJobFirst))?;
        let mut workload = Workload::new();
        let mut stats = RunStats::new(Policy::ShortestJobFirst);
        let epoch = self.backend.now_ms();
        let mut closing = false;

        info!("Online SJF waiting for commands");
        loop {
            if !closing {
                closing = self.admit_arrivals(source, &mut workload, epoch)?;
            }

            if let Some(index) = self.pick_shortest(&workload) {
                self.run_to_completion(&mut workload, index, epoch, &mut stats)?;
                writer.append_flushed(&workload[index])?;
            }

            if closing && workload.all_completed() {
                break;
            }
            self.backend.sleep(self.config.poll_interval());
        }

        stats.elapsed_ms = self.backend.now_ms() - epoch;
        stats.errors = workload.iter().filter(|p| p.error).count() as u64;
        info!(
            completed = writer.rows(),
            errors = stats.errors,
            summary = %writer.path().display(),
            "Online SJF stopped"
        );
        Ok(OnlineRun { workload, stats })
    }

    /// Admit every line that arrived since the last poll. Returns true once
    /// the sentinel or end of input is seen; later lines are ignored.
    fn admit_arrivals(
        &mut self,
        source: &mut impl ArrivalSource,
        workload: &mut Workload,
        epoch: Millis,
    ) -> SchedResult<bool> {
        let polled = source.poll();
        for line in polled.lines {
            if line == self.config.exit_sentinel {
                debug!("Exit sentinel received");
                return Ok(true);
            }
            if line.trim().is_empty() {
                continue;
            }
            let arrival = self.backend.now_ms() - epoch;
            let index = workload.admit(line.as_str(), arrival)?;
            self.command_stats.observe(&line, index);
            debug!(command = %line, index, arrival, "Admitted");
        }
        Ok(polled.closed)
    }

    /// Lowest predicted burst among admitted, unfinished processes;
    /// the first index wins ties
    pub(crate) fn pick_shortest(&self, workload: &Workload) -> Option<ProcessIndex> {
        workload
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.started())
            .map(|(i, p)| (self.command_stats.predict(&p.command), i))
            .min()
            .map(|(_, i)| i)
    }

    fn run_to_completion(
        &mut self,
        workload: &mut Workload,
        index: ProcessIndex,
        epoch: Millis,
        stats: &mut RunStats,
    ) -> SchedResult<()> {
        let start = self.backend.now_ms() - epoch;
        let process = &mut workload[index];
        process.dispatch(start)?;
        stats.dispatches += 1;

        if let Some(mut handle) = self.start(process, Discipline::Blocking) {
            if let Err(e) = self.backend.wait(&mut handle) {
                warn!(command = %process.command, error = %e, "Wait failed");
                process.error = true;
            }
            self.reap(process, &mut handle);
        }

        let end = self.backend.now_ms() - epoch;
        let burst = end - start;
        process.complete(burst, end)?;
        self.command_stats.record(&process.command, index, burst);
        self.record_dispatch(workload, index, start, end, None, true)
    }
}
