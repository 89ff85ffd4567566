/*!
 * First-Come First-Served
 * Non-preemptive, strictly in submission order
 */

use super::Engine;
use crate::core::errors::SchedResult;
use crate::core::types::Policy;
use crate::monitoring::RunStats;
use crate::process::{Discipline, ProcessControl, Workload};
use tracing::warn;

impl<B: ProcessControl> Engine<B> {
    /// Run every process to completion in array order.
    ///
    /// Burst is the measured wall-clock duration of the real execution and
    /// the logical clock is the running sum of those bursts.
    pub fn fcfs(&mut self, workload: &mut Workload) -> SchedResult<RunStats> {
        let writer = self.prepare_batch(workload, Policy::Fcfs)?;
        let mut stats = RunStats::new(Policy::Fcfs);
        let mut clock = 0;

        for index in 0..workload.len() {
            let switch_in = clock;
            let exec_start = self.backend.now_ms();
            let process = &mut workload[index];
            process.dispatch(switch_in)?;
            stats.dispatches += 1;

            if let Some(mut handle) = self.start(process, Discipline::NonBlocking) {
                if let Err(e) = self.backend.wait(&mut handle) {
                    warn!(command = %process.command, error = %e, "Wait failed");
                    process.error = true;
                }
                self.reap(process, &mut handle);
            }

            let burst = self.backend.now_ms().saturating_sub(exec_start);
            clock += burst;
            process.complete(burst, clock)?;
            self.record_dispatch(workload, index, switch_in, clock, None, true)?;
        }

        stats.elapsed_ms = clock;
        self.finish_batch(writer, workload, &mut stats)?;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use crate::core::config::SchedulerConfig;
    use crate::monitoring::Trace;
    use crate::process::{SimulatedExecutor, Workload};
    use crate::scheduler::Engine;

    fn engine(sim: SimulatedExecutor, dir: &std::path::Path) -> Engine<SimulatedExecutor> {
        Engine::new(sim, SchedulerConfig::new().with_output_dir(dir)).with_trace(Trace::sink())
    }

    #[test]
    fn test_fcfs_runs_in_order_without_overlap() {
        let dir = tempfile::tempdir().unwrap();
        let sim = SimulatedExecutor::new()
            .with_runtime("a", 30)
            .with_runtime("b", 10)
            .with_runtime("c", 20);
        let mut engine = engine(sim, dir.path());
        let mut workload = Workload::from_commands(["a", "b", "c"]);

        let stats = engine.fcfs(&mut workload).unwrap();

        let bursts: Vec<u64> = workload.iter().map(|p| p.burst_time).collect();
        assert_eq!(bursts, vec![30, 10, 20]);
        assert_eq!(stats.elapsed_ms, bursts.iter().sum::<u64>());
        assert_eq!(workload[1].start_time, workload[0].completion_time);
        assert_eq!(workload[2].waiting_time, 40);
        assert_eq!(engine.trace().dispatches().len(), 3);
    }

    #[test]
    fn test_fcfs_exec_failure_continues() {
        let dir = tempfile::tempdir().unwrap();
        let sim = SimulatedExecutor::new()
            .with_default_runtime(5)
            .with_missing("ghost");
        let mut engine = engine(sim, dir.path());
        let mut workload = Workload::from_commands(["a", "ghost x", "b"]);

        let stats = engine.fcfs(&mut workload).unwrap();

        assert!(workload[1].error);
        assert_eq!(workload[1].burst_time, 0);
        assert!(!workload[0].error && !workload[2].error);
        assert!(workload.all_completed());
        assert_eq!(stats.errors, 1);
    }
}
