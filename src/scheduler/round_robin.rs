/*!
 * Round Robin
 * Preemptive with a fixed quantum, emulated by pausing live children
 */

use super::{require_positive, Engine};
use crate::core::errors::SchedResult;
use crate::core::types::{Millis, Policy};
use crate::monitoring::RunStats;
use crate::process::{ProcessControl, Workload};

impl<B: ProcessControl> Engine<B> {
    /// Visit unfinished processes in array order, one quantum each, until
    /// every process is done
    pub fn round_robin(&mut self, workload: &mut Workload, quantum_ms: Millis) -> SchedResult<RunStats> {
        require_positive("quantum", quantum_ms)?;
        let writer = self.prepare_batch(workload, Policy::RoundRobin)?;
        let mut stats = RunStats::new(Policy::RoundRobin);
        let mut handles: Vec<Option<B::Handle>> = (0..workload.len()).map(|_| None).collect();
        let mut clock = 0;

        while !workload.all_completed() {
            for index in 0..workload.len() {
                if workload[index].completed() {
                    continue;
                }
                let switch_in = clock;
                let turn = self.run_turn(workload, &mut handles, index, quantum_ms, &mut clock, &mut stats)?;
                self.record_dispatch(workload, index, switch_in, clock, None, turn.finished)?;
            }
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
    use crate::process::{ControlEvent, SimulatedExecutor, Workload};
    use crate::scheduler::Engine;
    use pretty_assertions::assert_eq;

    fn engine(sim: SimulatedExecutor, dir: &std::path::Path) -> Engine<SimulatedExecutor> {
        Engine::new(sim, SchedulerConfig::new().with_output_dir(dir)).with_trace(Trace::sink())
    }

    #[test]
    fn test_partial_final_quantum() {
        let dir = tempfile::tempdir().unwrap();
        let sim = SimulatedExecutor::new().with_runtime("job", 120);
        let mut engine = engine(sim, dir.path());
        let mut workload = Workload::from_commands(["job"]);

        let stats = engine.round_robin(&mut workload, 50).unwrap();

        let lines: Vec<String> = engine.trace().dispatches().iter().map(|d| d.line()).collect();
        assert_eq!(lines, vec!["job|0|50", "job|50|100", "job|100|120"]);
        assert_eq!(workload[0].burst_time, 120);
        assert_eq!(stats.preemptions, 2);
    }

    #[test]
    fn test_interleaving_and_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let sim = SimulatedExecutor::new()
            .with_runtime("a", 25)
            .with_runtime("b", 10);
        let mut engine = engine(sim, dir.path());
        let mut workload = Workload::from_commands(["a", "b"]);

        engine.round_robin(&mut workload, 20).unwrap();

        let lines: Vec<String> = engine.trace().dispatches().iter().map(|d| d.line()).collect();
        assert_eq!(lines, vec!["a|0|20", "b|20|30", "a|30|35"]);

        let a = &workload[0];
        assert_eq!((a.start_time, a.completion_time, a.burst_time), (0, 35, 25));
        assert_eq!(a.waiting_time, 10);
        let b = &workload[1];
        assert_eq!((b.response_time, b.turnaround_time, b.waiting_time), (20, 30, 20));
    }

    #[test]
    fn test_pause_resume_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let sim = SimulatedExecutor::new().with_runtime("job", 15);
        let mut engine = engine(sim, dir.path());
        let mut workload = Workload::from_commands(["job"]);

        engine.round_robin(&mut workload, 10).unwrap();

        assert_eq!(
            engine.backend().events(),
            &[
                ControlEvent::Spawn(1000),
                ControlEvent::Pause(1000),
                ControlEvent::Resume(1000),
                ControlEvent::Exit(1000),
            ]
        );
    }

    #[test]
    fn test_zero_quantum_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine(SimulatedExecutor::new(), dir.path());
        let mut workload = Workload::from_commands(["a"]);
        assert!(engine.round_robin(&mut workload, 0).is_err());
    }
}
