/*!
 * Multi-Level Feedback Queue
 *
 * Three levels with their own quanta. A process that uses its whole quantum
 * drops one level; every `boost_ms` of logical time all unfinished processes
 * go back to level 0.
 */

use super::{require_positive, Engine};
use crate::core::errors::SchedResult;
use crate::core::types::{Millis, Policy, MLFQ_LEVELS};
use crate::monitoring::RunStats;
use crate::process::{ProcessControl, Workload};
use tracing::debug;

const LOWEST_LEVEL: usize = MLFQ_LEVELS - 1;

impl<B: ProcessControl> Engine<B> {
    /// Each round visits every unfinished process in array order, giving it
    /// the quantum of its current level. The boost check runs at the top of
    /// every round and again after every turn.
    pub fn mlfq(
        &mut self,
        workload: &mut Workload,
        quantum0: Millis,
        quantum1: Millis,
        quantum2: Millis,
        boost_ms: Millis,
    ) -> SchedResult<RunStats> {
        let quanta = [quantum0, quantum1, quantum2];
        for (level, &quantum) in quanta.iter().enumerate() {
            require_positive(&format!("quantum{}", level), quantum)?;
        }
        require_positive("boost interval", boost_ms)?;

        let writer = self.prepare_batch(workload, Policy::Mlfq)?;
        let mut stats = RunStats::new(Policy::Mlfq);
        let mut handles: Vec<Option<B::Handle>> = (0..workload.len()).map(|_| None).collect();
        let mut clock = 0;
        let mut last_boost = 0;

        while !workload.all_completed() {
            boost_if_due(workload, clock, &mut last_boost, boost_ms, &mut stats);

            for index in 0..workload.len() {
                if workload[index].completed() {
                    continue;
                }
                let switch_in = clock;
                let level = workload[index].current_queue;
                let turn = self.run_turn(workload, &mut handles, index, quanta[level], &mut clock, &mut stats)?;
                if !turn.finished {
                    let process = &mut workload[index];
                    process.time_in_queue += turn.credit;
                    process.demote(LOWEST_LEVEL);
                }
                self.record_dispatch(workload, index, switch_in, clock, Some(level), turn.finished)?;

                boost_if_due(workload, clock, &mut last_boost, boost_ms, &mut stats);
            }
        }

        stats.elapsed_ms = clock;
        self.finish_batch(writer, workload, &mut stats)?;
        Ok(stats)
    }
}

fn boost_if_due(
    workload: &mut Workload,
    clock: Millis,
    last_boost: &mut Millis,
    boost_ms: Millis,
    stats: &mut RunStats,
) {
    if clock - *last_boost < boost_ms {
        return;
    }
    for process in workload.processes_mut().iter_mut().filter(|p| !p.completed()) {
        process.boost();
    }
    *last_boost = clock;
    stats.boosts.push(clock);
    debug!(at = clock, "MLFQ priority boost");
}
