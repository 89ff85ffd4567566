/*!
 * Scheduler Tests
 * Policy behavior against the simulated-time backend
 */

use pretty_assertions::assert_eq;
use proc_sched::monitoring::SUMMARY_HEADER;
use proc_sched::{
    Engine, Policy, ProcessState, SchedError, SchedulerConfig, ScriptedArrivals,
    SimulatedExecutor, Trace, Workload,
};
use proptest::prelude::*;
use std::path::Path;

fn engine(sim: SimulatedExecutor, dir: &Path) -> Engine<SimulatedExecutor> {
    Engine::new(sim, SchedulerConfig::new().with_output_dir(dir)).with_trace(Trace::sink())
}

fn summary(dir: &Path, policy: Policy) -> Vec<String> {
    std::fs::read_to_string(dir.join(policy.result_file()))
        .unwrap()
        .lines()
        .map(String::from)
        .collect()
}

fn assert_invariants(workload: &Workload) {
    for p in workload.iter() {
        assert_eq!(p.state, ProcessState::Done, "{} not done", p.command);
        assert!(p.start_time >= p.arrival_time);
        assert!(p.completion_time >= p.start_time);
        assert_eq!(p.turnaround_time, p.waiting_time + p.burst_time);
    }
}

#[test]
fn test_fcfs_summary_rows() {
    let dir = tempfile::tempdir().unwrap();
    let sim = SimulatedExecutor::new()
        .with_runtime("echo a", 3)
        .with_runtime("echo b", 4);
    let mut engine = engine(sim, dir.path());
    let mut workload = Workload::from_commands(["echo a", "echo b"]);

    engine.fcfs(&mut workload).unwrap();

    assert_eq!(
        summary(dir.path(), Policy::Fcfs),
        vec![
            SUMMARY_HEADER.to_string(),
            "echo a,Yes,No,3,3,0,0".to_string(),
            "echo b,Yes,No,4,7,3,3".to_string(),
        ]
    );
    assert!(workload[0].completion_time <= workload[1].start_time);
}

#[test]
fn test_exec_failure_row_in_every_offline_policy() {
    for policy in [Policy::Fcfs, Policy::RoundRobin, Policy::Mlfq] {
        let dir = tempfile::tempdir().unwrap();
        let sim = SimulatedExecutor::new()
            .with_default_runtime(30)
            .with_missing("missing-binary");
        let mut engine = engine(sim, dir.path());
        let mut workload = Workload::from_commands(["a", "missing-binary --x", "b"]);

        let stats = match policy {
            Policy::Fcfs => engine.fcfs(&mut workload),
            Policy::RoundRobin => engine.round_robin(&mut workload, 10),
            _ => engine.mlfq(&mut workload, 5, 10, 20, 100),
        }
        .unwrap();

        let rows = summary(dir.path(), policy);
        assert_eq!(rows.len(), 4);
        assert!(rows[2].starts_with("missing-binary --x,No,Yes,"), "{}", rows[2]);
        assert!(rows[1].starts_with("a,Yes,No,30,"), "{}", rows[1]);
        assert!(rows[3].starts_with("b,Yes,No,30,"), "{}", rows[3]);
        assert_eq!(stats.errors, 1);
        assert_invariants(&workload);
    }
}

#[test]
fn test_spawn_failure_is_recorded_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let sim = SimulatedExecutor::new().with_spawn_failure("b");
    let mut engine = engine(sim, dir.path());
    let mut workload = Workload::from_commands(["a", "b"]);

    engine.round_robin(&mut workload, 10).unwrap();
    assert!(workload[1].error);
    assert!(!workload[0].error);
}

#[test]
fn test_channel_setup_failure_aborts_batch() {
    let dir = tempfile::tempdir().unwrap();
    let sim = SimulatedExecutor::new().with_channel_limit(1);
    let mut engine = engine(sim, dir.path());
    let mut workload = Workload::from_commands(["a", "b"]);

    let err = engine.fcfs(&mut workload).unwrap_err();
    assert!(matches!(err, SchedError::ChannelSetup { count: 2, .. }));
    assert!(engine.backend().events().is_empty());
    assert!(!dir.path().join(Policy::Fcfs.result_file()).exists());
}

#[test]
fn test_unwritable_output_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist");
    let mut engine = engine(SimulatedExecutor::new(), &missing);
    let mut workload = Workload::from_commands(["a"]);

    assert!(matches!(
        engine.mlfq(&mut workload, 1, 2, 3, 10),
        Err(SchedError::Report { .. })
    ));
}

#[test]
fn test_batch_can_be_rerun_under_another_policy() {
    let dir = tempfile::tempdir().unwrap();
    let sim = SimulatedExecutor::new().with_default_runtime(25);
    let mut engine = engine(sim, dir.path());
    let mut workload = Workload::from_commands(["a", "b"]);

    engine.fcfs(&mut workload).unwrap();
    engine.trace_mut().clear();
    engine.round_robin(&mut workload, 10).unwrap();

    assert_invariants(&workload);
    assert_eq!(engine.trace().dispatches().len(), 6);
    assert!(dir.path().join(Policy::Fcfs.result_file()).exists());
    assert!(dir.path().join(Policy::RoundRobin.result_file()).exists());
}

#[test]
fn test_online_sjf_summary_is_flushed_per_row() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = engine(SimulatedExecutor::new(), dir.path());
    let mut source = ScriptedArrivals::new(vec![vec!["echo x", "echo y", "exit"]]);

    let run = engine.shortest_job_first(&mut source).unwrap();

    let rows = summary(dir.path(), Policy::ShortestJobFirst);
    assert_eq!(rows.len(), 3);
    assert!(rows[1].starts_with("echo x,Yes,No,"));
    assert!(rows[2].starts_with("echo y,Yes,No,"));
    assert_invariants(&run.workload);
}

#[test]
fn test_online_late_arrival_waits_for_running_job() {
    let dir = tempfile::tempdir().unwrap();
    let sim = SimulatedExecutor::new()
        .with_runtime("long", 300)
        .with_runtime("short", 1);
    let config = SchedulerConfig::new()
        .with_output_dir(dir.path())
        .with_poll_interval(10);
    let mut engine = Engine::new(sim, config).with_trace(Trace::sink());
    let mut source = ScriptedArrivals::new(vec![vec!["long"], vec!["short"], vec!["exit"]]);

    let run = engine.shortest_job_first(&mut source).unwrap();

    // Non-preemptive: short arrives after long was dispatched
    let short = &run.workload[1];
    assert_eq!(short.arrival_time, 310);
    assert_eq!(short.start_time, 310);
    assert_eq!(run.workload[0].burst_time, 300);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_offline_invariants(
        runtimes in prop::collection::vec(1u64..400, 1..8),
        quantum in 1u64..80,
        boost in 1u64..500,
    ) {
        let commands: Vec<String> = (0..runtimes.len()).map(|i| format!("job{}", i)).collect();
        for policy in [Policy::Fcfs, Policy::RoundRobin, Policy::Mlfq] {
            let dir = tempfile::tempdir().unwrap();
            let mut sim = SimulatedExecutor::new();
            for (command, runtime) in commands.iter().zip(&runtimes) {
                sim = sim.with_runtime(command.clone(), *runtime);
            }
            let mut engine = engine(sim, dir.path());
            let mut workload = Workload::from_commands(commands.clone());

            let stats = match policy {
                Policy::Fcfs => engine.fcfs(&mut workload),
                Policy::RoundRobin => engine.round_robin(&mut workload, quantum),
                _ => engine.mlfq(&mut workload, quantum, quantum * 2, quantum * 4, boost),
            }
            .unwrap();

            let total: u64 = runtimes.iter().sum();
            prop_assert_eq!(stats.elapsed_ms, total);
            for (p, runtime) in workload.iter().zip(&runtimes) {
                prop_assert_eq!(p.burst_time, *runtime);
                prop_assert!(p.completion_time >= p.start_time);
                prop_assert_eq!(p.turnaround_time, p.waiting_time + p.burst_time);
            }
            for d in engine.trace().dispatches() {
                if policy == Policy::RoundRobin {
                    prop_assert!(d.switch_out - d.switch_in <= quantum);
                }
            }
        }
    }
}
