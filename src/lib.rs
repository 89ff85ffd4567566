/*!
 * Process Scheduling Engine Library
 * Runs real commands under FCFS, RR, MLFQ and online SJF and reports timing
 */

pub mod core;
pub mod monitoring;
pub mod process;
pub mod scheduler;

// Re-exports
pub use crate::core::{Millis, Policy, SchedError, SchedResult, SchedulerConfig};
pub use monitoring::{init_tracing, Dispatch, RunStats, Trace};
#[cfg(unix)]
pub use process::OsExecutor;
pub use process::{
    ArrivalSource, Process, ProcessControl, ProcessError, ProcessState, ReaderArrivals,
    ScriptedArrivals, SimulatedExecutor, Workload,
};
pub use scheduler::{CommandStats, Engine, OnlineRun};
