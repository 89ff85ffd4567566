/*!
 * Process Module
 * Process records, workloads, and the execution harness
 */

pub mod arrivals;
pub mod control;
#[cfg(unix)]
pub mod executor;
pub mod simulated;
pub mod types;
pub mod workload;

// Re-export for convenience
pub use arrivals::{ArrivalSource, Polled, ReaderArrivals, ScriptedArrivals};
pub use control::{split_command, Discipline, ProcessControl};
#[cfg(unix)]
pub use executor::{OsExecutor, OsHandle, OutputChannel};
pub use simulated::{ControlEvent, SimHandle, SimulatedExecutor};
pub use types::{Process, ProcessError, ProcessResult, ProcessState};
pub use workload::Workload;
