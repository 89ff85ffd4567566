/*!
 * Monitoring
 * Timing metrics, live trace, summaries and diagnostic tracing
 */

pub mod metrics;
pub mod report;
pub mod trace;
mod tracer;

pub use metrics::{RunStats, TimingMetrics};
pub use report::{summary_row, write_json_report, SummaryWriter, SUMMARY_HEADER};
pub use trace::{Dispatch, Trace};
pub use tracer::init_tracing;
