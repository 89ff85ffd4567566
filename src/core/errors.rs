/*!
 * Error Types
 * Centralized engine error handling with thiserror and miette
 */

use crate::process::types::ProcessError;
use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Engine-level result
///
/// # Must Use
/// An `Err` here aborts the whole run; per-process failures are recorded on
/// the process instead
pub type SchedResult<T> = Result<T, SchedError>;

/// Fatal scheduling engine errors
#[derive(Error, Debug, Diagnostic)]
pub enum SchedError {
    #[error("Failed to allocate output channels for {count} processes: {source}")]
    #[diagnostic(
        code(sched::channel_setup),
        help("The batch is too large for the open file limit. Raise `ulimit -n` or split the workload.")
    )]
    ChannelSetup {
        count: usize,
        #[source]
        source: ProcessError,
    },

    #[error("Failed to write report {path}: {source}")]
    #[diagnostic(
        code(sched::report_io),
        help("Check that the output directory exists and is writable.")
    )]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write trace: {0}")]
    #[diagnostic(code(sched::trace_io))]
    Trace(#[source] std::io::Error),

    #[error("Failed to read workload: {0}")]
    #[diagnostic(code(sched::workload_io))]
    Workload(#[source] std::io::Error),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(sched::config),
        help("Quanta, boost interval and poll interval must all be greater than zero.")
    )]
    Config(String),

    #[error(transparent)]
    #[diagnostic(code(sched::process))]
    Process(#[from] ProcessError),
}

impl SchedError {
    pub fn report(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SchedError::Report {
            path: path.into(),
            source,
        }
    }
}

impl From<toml::de::Error> for SchedError {
    fn from(err: toml::de::Error) -> Self {
        SchedError::Config(err.to_string())
    }
}
