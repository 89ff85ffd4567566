/*!
 * Summary Reports
 * CSV summary per policy and an optional JSON dump of a run
 */

use super::metrics::RunStats;
use crate::core::errors::{SchedError, SchedResult};
use crate::process::types::Process;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const SUMMARY_HEADER: &str =
    "Command,Finished,Error,Burst Time,Turnaround Time,Waiting Time,Response Time";

/// Format one summary row.
///
/// `Finished` is "No" and `Error` is "Yes" exactly when the error flag is set.
/// Consumers depend on this column layout.
pub fn summary_row(process: &Process) -> String {
    let (finished, error) = if process.error {
        ("No", "Yes")
    } else {
        ("Yes", "No")
    };
    format!(
        "{},{},{},{},{},{},{}",
        process.command,
        finished,
        error,
        process.burst_time,
        process.turnaround_time,
        process.waiting_time,
        process.response_time
    )
}

/// CSV summary file, header written on creation
pub struct SummaryWriter {
    path: PathBuf,
    out: BufWriter<File>,
    rows: usize,
}

impl SummaryWriter {
    pub fn create(path: impl AsRef<Path>) -> SchedResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| SchedError::report(&path, e))?;
        let mut writer = Self {
            path,
            out: BufWriter::new(file),
            rows: 0,
        };
        writer.write_line(SUMMARY_HEADER)?;
        writer.flush()?;
        Ok(writer)
    }

    fn write_line(&mut self, line: &str) -> SchedResult<()> {
        writeln!(self.out, "{}", line).map_err(|e| SchedError::report(&self.path, e))
    }

    pub fn append(&mut self, process: &Process) -> SchedResult<()> {
        self.write_line(&summary_row(process))?;
        self.rows += 1;
        Ok(())
    }

    /// Append and flush, for online runs where rows must survive an abrupt exit
    pub fn append_flushed(&mut self, process: &Process) -> SchedResult<()> {
        self.append(process)?;
        self.flush()
    }

    pub fn append_all<'a>(&mut self, processes: impl IntoIterator<Item = &'a Process>) -> SchedResult<()> {
        for process in processes {
            self.append(process)?;
        }
        self.flush()
    }

    pub fn flush(&mut self) -> SchedResult<()> {
        self.out
            .flush()
            .map_err(|e| SchedError::report(&self.path, e))
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    stats: &'a RunStats,
    processes: &'a [Process],
}

/// Write processes and run statistics as pretty JSON
pub fn write_json_report(
    path: impl AsRef<Path>,
    stats: &RunStats,
    processes: &[Process],
) -> SchedResult<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| SchedError::report(path, e))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, &JsonReport { stats, processes })
        .map_err(|e| SchedError::report(path, e.into()))?;
    out.flush().map_err(|e| SchedError::report(path, e))
}
