/*!
 * Context-Switch Trace
 *
 * Emits `<command>|<switch_in>|<switch_out>` for every dispatch boundary and
 * keeps the same records in memory for reporting and tests.
 */

use crate::core::errors::{SchedError, SchedResult};
use crate::core::types::{Millis, ProcessIndex};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// One switch-in/switch-out interval of a process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispatch {
    pub index: ProcessIndex,
    pub command: String,
    pub switch_in: Millis,
    pub switch_out: Millis,
    /// MLFQ level the turn ran at
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub level: Option<usize>,
    /// True when this interval ended with the process exiting
    pub finished: bool,
}

impl Dispatch {
    pub fn line(&self) -> String {
        format!("{}|{}|{}", self.command, self.switch_in, self.switch_out)
    }
}

/// Live trace sink
pub struct Trace {
    out: Box<dyn Write>,
    dispatches: Vec<Dispatch>,
}

impl Trace {
    pub fn new(out: Box<dyn Write>) -> Self {
        Self {
            out,
            dispatches: Vec::new(),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Records only, nothing written
    pub fn sink() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Write and flush one trace line
    pub fn record(&mut self, dispatch: Dispatch) -> SchedResult<()> {
        writeln!(self.out, "{}", dispatch.line()).map_err(SchedError::Trace)?;
        self.out.flush().map_err(SchedError::Trace)?;
        self.dispatches.push(dispatch);
        Ok(())
    }

    pub fn dispatches(&self) -> &[Dispatch] {
        &self.dispatches
    }

    /// Dispatches of a single process, in order
    pub fn for_process(&self, index: ProcessIndex) -> impl Iterator<Item = &Dispatch> {
        self.dispatches.iter().filter(move |d| d.index == index)
    }

    pub fn clear(&mut self) {
        self.dispatches.clear();
    }
}

impl Default for Trace {
    fn default() -> Self {
        Self::stdout()
    }
}
