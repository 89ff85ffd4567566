/*!
 * Workload
 * The process table a policy runs over
 */

use super::types::{Process, ProcessResult};
use crate::core::errors::{SchedError, SchedResult};
use crate::core::types::{Millis, ProcessIndex};
use log::debug;
use std::io::BufRead;

/// Growable process table owned by the caller and lent to one policy run
#[derive(Debug, Clone, Default)]
pub struct Workload {
    processes: Vec<Process>,
}

impl Workload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Batch from command strings, in submission order
    pub fn from_commands<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            processes: commands
                .into_iter()
                .map(|c| Process::new(c, 0))
                .collect(),
        }
    }

    /// Batch from one command per line. Blank lines and `#` comments are skipped.
    pub fn from_reader(reader: impl BufRead) -> SchedResult<Self> {
        let mut workload = Self::new();
        for line in reader.lines() {
            let line = line.map_err(SchedError::Workload)?;
            let command = line.trim_end_matches('\r');
            if command.trim().is_empty() || command.trim_start().starts_with('#') {
                continue;
            }
            workload.processes.push(Process::new(command, 0));
        }
        debug!("Loaded batch workload with {} commands", workload.len());
        Ok(workload)
    }

    /// Admit an online arrival, returning its index
    pub fn admit(&mut self, command: impl Into<String>, arrival_time: Millis) -> ProcessResult<ProcessIndex> {
        let mut process = Process::new(command, arrival_time);
        process.admit()?;
        self.processes.push(process);
        Ok(self.processes.len() - 1)
    }

    /// Normalize every process for an offline batch: arrival 0, state Ready
    pub fn reset_for_batch(&mut self) {
        for process in &mut self.processes {
            process.reset_for_batch();
        }
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    pub(crate) fn processes_mut(&mut self) -> &mut [Process] {
        &mut self.processes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Process> {
        self.processes.iter()
    }

    pub fn all_completed(&self) -> bool {
        self.processes.iter().all(Process::completed)
    }

    pub fn remaining(&self) -> usize {
        self.processes.iter().filter(|p| !p.completed()).count()
    }
}

impl std::ops::Index<ProcessIndex> for Workload {
    type Output = Process;

    fn index(&self, index: ProcessIndex) -> &Process {
        &self.processes[index]
    }
}

impl std::ops::IndexMut<ProcessIndex> for Workload {
    fn index_mut(&mut self, index: ProcessIndex) -> &mut Process {
        &mut self.processes[index]
    }
}

impl<'a> IntoIterator for &'a Workload {
    type Item = &'a Process;
    type IntoIter = std::slice::Iter<'a, Process>;

    fn into_iter(self) -> Self::IntoIter {
        self.processes.iter()
    }
}
