/*!
 * Command Statistics Store
 * Running-average burst per exact command text, used to predict SJF bursts
 */

use crate::core::types::{Millis, ProcessIndex};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandStat {
    pub command: String,
    /// Index of the first process that carried this command
    pub index: ProcessIndex,
    pub average_burst: Millis,
    pub count: u64,
}

/// Linear store; workloads have at most a few hundred distinct commands
#[derive(Debug, Clone)]
pub struct CommandStats {
    entries: Vec<CommandStat>,
    default_burst: Millis,
}

impl CommandStats {
    pub fn new(default_burst: Millis) -> Self {
        Self {
            entries: Vec::new(),
            default_burst,
        }
    }

    fn find(&self, command: &str) -> Option<&CommandStat> {
        self.entries.iter().find(|e| e.command == command)
    }

    /// Register a command on first sight
    pub fn observe(&mut self, command: &str, index: ProcessIndex) {
        if self.find(command).is_none() {
            self.entries.push(CommandStat {
                command: command.to_string(),
                index,
                average_burst: self.default_burst,
                count: 0,
            });
        }
    }

    /// Predicted burst, or the default for never-seen text
    pub fn predict(&self, command: &str) -> Millis {
        self.find(command)
            .map(|e| e.average_burst)
            .unwrap_or(self.default_burst)
    }

    /// Fold one observed run into the running average:
    /// `avg' = (avg * count + observed) / (count + 1)`
    pub fn record(&mut self, command: &str, index: ProcessIndex, observed: Millis) {
        self.observe(command, index);
        if let Some(entry) = self.entries.iter_mut().find(|e| e.command == command) {
            entry.average_burst = (entry.average_burst * entry.count + observed) / (entry.count + 1);
            entry.count += 1;
        }
    }

    pub fn get(&self, command: &str) -> Option<&CommandStat> {
        self.find(command)
    }
}
