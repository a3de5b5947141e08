use crate::error::Result;
use crate::filter::compile;
use crate::record::LogRecord;
use regex::Regex;
use std::process::Stdio;
use tokio::process::Command;

/// Runs a shell command whenever an emitted record's message matches
#[derive(Debug, Clone)]
pub struct MatchAction {
    pattern: Regex,
    command: String,
}

impl MatchAction {
    pub fn new(pattern: &str, command: impl Into<String>) -> Result<Self> {
        Ok(Self {
            pattern: compile(pattern)?,
            command: command.into(),
        })
    }

    pub fn matches(&self, record: &LogRecord) -> bool {
        self.pattern.is_match(record.message())
    }

    /// Spawn the command detached if the record matches.
    ///
    /// The message is passed as `$1`. Spawn failures are logged and otherwise
    /// ignored. Must be called from within a tokio runtime.
    pub fn trigger(&self, record: &LogRecord) -> bool {
        if !self.matches(record) {
            return false;
        }

        let spawned = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .arg("snazy")
            .arg(record.message())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn();

        match spawned {
            Ok(child) => {
                tracing::debug!(pid = ?child.id(), command = %self.command, "Action command started");
                true
            }
            Err(e) => {
                tracing::warn!(command = %self.command, error = %e, "Failed to run action command");
                false
            }
        }
    }
}
