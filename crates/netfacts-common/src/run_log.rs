//! Per-run log shown to the operator after a collection.

use crate::choices::choice_set;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::choices::UnknownChoice;

choice_set! {
    /// Severity of a run log line.
    pub enum LogLevel as "log level" {
        Debug => "debug",
        Success => "success",
        Info => "info",
        Warning => "warning",
        Failure => "failure",
    }
}

/// One line of the run log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub time: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

/// Structured log accumulated during a single run.
///
/// Lines are prefixed with the current device link (see
/// [`RunLog::set_prefix`]) and mirrored to `tracing` as they are pushed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunLog {
    lines: Vec<LogLine>,
    #[serde(skip)]
    prefix: String,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the prefix prepended to subsequent lines.
    pub fn set_prefix(&mut self, prefix: impl Into<String>) {
        self.prefix = prefix.into();
    }

    /// Removes the line prefix.
    pub fn clear_prefix(&mut self) {
        self.prefix.clear();
    }

    /// Appends a line at the given level.
    pub fn push(&mut self, level: LogLevel, message: impl AsRef<str>) {
        let message = format!("{} {}", self.prefix, message.as_ref())
            .trim()
            .to_string();

        match level {
            LogLevel::Debug => tracing::debug!(target: "netfacts::run", "{}", message),
            LogLevel::Success | LogLevel::Info => {
                tracing::info!(target: "netfacts::run", kind = level.as_str(), "{}", message)
            }
            LogLevel::Warning => tracing::warn!(target: "netfacts::run", "{}", message),
            LogLevel::Failure => tracing::error!(target: "netfacts::run", "{}", message),
        }

        self.lines.push(LogLine {
            time: Utc::now(),
            level,
            message,
        });
    }

    pub fn debug(&mut self, message: impl AsRef<str>) {
        self.push(LogLevel::Debug, message);
    }

    pub fn success(&mut self, message: impl AsRef<str>) {
        self.push(LogLevel::Success, message);
    }

    pub fn info(&mut self, message: impl AsRef<str>) {
        self.push(LogLevel::Info, message);
    }

    pub fn warning(&mut self, message: impl AsRef<str>) {
        self.push(LogLevel::Warning, message);
    }

    pub fn failure(&mut self, message: impl AsRef<str>) {
        self.push(LogLevel::Failure, message);
    }

    /// Returns all lines in insertion order.
    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    /// Consumes the log and returns its lines.
    pub fn into_lines(self) -> Vec<LogLine> {
        self.lines
    }

    /// Counts lines at the given level.
    pub fn count(&self, level: LogLevel) -> usize {
        self.lines.iter().filter(|l| l.level == level).count()
    }

    /// Returns true if any line at `level` contains `needle`.
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.lines
            .iter()
            .any(|l| l.level == level && l.message.contains(needle))
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }
}
