//! Logging capability handed to the parser, diff engine, and sorter.
//!
//! The core never writes to a process-wide sink. Callers pass a `&mut dyn Logger`
//! and decide where messages end up: [`MessageLog`] keeps them in memory,
//! [`TracingLogger`] forwards them to `tracing`.

use std::fmt;

/// Severity of a log message. Lower variants are more important.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Error,
    Warning,
    /// Differences found between two snapshots, and heuristics that affected ordering
    Differences,
    Information,
    Verbose,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Error => "Error",
            LogLevel::Warning => "Warning",
            LogLevel::Differences => "Differences",
            LogLevel::Information => "Information",
            LogLevel::Verbose => "Verbose",
        };
        f.write_str(s)
    }
}

/// A single logged message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    pub level: LogLevel,
    pub message: String,
}

/// Sink for diagnostics produced by the core
pub trait Logger {
    fn log(&mut self, level: LogLevel, message: &str);
}

/// Collects messages in memory.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<LogMessage>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[LogMessage] {
        &self.messages
    }

    /// Messages at exactly the given level
    pub fn at_level(&self, level: LogLevel) -> impl Iterator<Item = &LogMessage> {
        self.messages.iter().filter(move |m| m.level == level)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Logger for MessageLog {
    fn log(&mut self, level: LogLevel, message: &str) {
        self.messages.push(LogMessage {
            level,
            message: message.to_string(),
        });
    }
}

/// Forwards messages to the `tracing` macros.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&mut self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Error => tracing::error!("{}", message),
            LogLevel::Warning => tracing::warn!("{}", message),
            LogLevel::Differences | LogLevel::Information => tracing::info!("{}", message),
            LogLevel::Verbose => tracing::debug!("{}", message),
        }
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&mut self, _level: LogLevel, _message: &str) {}
}
