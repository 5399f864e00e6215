//! Structured logging with optional external sinks.
//!
//! The collector reports one progress observation per scroll cycle; callers
//! embedding the library can forward those records to their own logger while
//! the CLI falls back to a timestamped console printer.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Verbosity;

/// Convenience alias for external logging callbacks.
pub type LogCallback = Arc<dyn Fn(&HarvestLogRecord) + Send + Sync + 'static>;

/// Logging configuration shared across the harvester.
#[derive(Clone, Default)]
pub struct LogConfig {
    pub verbose: Verbosity,
    pub external_logger: Option<LogCallback>,
}

impl LogConfig {
    pub fn new(verbose: Verbosity) -> Self {
        Self {
            verbose,
            ..Default::default()
        }
    }

    pub fn should_log(&self, level: LogLevel) -> bool {
        level == LogLevel::Error || level.as_u8() <= verbosity_to_u8(self.verbose)
    }
}

/// Log severity used across the harvester.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error = 0,
    Info = 1,
    Debug = 2,
}

impl LogLevel {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

fn verbosity_to_u8(verbose: Verbosity) -> u8 {
    match verbose {
        Verbosity::Minimal => 0,
        Verbosity::Medium => 1,
        Verbosity::Detailed => 2,
    }
}

/// Structured log entry shared with external callbacks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarvestLogRecord {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub level: LogLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auxiliary: Option<Value>,
}

impl HarvestLogRecord {
    pub fn new(
        message: impl Into<String>,
        level: LogLevel,
        category: Option<String>,
        auxiliary: Option<Value>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            message: message.into(),
            level,
            category,
            auxiliary,
        }
    }
}

/// Default console printer used when no external logger is configured.
pub fn default_log_handler(record: &HarvestLogRecord) {
    let timestamp = record
        .timestamp
        .to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    if let Some(category) = &record.category {
        println!(
            "[{}] {:<5} [{}] {}",
            timestamp,
            record.level.label(),
            category,
            record.message
        );
    } else {
        println!(
            "[{}] {:<5} {}",
            timestamp,
            record.level.label(),
            record.message
        );
    }
    if let Some(aux) = &record.auxiliary {
        if !aux.is_null() {
            println!("    {}", aux);
        }
    }
}

/// Logger handed to the collector and the CLI.
pub struct HarvestLogger {
    config: LogConfig,
    default_handler: LogCallback,
}

impl fmt::Debug for HarvestLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HarvestLogger")
            .field("verbosity", &self.config.verbose)
            .field("external_logger", &self.config.external_logger.is_some())
            .finish()
    }
}

impl HarvestLogger {
    pub fn with_config(config: LogConfig) -> Self {
        Self {
            config,
            default_handler: Arc::new(default_log_handler),
        }
    }

    pub fn new(verbose: Verbosity) -> Self {
        Self::with_config(LogConfig::new(verbose))
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    pub fn set_external_logger(&mut self, logger: Option<LogCallback>) {
        self.config.external_logger = logger;
    }

    pub fn log(
        &self,
        message: impl Into<String>,
        level: LogLevel,
        category: Option<&str>,
        auxiliary: Option<Value>,
    ) {
        if !self.config.should_log(level) {
            return;
        }

        let record =
            HarvestLogRecord::new(message, level, category.map(|c| c.to_string()), auxiliary);

        if let Some(callback) = &self.config.external_logger {
            callback(&record);
        } else {
            (self.default_handler)(&record);
        }
    }

    pub fn error(
        &self,
        message: impl Into<String>,
        category: Option<&str>,
        auxiliary: Option<Value>,
    ) {
        self.log(message, LogLevel::Error, category, auxiliary);
    }

    pub fn info(
        &self,
        message: impl Into<String>,
        category: Option<&str>,
        auxiliary: Option<Value>,
    ) {
        self.log(message, LogLevel::Info, category, auxiliary);
    }

    pub fn debug(
        &self,
        message: impl Into<String>,
        category: Option<&str>,
        auxiliary: Option<Value>,
    ) {
        self.log(message, LogLevel::Debug, category, auxiliary);
    }
}
