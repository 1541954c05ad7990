//! Console output and diagnostic logging.
//!
//! User-facing lines (run summaries, warnings, fatal errors) go to stdout
//! through the `log_*` helpers. Diagnostics go to stderr through `tracing`,
//! filtered by `RUST_LOG` or the CLI verbosity.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Log level for console display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single console line
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Info, message: message.into() }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Success, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Error, message: message.into() }
    }

    /// Line as printed on the console.
    pub fn render(&self) -> String {
        let prefix = match self.level {
            LogLevel::Info => "",
            LogLevel::Success => "✓ ",
            LogLevel::Warning => "⚠️  ",
            LogLevel::Error => "❌ ",
        };
        format!("{}{}", prefix, self.message)
    }
}

/// Print an entry to stdout.
pub fn log(entry: LogEntry) {
    println!("{}", entry.render());
}

pub fn log_info(msg: impl Into<String>) {
    log(LogEntry::info(msg));
}

pub fn log_success(msg: impl Into<String>) {
    log(LogEntry::success(msg));
}

pub fn log_warning(msg: impl Into<String>) {
    log(LogEntry::warning(msg));
}

pub fn log_error(msg: impl Into<String>) {
    log(LogEntry::error(msg));
}

// =============================================================================
// Tracing setup
// =============================================================================

const LOG_FORMAT_ENV: &str = "CSV_VALIDATE_LOG_FORMAT";

/// Diagnostic output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Compact,
    Json,
}

/// Diagnostic logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `warn` or `csv_validate=debug`
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl LoggingConfig {
    /// Map `-v` occurrences to a level.
    pub fn from_verbosity(verbosity: u8) -> Self {
        let level = match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        Self {
            level: level.to_string(),
            ..Self::default()
        }
    }

    /// `RUST_LOG` and `CSV_VALIDATE_LOG_FORMAT` take precedence.
    pub fn merge_with_env(mut self) -> Self {
        if let Ok(rust_log) = std::env::var("RUST_LOG") {
            if !rust_log.trim().is_empty() {
                self.level = rust_log;
            }
        }
        if let Ok(format) = std::env::var(LOG_FORMAT_ENV) {
            match format.to_lowercase().as_str() {
                "json" => self.format = LogFormat::Json,
                "compact" => self.format = LogFormat::Compact,
                other => eprintln!("Ignoring {LOG_FORMAT_ENV}={other}: expected 'json' or 'compact'"),
            }
        }
        self
    }
}

/// Install the global tracing subscriber writing to stderr.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
}
