//! Process-wide logging setup
//!
//! Both the API server and tests go through [`LoggingConfig`] so that log
//! format and filtering are controlled the same way everywhere:
//!
//! - `STUDIOCAST_LOG_FORMAT`: `text` (default), `json` or `pretty`
//! - `STUDIOCAST_LOG_LEVEL`: default filter directive, e.g. `debug`
//! - `RUST_LOG`: full `EnvFilter` syntax, takes precedence over both
//!
//! ```no_run
//! use libstudiocast::logging::{LogFormat, LoggingConfig};
//!
//! LoggingConfig::new(LogFormat::Json, "info".to_string(), false)
//!     .init()
//!     .expect("logging already initialised");
//! ```

use std::str::FromStr;

use tracing_subscriber::EnvFilter;

use crate::error::{ConfigError, Result};

/// Dependencies that are chatty at info level
const QUIET_TARGETS: &str = "sqlx=warn,hyper=warn,reqwest=warn";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable text output without colors
    Text,
    /// One JSON object per line, for log shippers
    Json,
    /// Multi-line colored output for development
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(format!(
                "Invalid log format: '{}'. Valid options: text, json, pretty",
                s
            )),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
            LogFormat::Pretty => write!(f, "pretty"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: String,
    pub verbose: bool,
}

impl LoggingConfig {
    pub fn new(format: LogFormat, level: String, verbose: bool) -> Self {
        Self {
            format,
            level,
            verbose,
        }
    }

    /// Build from `STUDIOCAST_LOG_FORMAT` / `STUDIOCAST_LOG_LEVEL`
    pub fn from_env() -> Self {
        let format = std::env::var("STUDIOCAST_LOG_FORMAT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(LogFormat::Text);
        let level = std::env::var("STUDIOCAST_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        Self::new(format, level, false)
    }

    /// Filter directive used when `RUST_LOG` is not set
    pub fn directive(&self) -> String {
        let level = if self.verbose { "debug" } else { self.level.as_str() };
        format!("{},{}", level, QUIET_TARGETS)
    }

    /// Install the global subscriber
    ///
    /// Fails if a subscriber has already been installed in this process.
    pub fn init(&self) -> Result<()> {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.directive()));

        let installed = match self.format {
            LogFormat::Json => tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_span_list(true)
                .flatten_event(true)
                .with_target(true)
                .try_init(),
            LogFormat::Pretty => tracing_subscriber::fmt()
                .pretty()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_line_number(true)
                .with_file(true)
                .try_init(),
            LogFormat::Text => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(false)
                .try_init(),
        };

        installed.map_err(|e| ConfigError::InvalidValue("logging".to_string(), e.to_string()).into())
    }
}

/// Initialize logging from the environment, ignoring a second initialisation
pub fn init_default() {
    if let Err(e) = LoggingConfig::from_env().init() {
        tracing::debug!("Logging already initialised: {}", e);
    }
}
