use super::config::{LogFormat, LogLevel};
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Crates whose chatter is capped at `warn` regardless of the agent level.
const DEFAULT_DIRECTIVES: &[(&str, LogLevel)] = &[
    ("hyper", LogLevel::Warn),
    ("hyper_util", LogLevel::Warn),
    ("reqwest", LogLevel::Warn),
    ("h2", LogLevel::Warn),
    ("rustls", LogLevel::Warn),
    ("sled", LogLevel::Warn),
];

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log filter '{filter}': {source}")]
    InvalidFilter {
        filter: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("Failed to set global tracing subscriber: {0}")]
    InitFailed(String),
}

/// Builds and installs the agent's own tracing subscriber.
///
/// `RUST_LOG`, when set, replaces the computed filter entirely.
#[derive(Debug, Clone)]
pub struct LoggingSystem {
    level: LogLevel,
    format: LogFormat,
    directives: Vec<(String, LogLevel)>,
}

impl LoggingSystem {
    pub fn new(level: LogLevel, format: LogFormat) -> Self {
        Self {
            level,
            format,
            directives: DEFAULT_DIRECTIVES
                .iter()
                .map(|(target, level)| ((*target).to_string(), *level))
                .collect(),
        }
    }

    pub fn add_directive(&mut self, target: impl Into<String>, level: LogLevel) {
        self.directives.push((target.into(), level));
    }

    pub fn build_filter_string(&self) -> String {
        let mut parts = Vec::with_capacity(self.directives.len() + 1);
        parts.push(self.level.as_str().to_string());
        for (target, level) in &self.directives {
            parts.push(format!("{target}={}", level.as_str()));
        }
        parts.join(",")
    }

    fn env_filter(&self) -> Result<EnvFilter, LoggingError> {
        let filter = std::env::var("RUST_LOG")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| self.build_filter_string());

        EnvFilter::try_new(&filter).map_err(|source| LoggingError::InvalidFilter { filter, source })
    }

    /// Installs the subscriber. Fails if one is already installed.
    pub fn init(&self) -> Result<(), LoggingError> {
        let filter = self.env_filter()?;
        let registry = tracing_subscriber::registry().with(filter);

        let result = match self.format {
            LogFormat::Compact => registry
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .compact(),
                )
                .try_init(),
            LogFormat::Json => registry
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .json()
                        .with_current_span(false),
                )
                .try_init(),
        };

        result.map_err(|e| LoggingError::InitFailed(e.to_string()))
    }
}
