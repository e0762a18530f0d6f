//! Observability utilities for agent tool bridges.
//!
//! Installs a `tracing` subscriber writing formatted events to stderr. The
//! `RUST_LOG` environment variable wins over the configured default filter.

#![warn(missing_docs, clippy::pedantic)]

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Result alias for telemetry setup.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive could not be parsed.
    #[error("invalid log filter `{directive}`: {reason}")]
    InvalidFilter {
        /// Directive as supplied.
        directive: String,
        /// Parser message.
        reason: String,
    },

    /// A global subscriber is already installed.
    #[error("tracing subscriber already initialised")]
    AlreadyInitialised,
}

/// Subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    filter: String,
    with_target: bool,
}

impl TracingConfig {
    /// Creates a configuration with the supplied default filter directive.
    #[must_use]
    pub fn new(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            with_target: false,
        }
    }

    /// Includes the event target (module path) in each line.
    #[must_use]
    pub const fn with_target(mut self, with_target: bool) -> Self {
        self.with_target = with_target;
        self
    }

    /// Returns the default filter directive.
    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Resolves the effective filter, preferring `RUST_LOG` when it is set.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::InvalidFilter`] when the directive cannot be parsed.
    pub fn env_filter(&self) -> TelemetryResult<EnvFilter> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        parse_filter(&self.filter)
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::new("info")
    }
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] for an unparsable directive and
/// [`TelemetryError::AlreadyInitialised`] when called twice.
pub fn init_tracing(config: &TracingConfig) -> TelemetryResult<()> {
    let filter = config.env_filter()?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target)
        .with_level(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|_| TelemetryError::AlreadyInitialised)
}

fn parse_filter(directive: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(directive).map_err(|err| TelemetryError::InvalidFilter {
        directive: directive.to_owned(),
        reason: err.to_string(),
    })
}
