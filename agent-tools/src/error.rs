//! Errors produced by tools and providers.

use thiserror::Error;

/// Result alias for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Errors produced by tool discovery and execution.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Arguments did not match what the tool accepts.
    #[error("invalid tool input: {reason}")]
    InvalidInput {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Tool execution failed.
    #[error("tool execution failed: {reason}")]
    Execution {
        /// Human-readable error returned by the tool implementation.
        reason: String,
    },

    /// A provider could not list its tools, or nothing usable was found.
    #[error("tool discovery failed for `{provider}`: {reason}")]
    Discovery {
        /// Provider that failed.
        provider: String,
        /// Human-readable cause.
        reason: String,
    },
}

impl ToolError {
    /// Creates an execution error from the supplied reason.
    #[must_use]
    pub fn execution(reason: impl Into<String>) -> Self {
        Self::Execution {
            reason: reason.into(),
        }
    }

    /// Creates an invalid input error from the supplied reason.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Creates a discovery error for the named provider.
    #[must_use]
    pub fn discovery(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Discovery {
            provider: provider.into(),
            reason: reason.into(),
        }
    }
}
