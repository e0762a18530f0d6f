//! Shared error definitions for agent primitives.

use thiserror::Error;
use uuid::Error as UuidError;

/// Result alias used throughout the bridge.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while manipulating primitive types.
#[derive(Debug, Error)]
pub enum Error {
    /// The provided invocation identifier could not be parsed.
    #[error("invalid invocation id: {source}")]
    InvalidInvocationId {
        /// Source parsing error from the UUID library.
        #[from]
        source: UuidError,
    },

    /// A formatted name failed validation.
    #[error("invalid capability name `{name}`: {reason}")]
    InvalidName {
        /// The offending name.
        name: String,
        /// Human-readable reason for rejection.
        reason: String,
    },
}
