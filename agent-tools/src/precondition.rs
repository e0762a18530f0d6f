//! Dispatcher-level argument checks the parameter schema cannot express.

use serde_json::Value;
use thiserror::Error;

/// Reason a precondition rejected an invocation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PreconditionViolation {
    /// A required argument was absent or blank.
    #[error("missing required argument `{argument}` for `{capability}`")]
    MissingArgument {
        /// Capability being invoked.
        capability: String,
        /// Argument that must be supplied.
        argument: String,
    },
}

/// Check evaluated before a tool is executed.
pub trait Precondition: Send + Sync {
    /// Validates `args` for `capability`; a violation prevents execution.
    ///
    /// # Errors
    ///
    /// Returns the [`PreconditionViolation`] describing what is wrong.
    fn check(&self, capability: &str, args: &Value) -> Result<(), PreconditionViolation>;
}

/// Requires a non-empty string argument on every capability with a given prefix.
///
/// Swap capabilities use this for the caller's wallet address, which the
/// provider schemas mark optional.
#[derive(Debug, Clone)]
pub struct RequiredArgument {
    prefix: String,
    argument: String,
}

impl RequiredArgument {
    /// Creates a check for `argument` on capabilities starting with `prefix`.
    #[must_use]
    pub fn new(prefix: impl Into<String>, argument: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            argument: argument.into(),
        }
    }
}

impl Precondition for RequiredArgument {
    fn check(&self, capability: &str, args: &Value) -> Result<(), PreconditionViolation> {
        if !capability.starts_with(&self.prefix) {
            return Ok(());
        }

        let present = args
            .get(&self.argument)
            .and_then(Value::as_str)
            .is_some_and(|value| !value.trim().is_empty());

        if present {
            Ok(())
        } else {
            Err(PreconditionViolation::MissingArgument {
                capability: capability.to_owned(),
                argument: self.argument.clone(),
            })
        }
    }
}
