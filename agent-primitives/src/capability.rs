//! Capability descriptors offered to the completion backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::FormattedName;

/// Longest description, in characters, kept verbatim on a capability.
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

/// Marker appended to descriptions cut at [`MAX_DESCRIPTION_CHARS`].
pub const TRUNCATION_SUFFIX: &str = "... [truncated]";

/// Model-facing half of a capability: what the backend sees in its tool list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CapabilitySpec {
    name: FormattedName,
    description: String,
    parameters: Value,
}

impl CapabilitySpec {
    /// Creates a descriptor from its parts.
    #[must_use]
    pub fn new(name: FormattedName, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name,
            description: description.into(),
            parameters,
        }
    }

    /// Returns the capability name.
    #[must_use]
    pub fn name(&self) -> &FormattedName {
        &self.name
    }

    /// Returns the description shown to the model.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the JSON schema describing accepted arguments.
    #[must_use]
    pub fn parameters(&self) -> &Value {
        &self.parameters
    }

    /// Returns `true` when the description is longer than a truncated one can be.
    #[must_use]
    pub fn is_oversized(&self) -> bool {
        self.description.chars().count() > MAX_DESCRIPTION_CHARS + TRUNCATION_SUFFIX.chars().count()
    }
}
