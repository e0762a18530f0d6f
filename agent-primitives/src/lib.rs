//! Core shared types for bridging external tools into agent capabilities.

#![warn(missing_docs, clippy::pedantic)]

mod capability;
mod error;
mod ids;
mod name;

/// Model-facing capability descriptors and description limits.
pub use capability::{CapabilitySpec, MAX_DESCRIPTION_CHARS, TRUNCATION_SUFFIX};
/// Error type and result alias shared across the SDK.
pub use error::{Error, Result};
/// Identifier attached to every capability invocation.
pub use ids::InvocationId;
/// Capability namespace names and the formatter producing them.
pub use name::{FormattedName, NAMESPACE_SEPARATOR, format_name};
