//! Tool-to-capability adaptation layer facade.
//!
//! Depend on this crate to get the whole bridge: externally provided tools are
//! discovered, filtered, renamed to host-safe names, registered, and exposed as
//! capabilities whose invocations always come back as text. Optional pieces sit
//! behind feature flags.

#![warn(missing_docs, clippy::pedantic)]

/// Shared primitives: formatted names, capability descriptors, invocation ids.
pub use agent_primitives as primitives;

/// Tool registry, capability builder, and execution dispatcher.
pub use agent_tools as tools;

/// Capability host (enabled by `kernel` feature).
#[cfg(feature = "kernel")]
pub use agent_kernel as kernel;

/// Completion backends and request observers (enabled by `adapters` feature).
#[cfg(feature = "adapters")]
pub use agent_adapters as adapters;

/// Concrete tool providers (enabled by `plugins` feature).
#[cfg(feature = "plugins")]
pub use agent_plugins as plugins;

/// Logging setup (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use agent_telemetry as telemetry;

/// Deployment settings (enabled by `config` feature).
#[cfg(feature = "config")]
pub use agent_config as config;

pub use agent_primitives::{FormattedName, format_name};
pub use agent_tools::{Capability, CapabilityBuilder, ExecutionDispatcher, ToolRegistry};
