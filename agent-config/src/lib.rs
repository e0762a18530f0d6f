//! Configuration management for agent deployments.
//!
//! Settings come from environment-style key/value sources and are validated
//! up front: a missing credential fails the load before any provider is
//! contacted.

#![warn(missing_docs, clippy::pedantic)]

pub mod loader;
pub mod schema;

pub use loader::{EnvSource, ProcessEnv};
pub use schema::{
    ConfigError, ConfigResult, DeploymentKind, Network, OpenAiSettings, PredictionSettings, Secret,
    Settings, SwapSettings,
};
