//! Strongly typed configuration schemas.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading settings. All of them are fatal at startup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required key is absent or blank.
    #[error("missing required setting `{key}` for the {deployment} deployment")]
    Missing {
        /// Environment key.
        key: &'static str,
        /// Deployment that requires it.
        deployment: DeploymentKind,
    },

    /// A key is present but its value cannot be used.
    #[error("invalid value for `{key}`: {reason}")]
    Invalid {
        /// Environment key.
        key: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Which tool providers a deployment wires into the agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentKind {
    /// DEX market data lookups.
    MarketData,
    /// Swap quoting on a selected network.
    Swap,
    /// Price prediction.
    Prediction,
}

impl fmt::Display for DeploymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MarketData => "market-data",
            Self::Swap => "swap",
            Self::Prediction => "prediction",
        })
    }
}

impl FromStr for DeploymentKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "market-data" | "market_data" | "dexscreener" => Ok(Self::MarketData),
            "swap" | "uniswap" => Ok(Self::Swap),
            "prediction" | "allora" => Ok(Self::Prediction),
            other => Err(ConfigError::Invalid {
                key: "AGENT_DEPLOYMENT",
                reason: format!(
                    "unknown deployment `{other}` (expected market-data, swap, or prediction)"
                ),
            }),
        }
    }
}

/// EVM network selected for swap quoting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Network {
    /// Ethereum mainnet.
    Mainnet,
    /// Base mainnet.
    Base,
    /// Ethereum Sepolia testnet.
    Sepolia,
    /// Base Sepolia testnet.
    BaseSepolia,
}

impl Network {
    /// Returns the EIP-155 chain id.
    #[must_use]
    pub const fn chain_id(self) -> u64 {
        match self {
            Self::Mainnet => 1,
            Self::Base => 8453,
            Self::Sepolia => 11_155_111,
            Self::BaseSepolia => 84_532,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mainnet => "mainnet",
            Self::Base => "base",
            Self::Sepolia => "sepolia",
            Self::BaseSepolia => "base-sepolia",
        })
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "ethereum" => Ok(Self::Mainnet),
            "base" => Ok(Self::Base),
            "sepolia" => Ok(Self::Sepolia),
            "base-sepolia" | "base_sepolia" => Ok(Self::BaseSepolia),
            other => Err(ConfigError::Invalid {
                key: "NETWORK",
                reason: format!("unsupported network `{other}`"),
            }),
        }
    }
}

/// Credential that never shows up in debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wraps a secret value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the secret value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Completion backend settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenAiSettings {
    /// API key.
    pub api_key: Secret,
    /// Chat model identifier.
    pub model: String,
    /// Optional base URL override for compatible backends.
    pub base_url: Option<String>,
}

/// Swap quoting settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwapSettings {
    /// Uniswap trading API key.
    pub api_key: Secret,
    /// Wallet used as the default swapper identity.
    pub wallet_address: String,
    /// Network quotes are requested on.
    pub network: Network,
}

/// Price prediction settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PredictionSettings {
    /// Allora API key.
    pub api_key: Secret,
    /// Allora chain slug (`testnet` or `mainnet`).
    pub chain_slug: String,
}

/// Fully validated deployment settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Selected deployment.
    pub deployment: DeploymentKind,
    /// Completion backend.
    pub openai: OpenAiSettings,
    /// Present for swap deployments.
    pub swap: Option<SwapSettings>,
    /// Present for prediction deployments.
    pub prediction: Option<PredictionSettings>,
    /// Per-invocation tool timeout; `None` disables it.
    pub tool_timeout: Option<Duration>,
    /// Default tracing filter directive.
    pub log_filter: String,
}
