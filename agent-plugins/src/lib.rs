//! Tool providers for market data, swap quoting, and price prediction.
//!
//! Each provider lists namespaced tools (`dexscreener.search_pairs`,
//! `uniswap.get_quote`, ...) over a [`transport::JsonTransport`]. The
//! [`deployment`] module picks the providers, selection policy, and dispatcher
//! checks for one [`agent_config::DeploymentKind`].

#![warn(missing_docs, clippy::pedantic)]

pub mod allora;
pub mod deployment;
pub mod dexscreener;
pub mod transport;
pub mod uniswap;

pub use allora::AlloraProvider;
pub use deployment::{Deployment, policy_for, preconditions_for, providers_for, system_prompt_for};
pub use dexscreener::DexscreenerProvider;
pub use transport::{HttpsJsonTransport, JsonTransport};
pub use uniswap::UniswapProvider;
