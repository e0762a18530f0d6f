//! Per-deployment wiring: which providers, which policy, which checks.

use std::sync::Arc;
use std::time::Duration;

use agent_config::{ConfigError, ConfigResult, DeploymentKind, Settings};
use agent_tools::{
    Capability, CapabilityBuilder, DispatcherConfig, ExecutionDispatcher, Precondition,
    RequiredArgument, SelectionPolicy, ToolProvider, ToolRegistry, ToolResult,
    discover_capabilities,
};
use tracing::info;

use crate::allora::AlloraProvider;
use crate::dexscreener::DexscreenerProvider;
use crate::transport::JsonTransport;
use crate::uniswap::UniswapProvider;

/// Canonical name swap quoting is offered under.
pub const SWAP_QUOTE_CAPABILITY: &str = "uniswap.get_swap_quote";

/// Argument every swap capability must carry.
pub const WALLET_ARGUMENT: &str = "walletAddress";

/// Returns the selection policy for `kind`.
#[must_use]
pub fn policy_for(kind: DeploymentKind) -> SelectionPolicy {
    match kind {
        DeploymentKind::MarketData => SelectionPolicy::accept_all().allow_prefix("dexscreener."),
        DeploymentKind::Swap => SelectionPolicy::accept_all()
            .allow_prefix("uniswap.")
            .alias(["get_quote", "quote"], SWAP_QUOTE_CAPABILITY),
        DeploymentKind::Prediction => SelectionPolicy::accept_all().allow_prefix("allora."),
    }
}

/// Returns the dispatcher checks for `kind`.
#[must_use]
pub fn preconditions_for(kind: DeploymentKind) -> Vec<Arc<dyn Precondition>> {
    match kind {
        DeploymentKind::Swap => vec![Arc::new(RequiredArgument::new("uniswap_", WALLET_ARGUMENT))],
        DeploymentKind::MarketData | DeploymentKind::Prediction => Vec::new(),
    }
}

/// Default system prompt for `kind`.
#[must_use]
pub const fn system_prompt_for(kind: DeploymentKind) -> &'static str {
    match kind {
        DeploymentKind::MarketData => {
            "You are a market data assistant. Use the DEX lookup tools to answer questions \
            about token pairs, prices, liquidity, and volume. Quote figures exactly as returned."
        }
        DeploymentKind::Swap => {
            "You are a swap assistant. Check approvals and fetch quotes with the swap tools, \
            always passing the wallet address. Never claim a swap was executed."
        }
        DeploymentKind::Prediction => {
            "You are a price prediction assistant. Use the prediction tool for BTC or ETH \
            and state the horizon of every figure you report."
        }
    }
}

/// Providers instantiated for `settings.deployment`.
///
/// # Errors
///
/// Returns [`ConfigError::Missing`] when the deployment's provider settings are absent.
pub fn providers_for(
    settings: &Settings,
    transport: Arc<dyn JsonTransport>,
) -> ConfigResult<Vec<Arc<dyn ToolProvider>>> {
    let deployment = settings.deployment;
    let provider: Arc<dyn ToolProvider> = match deployment {
        DeploymentKind::MarketData => Arc::new(DexscreenerProvider::new(transport)),
        DeploymentKind::Swap => {
            let swap = settings.swap.as_ref().ok_or(ConfigError::Missing {
                key: "UNISWAP_API_KEY",
                deployment,
            })?;
            Arc::new(UniswapProvider::new(transport, swap))
        }
        DeploymentKind::Prediction => {
            let prediction = settings.prediction.as_ref().ok_or(ConfigError::Missing {
                key: "ALLORA_API_KEY",
                deployment,
            })?;
            Arc::new(AlloraProvider::new(transport, prediction))
        }
    };
    Ok(vec![provider])
}

/// Everything needed to turn one deployment's providers into capabilities.
pub struct Deployment {
    kind: DeploymentKind,
    providers: Vec<Arc<dyn ToolProvider>>,
    policy: SelectionPolicy,
    preconditions: Vec<Arc<dyn Precondition>>,
    timeout: Option<Duration>,
}

impl Deployment {
    /// Wires the deployment selected in `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when provider settings are missing.
    pub fn from_settings(
        settings: &Settings,
        transport: Arc<dyn JsonTransport>,
    ) -> ConfigResult<Self> {
        let kind = settings.deployment;
        Ok(Self {
            kind,
            providers: providers_for(settings, transport)?,
            policy: policy_for(kind),
            preconditions: preconditions_for(kind),
            timeout: settings.tool_timeout,
        })
    }

    /// Wires `kind` around caller-supplied providers.
    #[must_use]
    pub fn with_providers(kind: DeploymentKind, providers: Vec<Arc<dyn ToolProvider>>) -> Self {
        Self {
            kind,
            providers,
            policy: policy_for(kind),
            preconditions: preconditions_for(kind),
            timeout: DispatcherConfig::default().timeout(),
        }
    }

    /// Returns the deployment kind.
    #[must_use]
    pub const fn kind(&self) -> DeploymentKind {
        self.kind
    }

    /// Returns the selection policy.
    #[must_use]
    pub fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }

    /// Returns the default system prompt.
    #[must_use]
    pub const fn system_prompt(&self) -> &'static str {
        system_prompt_for(self.kind)
    }

    /// Builds a dispatcher over `registry` carrying this deployment's checks and timeout.
    #[must_use]
    pub fn dispatcher(&self, registry: Arc<ToolRegistry>) -> ExecutionDispatcher {
        self.preconditions.iter().fold(
            ExecutionDispatcher::new(registry).with_config(DispatcherConfig::new(self.timeout)),
            |dispatcher, precondition| dispatcher.with_precondition(Arc::clone(precondition)),
        )
    }

    /// Discovers every provider's tools and builds the capability set.
    ///
    /// # Errors
    ///
    /// Returns [`agent_tools::ToolError::Discovery`] when listing fails or no
    /// capability survives the policy.
    pub async fn capabilities(&self, registry: Arc<ToolRegistry>) -> ToolResult<Vec<Capability>> {
        let builder = CapabilityBuilder::new(Arc::new(self.dispatcher(registry)));
        let capabilities = discover_capabilities(&self.providers, &self.policy, &builder).await?;
        info!(
            deployment = %self.kind,
            capabilities = capabilities.len(),
            "deployment capabilities ready"
        );
        Ok(capabilities)
    }
}
