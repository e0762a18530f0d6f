//! Price predictions from the Allora network.

use std::fmt;
use std::sync::Arc;

use agent_config::PredictionSettings;
use agent_tools::{Tool, ToolError, ToolOutput, ToolProvider, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::transport::JsonTransport;

/// Consumer price endpoint root.
pub const DEFAULT_BASE_URL: &str = "https://api.upshot.xyz/v2/allora/consumer/price";

const PROVIDER: &str = "allora";
const TOOL_NAME: &str = "allora.get_price_prediction";

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
enum Ticker {
    Btc,
    Eth,
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Btc => "BTC",
            Self::Eth => "ETH",
        })
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
enum Timeframe {
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "8h")]
    EightHours,
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FiveMinutes => "5m",
            Self::EightHours => "8h",
        })
    }
}

#[derive(Deserialize)]
struct PredictionArgs {
    ticker: Ticker,
    timeframe: Timeframe,
}

/// Provider exposing the price prediction lookup.
#[derive(Clone)]
pub struct AlloraProvider {
    transport: Arc<dyn JsonTransport>,
    base_url: Arc<str>,
    api_key: Arc<str>,
    chain_slug: Arc<str>,
}

impl AlloraProvider {
    /// Creates a provider from prediction settings.
    #[must_use]
    pub fn new(transport: Arc<dyn JsonTransport>, settings: &PredictionSettings) -> Self {
        Self {
            transport,
            base_url: Arc::from(DEFAULT_BASE_URL),
            api_key: Arc::from(settings.api_key.expose()),
            chain_slug: Arc::from(settings.chain_slug.as_str()),
        }
    }

    /// Points the provider at another API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Self {
        self.base_url = Arc::from(base_url.as_ref().trim_end_matches('/'));
        self
    }
}

#[async_trait]
impl ToolProvider for AlloraProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn list(&self) -> ToolResult<Vec<Arc<dyn Tool>>> {
        let tool: Arc<dyn Tool> = Arc::new(PredictionTool {
            provider: self.clone(),
        });
        Ok(vec![tool])
    }
}

struct PredictionTool {
    provider: AlloraProvider,
}

#[async_trait]
impl Tool for PredictionTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Get the network's price prediction for BTC or ETH over a 5 minute or 8 hour horizon."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "ticker": {"type": "string", "enum": ["BTC", "ETH"]},
                "timeframe": {"type": "string", "enum": ["5m", "8h"]}
            },
            "required": ["ticker", "timeframe"]
        })
    }

    async fn execute(&self, args: Value) -> ToolResult<ToolOutput> {
        let PredictionArgs { ticker, timeframe } = serde_json::from_value(args)
            .map_err(|err| ToolError::invalid_input(err.to_string()))?;

        let provider = &self.provider;
        let url = format!(
            "{}/{}/{ticker}/{timeframe}",
            provider.base_url, provider.chain_slug
        );
        let headers = [("x-api-key", &*provider.api_key)];
        let response = provider.transport.get(&url, &headers).await?;

        Ok(ToolOutput::Structured(inference_data(response)))
    }
}

/// Unwraps `data.inference_data` when the envelope carries it.
fn inference_data(mut response: Value) -> Value {
    if let Some(data) = response.pointer_mut("/data/inference_data") {
        return data.take();
    }
    response
}
