//! DEX market data lookups.

use std::sync::Arc;

use agent_tools::{Tool, ToolError, ToolOutput, ToolProvider, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::transport::JsonTransport;

/// Public DexScreener API root.
pub const DEFAULT_BASE_URL: &str = "https://api.dexscreener.com/latest/dex";

const PROVIDER: &str = "dexscreener";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Operation {
    PairsByChainAndPair,
    SearchPairs,
    TokenPairs,
}

impl Operation {
    const ALL: [Self; 3] = [Self::PairsByChainAndPair, Self::SearchPairs, Self::TokenPairs];

    const fn name(self) -> &'static str {
        match self {
            Self::PairsByChainAndPair => "dexscreener.get_pairs_by_chain_and_pair",
            Self::SearchPairs => "dexscreener.search_pairs",
            Self::TokenPairs => "dexscreener.get_token_pairs_by_token_address",
        }
    }

    const fn description(self) -> &'static str {
        match self {
            Self::PairsByChainAndPair => {
                "Get one or more DEX pairs by chain id (e.g. `ethereum`, `base`, `solana`) \
                and pair address."
            }
            Self::SearchPairs => {
                "Search DEX pairs matching a token symbol, token name, or address. \
                Returns price, liquidity, and volume per pair."
            }
            Self::TokenPairs => {
                "Get every DEX pair for one or more token addresses (comma-separated, up to 30)."
            }
        }
    }

    fn parameters(self) -> Value {
        match self {
            Self::PairsByChainAndPair => json!({
                "type": "object",
                "properties": {
                    "chainId": {"type": "string", "description": "Chain identifier, e.g. ethereum"},
                    "pairId": {"type": "string", "description": "Pair address"}
                },
                "required": ["chainId", "pairId"]
            }),
            Self::SearchPairs => json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Symbol, name, or address to search for"
                    }
                },
                "required": ["query"]
            }),
            Self::TokenPairs => json!({
                "type": "object",
                "properties": {
                    "tokenAddresses": {
                        "type": "string",
                        "description": "Comma-separated token addresses"
                    }
                },
                "required": ["tokenAddresses"]
            }),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PairArgs {
    chain_id: String,
    pair_id: String,
}

#[derive(Deserialize)]
struct SearchArgs {
    query: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenArgs {
    token_addresses: String,
}

/// Provider exposing the DexScreener lookups.
#[derive(Clone)]
pub struct DexscreenerProvider {
    transport: Arc<dyn JsonTransport>,
    base_url: Arc<str>,
}

impl DexscreenerProvider {
    /// Creates a provider against the public API.
    #[must_use]
    pub fn new(transport: Arc<dyn JsonTransport>) -> Self {
        Self {
            transport,
            base_url: Arc::from(DEFAULT_BASE_URL),
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
impl ToolProvider for DexscreenerProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn list(&self) -> ToolResult<Vec<Arc<dyn Tool>>> {
        Ok(Operation::ALL
            .into_iter()
            .map(|operation| {
                Arc::new(DexscreenerTool {
                    operation,
                    transport: Arc::clone(&self.transport),
                    base_url: Arc::clone(&self.base_url),
                }) as Arc<dyn Tool>
            })
            .collect())
    }
}

struct DexscreenerTool {
    operation: Operation,
    transport: Arc<dyn JsonTransport>,
    base_url: Arc<str>,
}

impl DexscreenerTool {
    fn url(&self, args: Value) -> ToolResult<String> {
        let base = &self.base_url;
        let url = match self.operation {
            Operation::PairsByChainAndPair => {
                let PairArgs { chain_id, pair_id } = parse(args)?;
                format!(
                    "{base}/pairs/{}/{}",
                    urlencoding::encode(chain_id.trim()),
                    urlencoding::encode(pair_id.trim())
                )
            }
            Operation::SearchPairs => {
                let SearchArgs { query } = parse(args)?;
                if query.trim().is_empty() {
                    return Err(ToolError::invalid_input("`query` must not be empty"));
                }
                format!("{base}/search?q={}", urlencoding::encode(query.trim()))
            }
            Operation::TokenPairs => {
                let TokenArgs { token_addresses } = parse(args)?;
                let addresses: Vec<_> = token_addresses
                    .split(',')
                    .map(str::trim)
                    .filter(|address| !address.is_empty())
                    .map(urlencoding::encode)
                    .collect();
                if addresses.is_empty() {
                    return Err(ToolError::invalid_input("`tokenAddresses` must not be empty"));
                }
                format!("{base}/tokens/{}", addresses.join(","))
            }
        };
        Ok(url)
    }
}

#[async_trait]
impl Tool for DexscreenerTool {
    fn name(&self) -> &str {
        self.operation.name()
    }

    fn description(&self) -> &str {
        self.operation.description()
    }

    fn parameters(&self) -> Value {
        self.operation.parameters()
    }

    async fn execute(&self, args: Value) -> ToolResult<ToolOutput> {
        let url = self.url(args)?;
        let body = self.transport.get(&url, &[]).await?;
        Ok(ToolOutput::Structured(body))
    }
}

fn parse<T: for<'de> Deserialize<'de>>(args: Value) -> ToolResult<T> {
    serde_json::from_value(args).map_err(|err| ToolError::invalid_input(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::RecordingTransport;

    async fn tool(transport: &Arc<RecordingTransport>, name: &str) -> Arc<dyn Tool> {
        DexscreenerProvider::new(transport.clone())
            .with_base_url("https://dex.test/")
            .list()
            .await
            .unwrap()
            .into_iter()
            .find(|tool| tool.name() == name)
            .expect("tool listed")
    }

    #[tokio::test]
    async fn lists_three_namespaced_tools() {
        let provider = DexscreenerProvider::new(Arc::new(RecordingTransport::default()));
        let names: Vec<String> = provider
            .list()
            .await
            .unwrap()
            .iter()
            .map(|tool| tool.name().to_owned())
            .collect();

        assert_eq!(
            names,
            [
                "dexscreener.get_pairs_by_chain_and_pair",
                "dexscreener.search_pairs",
                "dexscreener.get_token_pairs_by_token_address",
            ]
        );
    }

    #[tokio::test]
    async fn search_encodes_query() {
        let transport = Arc::new(RecordingTransport::replying(vec![Ok(json!({"pairs": []}))]));
        let tool = tool(&transport, "dexscreener.search_pairs").await;

        let output = tool.execute(json!({"query": "WETH USDC"})).await.unwrap();

        assert_eq!(output, ToolOutput::Structured(json!({"pairs": []})));
        let request = transport.last();
        assert_eq!(request.method, "GET");
        assert_eq!(request.url, "https://dex.test/search?q=WETH%20USDC");
    }

    #[tokio::test]
    async fn pair_lookup_builds_path() {
        let transport = Arc::new(RecordingTransport::default());
        let tool = tool(&transport, "dexscreener.get_pairs_by_chain_and_pair").await;

        tool.execute(json!({"chainId": "base", "pairId": "0xabc"}))
            .await
            .unwrap();

        assert_eq!(transport.last().url, "https://dex.test/pairs/base/0xabc");
    }

    #[tokio::test]
    async fn token_lookup_normalizes_address_list() {
        let transport = Arc::new(RecordingTransport::default());
        let tool = tool(&transport, "dexscreener.get_token_pairs_by_token_address").await;

        tool.execute(json!({"tokenAddresses": " 0xa , 0xb,"}))
            .await
            .unwrap();

        assert_eq!(transport.last().url, "https://dex.test/tokens/0xa,0xb");
    }

    #[tokio::test]
    async fn token_addresses_cannot_escape_the_tokens_path() {
        let transport = Arc::new(RecordingTransport::default());
        let tool = tool(&transport, "dexscreener.get_token_pairs_by_token_address").await;

        tool.execute(json!({"tokenAddresses": "0xa/../../search?q=x#, 0xb"}))
            .await
            .unwrap();

        assert_eq!(
            transport.last().url,
            "https://dex.test/tokens/0xa%2F..%2F..%2Fsearch%3Fq%3Dx%23,0xb"
        );
    }

    #[tokio::test]
    async fn rejects_bad_arguments_without_calling_upstream() {
        let transport = Arc::new(RecordingTransport::default());
        let tool = tool(&transport, "dexscreener.search_pairs").await;

        let err = tool.execute(json!({"q": "PEPE"})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput { .. }));

        let err = tool.execute(json!({"query": "  "})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput { .. }));

        assert!(transport.requests.lock().unwrap().is_empty());
    }
}
