//! Swap approval checks and quoting through the Uniswap trading API.

use std::sync::Arc;

use agent_config::{Network, SwapSettings};
use agent_tools::{Tool, ToolError, ToolOutput, ToolProvider, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::transport::JsonTransport;

/// Trading API root.
pub const DEFAULT_BASE_URL: &str = "https://trade-api.gateway.uniswap.org/v1";

const PROVIDER: &str = "uniswap";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Operation {
    CheckApproval,
    Quote,
}

impl Operation {
    const ALL: [Self; 2] = [Self::CheckApproval, Self::Quote];

    const fn name(self) -> &'static str {
        match self {
            Self::CheckApproval => "uniswap.check_approval",
            Self::Quote => "uniswap.get_quote",
        }
    }

    const fn path(self) -> &'static str {
        match self {
            Self::CheckApproval => "check_approval",
            Self::Quote => "quote",
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApprovalArgs {
    wallet_address: String,
    token: String,
    amount: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteArgs {
    wallet_address: String,
    token_in: String,
    token_out: String,
    amount: String,
}

/// Provider exposing approval checks and exact-input quotes on one network.
#[derive(Clone)]
pub struct UniswapProvider {
    transport: Arc<dyn JsonTransport>,
    base_url: Arc<str>,
    api_key: Arc<str>,
    network: Network,
    wallet_address: Arc<str>,
}

impl UniswapProvider {
    /// Creates a provider from swap settings.
    #[must_use]
    pub fn new(transport: Arc<dyn JsonTransport>, settings: &SwapSettings) -> Self {
        Self {
            transport,
            base_url: Arc::from(DEFAULT_BASE_URL),
            api_key: Arc::from(settings.api_key.expose()),
            network: settings.network,
            wallet_address: Arc::from(settings.wallet_address.as_str()),
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
impl ToolProvider for UniswapProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn list(&self) -> ToolResult<Vec<Arc<dyn Tool>>> {
        Ok(Operation::ALL
            .into_iter()
            .map(|operation| {
                Arc::new(UniswapTool {
                    operation,
                    description: describe(operation, self.network, &self.wallet_address),
                    provider: self.clone(),
                }) as Arc<dyn Tool>
            })
            .collect())
    }
}

fn describe(operation: Operation, network: Network, wallet: &str) -> String {
    let summary = match operation {
        Operation::CheckApproval => {
            "Check whether the wallet has approved the router to spend `amount` of `token`, \
            returning the approval transaction if one is needed."
        }
        Operation::Quote => {
            "Get an exact-input swap quote for `amount` of `tokenIn` into `tokenOut`."
        }
    };
    format!(
        "{summary} Runs on {network} (chain id {}). Amounts are in the token's smallest unit. \
         Pass walletAddress {wallet} unless the user names another wallet.",
        network.chain_id()
    )
}

struct UniswapTool {
    operation: Operation,
    description: String,
    provider: UniswapProvider,
}

impl UniswapTool {
    fn body(&self, args: Value) -> ToolResult<Value> {
        let chain_id = self.provider.network.chain_id();
        let body = match self.operation {
            Operation::CheckApproval => {
                let ApprovalArgs {
                    wallet_address,
                    token,
                    amount,
                } = parse(args)?;
                json!({
                    "walletAddress": wallet_address,
                    "token": token,
                    "amount": amount,
                    "chainId": chain_id,
                })
            }
            Operation::Quote => {
                let QuoteArgs {
                    wallet_address,
                    token_in,
                    token_out,
                    amount,
                } = parse(args)?;
                json!({
                    "type": "EXACT_INPUT",
                    "tokenIn": token_in,
                    "tokenOut": token_out,
                    "amount": amount,
                    "tokenInChainId": chain_id,
                    "tokenOutChainId": chain_id,
                    "swapper": wallet_address,
                })
            }
        };
        Ok(body)
    }
}

#[async_trait]
impl Tool for UniswapTool {
    fn name(&self) -> &str {
        self.operation.name()
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Value {
        let wallet = json!({"type": "string", "description": "Wallet the request is made for"});
        match self.operation {
            Operation::CheckApproval => json!({
                "type": "object",
                "properties": {
                    "walletAddress": wallet,
                    "token": {"type": "string", "description": "Token contract address"},
                    "amount": {"type": "string", "description": "Amount in smallest unit"}
                },
                "required": ["token", "amount"]
            }),
            Operation::Quote => json!({
                "type": "object",
                "properties": {
                    "walletAddress": wallet,
                    "tokenIn": {"type": "string", "description": "Input token contract address"},
                    "tokenOut": {"type": "string", "description": "Output token contract address"},
                    "amount": {"type": "string", "description": "Input amount in smallest unit"}
                },
                "required": ["tokenIn", "tokenOut", "amount"]
            }),
        }
    }

    async fn execute(&self, args: Value) -> ToolResult<ToolOutput> {
        let body = self.body(args)?;
        let url = format!("{}/{}", self.provider.base_url, self.operation.path());
        let headers = [("x-api-key", &*self.provider.api_key)];
        let response = self.provider.transport.post(&url, &headers, &body).await?;
        Ok(ToolOutput::Structured(response))
    }
}

fn parse<T: for<'de> Deserialize<'de>>(args: Value) -> ToolResult<T> {
    serde_json::from_value(args).map_err(|err| ToolError::invalid_input(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_config::Secret;

    use crate::transport::testing::RecordingTransport;

    const WALLET: &str = "0x1111111111111111111111111111111111111111";

    fn settings() -> SwapSettings {
        SwapSettings {
            api_key: Secret::new("uni-key"),
            wallet_address: WALLET.into(),
            network: Network::Base,
        }
    }

    async fn tool(transport: &Arc<RecordingTransport>, name: &str) -> Arc<dyn Tool> {
        UniswapProvider::new(transport.clone(), &settings())
            .with_base_url("https://uni.test")
            .list()
            .await
            .unwrap()
            .into_iter()
            .find(|tool| tool.name() == name)
            .expect("tool listed")
    }

    #[tokio::test]
    async fn quote_posts_exact_input_on_selected_chain() {
        let transport = Arc::new(RecordingTransport::replying(vec![Ok(
            json!({"quote": {"output": "42"}}),
        )]));
        let tool = tool(&transport, "uniswap.get_quote").await;

        let output = tool
            .execute(json!({
                "walletAddress": WALLET,
                "tokenIn": "0xin",
                "tokenOut": "0xout",
                "amount": "1000"
            }))
            .await
            .unwrap();

        assert_eq!(output, ToolOutput::Structured(json!({"quote": {"output": "42"}})));
        let request = transport.last();
        assert_eq!(request.method, "POST");
        assert_eq!(request.url, "https://uni.test/quote");
        assert_eq!(request.headers, vec![("x-api-key".to_owned(), "uni-key".to_owned())]);
        assert_eq!(
            request.body.unwrap(),
            json!({
                "type": "EXACT_INPUT",
                "tokenIn": "0xin",
                "tokenOut": "0xout",
                "amount": "1000",
                "tokenInChainId": 8453,
                "tokenOutChainId": 8453,
                "swapper": WALLET,
            })
        );
    }

    #[tokio::test]
    async fn approval_carries_chain_id() {
        let transport = Arc::new(RecordingTransport::default());
        let tool = tool(&transport, "uniswap.check_approval").await;

        tool.execute(json!({"walletAddress": WALLET, "token": "0xt", "amount": "5"}))
            .await
            .unwrap();

        let request = transport.last();
        assert_eq!(request.url, "https://uni.test/check_approval");
        assert_eq!(request.body.unwrap()["chainId"], 8453);
    }

    #[tokio::test]
    async fn description_names_network_and_wallet() {
        let transport = Arc::new(RecordingTransport::default());
        let tool = tool(&transport, "uniswap.get_quote").await;

        assert!(tool.description().contains("base (chain id 8453)"));
        assert!(tool.description().contains(WALLET));
        assert_eq!(tool.parameters()["required"], json!(["tokenIn", "tokenOut", "amount"]));
    }

    #[tokio::test]
    async fn missing_fields_are_invalid_input() {
        let transport = Arc::new(RecordingTransport::default());
        let tool = tool(&transport, "uniswap.get_quote").await;

        let err = tool.execute(json!({"tokenIn": "0xin"})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput { .. }));
        assert!(transport.requests.lock().unwrap().is_empty());
    }
}
