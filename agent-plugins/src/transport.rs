//! JSON-over-HTTPS transport used by the providers.

use std::time::Duration;

use agent_adapters::http::{HttpResponse, HttpsClient};
use agent_tools::{ToolError, ToolResult};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Request/response channel for JSON APIs.
#[async_trait]
pub trait JsonTransport: Send + Sync {
    /// Issues a `GET` and decodes the JSON response.
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> ToolResult<Value>;

    /// Issues a `POST` with a JSON body and decodes the JSON response.
    async fn post(&self, url: &str, headers: &[(&str, &str)], body: &Value) -> ToolResult<Value>;
}

/// [`JsonTransport`] backed by the shared rustls client.
#[derive(Debug, Clone)]
pub struct HttpsJsonTransport {
    client: HttpsClient,
}

impl HttpsJsonTransport {
    /// Creates a transport with the default request timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_client(HttpsClient::new(DEFAULT_TIMEOUT))
    }

    /// Wraps an existing client.
    #[must_use]
    pub fn with_client(client: HttpsClient) -> Self {
        Self { client }
    }
}

impl Default for HttpsJsonTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JsonTransport for HttpsJsonTransport {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> ToolResult<Value> {
        debug!(%url, "GET");
        let response = self
            .client
            .get(url, headers)
            .await
            .map_err(|err| ToolError::execution(err.to_string()))?;
        decode(&response)
    }

    async fn post(&self, url: &str, headers: &[(&str, &str)], body: &Value) -> ToolResult<Value> {
        debug!(%url, "POST");
        let response = self
            .client
            .post_json(url, headers, body)
            .await
            .map_err(|err| ToolError::execution(err.to_string()))?;
        decode(&response)
    }
}

fn decode(response: &HttpResponse) -> ToolResult<Value> {
    if !response.is_success() {
        return Err(ToolError::execution(format!(
            "upstream returned HTTP {}: {}",
            response.status(),
            response.text()
        )));
    }

    serde_json::from_slice(response.body())
        .map_err(|err| ToolError::execution(format!("upstream returned invalid JSON: {err}")))
}
