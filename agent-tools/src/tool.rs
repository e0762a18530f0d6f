//! Tool and provider contracts consumed by the bridge.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ToolResult;

/// Value returned by a tool: either text or a structured JSON document.
#[derive(Clone, Debug, PartialEq)]
pub enum ToolOutput {
    /// Already textual output, passed through unchanged.
    Text(String),
    /// Structured output, pretty-printed before it reaches the host.
    Structured(Value),
}

impl ToolOutput {
    /// Renders the output into the text handed back across the capability boundary.
    ///
    /// # Errors
    ///
    /// Propagates serializer failures for structured values.
    pub fn render(self) -> Result<String, serde_json::Error> {
        match self {
            Self::Text(text) | Self::Structured(Value::String(text)) => Ok(text),
            Self::Structured(value) => serde_json::to_string_pretty(&value),
        }
    }
}

impl From<String> for ToolOutput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for ToolOutput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<Value> for ToolOutput {
    fn from(value: Value) -> Self {
        Self::Structured(value)
    }
}

/// Externally provided, independently invocable function.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Provider-qualified name, possibly containing namespace separators.
    fn name(&self) -> &str;

    /// Human-readable description forwarded to the model.
    fn description(&self) -> &str;

    /// JSON schema of the accepted arguments.
    fn parameters(&self) -> Value;

    /// Executes the tool with the supplied arguments.
    async fn execute(&self, args: Value) -> ToolResult<ToolOutput>;
}

/// Source of tools discovered at setup time.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Short provider name used in logs and discovery errors.
    fn name(&self) -> &str;

    /// Lists the tools this provider exposes.
    async fn list(&self) -> ToolResult<Vec<Arc<dyn Tool>>>;
}

/// Tool backed by an async closure.
pub struct FnTool<F> {
    name: String,
    description: String,
    parameters: Value,
    func: F,
}

impl<F, Fut> FnTool<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = ToolResult<ToolOutput>> + Send,
{
    /// Wraps `func` as a tool with the given metadata.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
        func: F,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            func,
        }
    }
}

impl<F> fmt::Debug for FnTool<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTool")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> Tool for FnTool<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = ToolResult<ToolOutput>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Value {
        self.parameters.clone()
    }

    async fn execute(&self, args: Value) -> ToolResult<ToolOutput> {
        (self.func)(args).await
    }
}
