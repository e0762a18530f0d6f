//! Production-grade `OpenAI` adapter with function calling.

use std::{fmt, time::Duration};

use agent_primitives::CapabilitySpec;
use async_trait::async_trait;
use futures::stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::http::HttpsClient;
use crate::traits::{
    AdapterError, AdapterMetadata, AdapterResult, AdapterStream, InferenceChunk, InferenceRequest,
    MessageRole, ModelAdapter, PromptMessage, ToolCall,
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for the `OpenAI` adapter.
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    api_key: Option<String>,
    model: String,
    base_url: String,
    default_temperature: Option<f32>,
}

impl OpenAiConfig {
    /// Creates a configuration using the supplied model identifier.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            api_key: None,
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            default_temperature: None,
        }
    }

    /// Overrides the base URL used for API calls.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if the supplied URL is invalid.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> AdapterResult<Self> {
        let sanitized = sanitize_base_url(base_url.as_ref())?;
        self.base_url = sanitized;
        Ok(self)
    }

    /// Sets the default sampling temperature used when requests omit it.
    #[must_use]
    pub fn with_default_temperature(mut self, temperature: f32) -> Self {
        self.default_temperature = Some(temperature);
        self
    }

    /// Supplies an explicit API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

/// `OpenAI` adapter that calls the chat completions API over HTTPS.
pub struct OpenAiAdapter {
    client: HttpsClient,
    endpoint: String,
    metadata: AdapterMetadata,
    api_key: String,
    default_temperature: Option<f32>,
}

impl fmt::Debug for OpenAiAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiAdapter")
            .field("model", &self.metadata.model())
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl OpenAiAdapter {
    /// Constructs a new adapter with the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if the API key is missing.
    pub fn new(config: OpenAiConfig) -> AdapterResult<Self> {
        let api_key = config
            .api_key
            .ok_or_else(|| AdapterError::configuration("OpenAI adapter requires an API key"))?;

        Ok(Self {
            client: HttpsClient::new(REQUEST_TIMEOUT),
            endpoint: format!("{}v1/chat/completions", config.base_url),
            metadata: AdapterMetadata::new("openai", config.model),
            api_key,
            default_temperature: config.default_temperature,
        })
    }

    fn build_request(&self, request: &InferenceRequest) -> ChatCompletionRequest {
        let system = request
            .system_prompt()
            .map(|prompt| OpenAiMessage::plain("system", prompt));
        let messages = system
            .into_iter()
            .chain(request.messages().iter().map(map_prompt_message))
            .collect();

        let tools: Vec<OpenAiTool> = request.tools().iter().map(map_capability).collect();
        let tool_choice = (!tools.is_empty()).then_some("auto");

        ChatCompletionRequest {
            model: self.metadata.model().to_owned(),
            messages,
            temperature: request.temperature().or(self.default_temperature),
            stream: false,
            tools,
            tool_choice,
        }
    }
}

#[async_trait]
impl ModelAdapter for OpenAiAdapter {
    fn metadata(&self) -> &AdapterMetadata {
        &self.metadata
    }

    async fn infer(&self, request: InferenceRequest) -> AdapterResult<AdapterStream> {
        let payload = self.build_request(&request);
        let authorization = format!("Bearer {}", self.api_key);

        let response = self
            .client
            .post_json(&self.endpoint, &[("authorization", authorization.as_str())], &payload)
            .await?;

        if response.status() == 429 {
            return Err(AdapterError::RateLimited { retry_after: None });
        }

        if !response.is_success() {
            return Err(AdapterError::Response {
                reason: format!("OpenAI returned {}: {}", response.status(), response.text()),
            });
        }

        let response: ChatCompletionResponse =
            serde_json::from_slice(response.body()).map_err(|err| AdapterError::Response {
                reason: format!("failed to decode OpenAI response: {err}"),
            })?;

        let chunk = decode_choice(response);
        debug!(tool_calls = chunk.tool_calls.len(), "OpenAI completion received");

        let stream = stream::once(async move { Ok(chunk) });
        Ok(Box::pin(stream))
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(default)]
    stream: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<OpenAiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: String,
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<OpenAiToolCall>,
}

impl OpenAiMessage {
    fn plain(role: &str, content: &str) -> Self {
        Self {
            role: role.to_owned(),
            content: Some(content.to_owned()),
            tool_call_id: None,
            tool_calls: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct OpenAiTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: OpenAiFunction,
}

#[derive(Debug, Serialize)]
struct OpenAiFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: OpenAiFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

fn function_kind() -> String {
    "function".to_owned()
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<OpenAiToolCall>,
}

fn map_prompt_message(message: &PromptMessage) -> OpenAiMessage {
    let tool_calls: Vec<OpenAiToolCall> = message
        .tool_calls()
        .iter()
        .map(|call| OpenAiToolCall {
            id: call.id.clone(),
            kind: function_kind(),
            function: OpenAiFunctionCall {
                name: call.name.clone(),
                arguments: call.arguments.to_string(),
            },
        })
        .collect();

    // Assistant turns that only call tools carry no content.
    let content = if message.role() == MessageRole::Assistant
        && !tool_calls.is_empty()
        && message.content().is_empty()
    {
        None
    } else {
        Some(message.content().to_owned())
    };

    OpenAiMessage {
        role: message.role().to_string(),
        content,
        tool_call_id: message.tool_call_id().map(str::to_owned),
        tool_calls,
    }
}

fn map_capability(spec: &CapabilitySpec) -> OpenAiTool {
    OpenAiTool {
        kind: "function",
        function: OpenAiFunction {
            name: spec.name().to_string(),
            description: spec.description().to_owned(),
            parameters: spec.parameters().clone(),
        },
    }
}

fn decode_choice(response: ChatCompletionResponse) -> InferenceChunk {
    let Some(message) = response
        .choices
        .into_iter()
        .find_map(|choice| choice.message)
    else {
        return InferenceChunk::new(String::new(), true);
    };

    let tool_calls = message
        .tool_calls
        .into_iter()
        .map(|call| {
            let arguments = decode_arguments(&call.function.arguments);
            ToolCall::new(call.id, call.function.name, arguments)
        })
        .collect();

    InferenceChunk::new(message.content.unwrap_or_default(), true).with_tool_calls(tool_calls)
}

/// Malformed argument strings are forwarded verbatim so the tool reports them.
fn decode_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Object(serde_json::Map::new());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

fn sanitize_base_url(input: &str) -> AdapterResult<String> {
    let mut base = input.trim().to_owned();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(AdapterError::configuration(
            "OpenAI base URL must start with http:// or https://",
        ));
    }
    if !base.ends_with('/') {
        base.push('/');
    }
    base.parse::<hyper::Uri>()
        .map_err(|err| AdapterError::configuration(format!("invalid OpenAI base URL: {err}")))?;
    Ok(base)
}
