//! Conversation host that offers capabilities to a model and runs its tool calls.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use agent_adapters::traits::{
    AdapterError, InferenceRequest, MessageRole, ModelAdapter, PromptMessage, ToolCall,
};
use agent_primitives::CapabilitySpec;
use agent_tools::Capability;
use async_trait::async_trait;
use futures::StreamExt;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::scheduler::{InvocationScheduler, SchedulerError};

const DEFAULT_MAX_TOOL_ROUNDS: usize = 4;

/// Result alias for host operations.
pub type HostResult<T> = Result<T, HostError>;

/// Errors surfaced by a capability host.
#[derive(Debug, Error)]
pub enum HostError {
    /// The host needs at least one capability.
    #[error("host requires at least one capability")]
    NoCapabilities,

    /// The completion backend failed.
    #[error("adapter `{provider}` for model `{model}` error: {source}")]
    Adapter {
        /// Adapter provider identifier.
        provider: &'static str,
        /// Model identifier.
        model: String,
        /// Underlying adapter failure.
        #[source]
        source: AdapterError,
    },

    /// The model kept requesting tools past the configured number of rounds.
    #[error("model requested tools for more than {limit} rounds")]
    ToolRoundsExceeded {
        /// Configured round limit.
        limit: usize,
    },
}

/// Text result of one tool call made during a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallResult {
    /// Backend call identifier.
    pub call_id: String,
    /// Capability name the model asked for.
    pub name: String,
    /// Text handed back to the model.
    pub output: String,
}

/// Outcome of a processed user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    response: String,
    tool_results: Vec<ToolCallResult>,
}

impl TurnOutcome {
    /// Returns the final model response text.
    #[must_use]
    pub fn response(&self) -> &str {
        &self.response
    }

    /// Returns every tool call executed during the turn, in request order.
    #[must_use]
    pub fn tool_results(&self) -> &[ToolCallResult] {
        &self.tool_results
    }
}

/// Consumer of an ordered capability set.
#[async_trait]
pub trait CapabilityHost: Send + Sync {
    /// Installs the capabilities offered on every turn.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::NoCapabilities`] for an empty sequence.
    fn add_capabilities(&mut self, capabilities: Vec<Capability>) -> HostResult<()>;

    /// Processes one user input and returns the model's reply.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the backend fails or the turn cannot finish.
    async fn process(&self, input: &str) -> HostResult<TurnOutcome>;
}

/// Single-turn host backed by a [`ModelAdapter`].
///
/// No conversation history survives a turn. Tool calls requested in one model
/// response run concurrently on the [`InvocationScheduler`]; their results are
/// fed back as tool messages until the model answers without calls.
pub struct ConversationHost {
    adapter: Arc<dyn ModelAdapter>,
    capabilities: Vec<Capability>,
    by_name: HashMap<String, usize>,
    system_prompt: Option<String>,
    temperature: Option<f32>,
    max_tool_rounds: usize,
    scheduler: InvocationScheduler,
}

impl fmt::Debug for ConversationHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let metadata = self.adapter.metadata();
        f.debug_struct("ConversationHost")
            .field("provider", &metadata.provider())
            .field("model", &metadata.model())
            .field("capabilities", &self.capabilities.len())
            .field("max_tool_rounds", &self.max_tool_rounds)
            .finish_non_exhaustive()
    }
}

impl ConversationHost {
    /// Creates a host with no capabilities installed.
    #[must_use]
    pub fn new(adapter: Arc<dyn ModelAdapter>) -> Self {
        Self {
            adapter,
            capabilities: Vec::new(),
            by_name: HashMap::new(),
            system_prompt: None,
            temperature: None,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            scheduler: InvocationScheduler::default(),
        }
    }

    /// Sets the system prompt sent with every request.
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Caps how many tool-calling rounds one turn may take.
    #[must_use]
    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    /// Replaces the invocation scheduler.
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: InvocationScheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Returns the installed capabilities in offer order.
    #[must_use]
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    fn request(
        &self,
        messages: Vec<PromptMessage>,
        tools: &[CapabilitySpec],
    ) -> HostResult<InferenceRequest> {
        let mut request = InferenceRequest::new(messages)
            .map_err(|err| self.adapter_error(err))?
            .with_tools(tools.to_vec());
        if let Some(prompt) = &self.system_prompt {
            request = request.with_system_prompt(prompt.clone());
        }
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        Ok(request)
    }

    async fn infer(&self, request: InferenceRequest) -> HostResult<(String, Vec<ToolCall>)> {
        let mut stream = self
            .adapter
            .infer(request)
            .await
            .map_err(|err| self.adapter_error(err))?;

        let mut response = String::new();
        let mut calls = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| self.adapter_error(err))?;
            response.push_str(&chunk.delta);
            calls.extend(chunk.tool_calls);
            if chunk.done {
                break;
            }
        }
        Ok((response, calls))
    }

    async fn run_calls(&self, calls: &[ToolCall]) -> Vec<ToolCallResult> {
        let mut pending = Vec::with_capacity(calls.len());
        for call in calls {
            let started = match self.by_name.get(&call.name) {
                Some(&index) => {
                    let capability = self.capabilities[index].clone();
                    let args = call.arguments.clone();
                    self.scheduler
                        .spawn(async move { capability.run(args).await })
                        .map_err(|err| not_scheduled(call, &err))
                }
                None => {
                    warn!(
                        capability = %call.name,
                        "model requested a capability that is not offered"
                    );
                    Err(format!("Error: capability `{}` is not offered", call.name))
                }
            };
            pending.push((call, started));
        }

        let mut results = Vec::with_capacity(pending.len());
        for (call, started) in pending {
            let output = match started {
                Err(text) => text,
                Ok(handle) => match handle.await {
                    Ok(Ok(text)) => text,
                    Ok(Err(err)) => not_scheduled(call, &err),
                    Err(err) => {
                        warn!(capability = %call.name, error = %err, "capability task failed");
                        format!("Error: `{}` failed: {err}", call.name)
                    }
                },
            };
            results.push(ToolCallResult {
                call_id: call.id.clone(),
                name: call.name.clone(),
                output,
            });
        }
        results
    }

    fn adapter_error(&self, source: AdapterError) -> HostError {
        let metadata = self.adapter.metadata();
        HostError::Adapter {
            provider: metadata.provider(),
            model: metadata.model().to_owned(),
            source,
        }
    }
}

fn not_scheduled(call: &ToolCall, err: &SchedulerError) -> String {
    warn!(capability = %call.name, error = %err, "capability was not scheduled");
    format!("Error: `{}` was not scheduled: {err}", call.name)
}

#[async_trait]
impl CapabilityHost for ConversationHost {
    fn add_capabilities(&mut self, capabilities: Vec<Capability>) -> HostResult<()> {
        if capabilities.is_empty() {
            return Err(HostError::NoCapabilities);
        }

        for capability in capabilities {
            let name = capability.name().as_str().to_owned();
            match self.by_name.get(&name) {
                Some(&index) => self.capabilities[index] = capability,
                None => {
                    self.by_name.insert(name, self.capabilities.len());
                    self.capabilities.push(capability);
                }
            }
        }

        info!(capabilities = self.capabilities.len(), "capabilities installed");
        Ok(())
    }

    async fn process(&self, input: &str) -> HostResult<TurnOutcome> {
        if self.capabilities.is_empty() {
            return Err(HostError::NoCapabilities);
        }

        let tools: Vec<CapabilitySpec> = self
            .capabilities
            .iter()
            .map(|capability| capability.spec().clone())
            .collect();
        let mut messages = vec![PromptMessage::new(MessageRole::User, input)];
        let mut tool_results = Vec::new();

        for round in 0..=self.max_tool_rounds {
            let request = self.request(messages.clone(), &tools)?;
            let (response, calls) = self.infer(request).await?;

            if calls.is_empty() {
                debug!(rounds = round, tool_calls = tool_results.len(), "turn complete");
                return Ok(TurnOutcome {
                    response,
                    tool_results,
                });
            }

            if round == self.max_tool_rounds {
                break;
            }

            debug!(round, calls = calls.len(), "running requested capabilities");
            let results = self.run_calls(&calls).await;
            messages.push(PromptMessage::assistant_tool_calls(response, calls));
            messages.extend(results.iter().map(|result| {
                PromptMessage::tool_result(result.call_id.clone(), result.output.clone())
            }));
            tool_results.extend(results);
        }

        Err(HostError::ToolRoundsExceeded {
            limit: self.max_tool_rounds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use agent_adapters::traits::{AdapterMetadata, AdapterResult, AdapterStream, InferenceChunk};
    use agent_tools::{
        CapabilityBuilder, ExecutionDispatcher, FnTool, SelectionPolicy, Tool, ToolOutput,
        ToolRegistry,
    };
    use futures::stream;
    use serde_json::{Value, json};

    struct ScriptedAdapter {
        metadata: AdapterMetadata,
        script: Mutex<VecDeque<InferenceChunk>>,
        requests: Mutex<Vec<InferenceRequest>>,
    }

    impl ScriptedAdapter {
        fn new(script: Vec<InferenceChunk>) -> Arc<Self> {
            Arc::new(Self {
                metadata: AdapterMetadata::new("test", "scripted"),
                script: Mutex::new(script.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<InferenceRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelAdapter for ScriptedAdapter {
        fn metadata(&self) -> &AdapterMetadata {
            &self.metadata
        }

        async fn infer(&self, request: InferenceRequest) -> AdapterResult<AdapterStream> {
            self.requests.lock().unwrap().push(request);
            let chunk = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| AdapterError::transport("script exhausted"))?;
            Ok(Box::pin(stream::once(async move { Ok(chunk) })))
        }
    }

    fn capabilities() -> Vec<Capability> {
        let dispatcher = Arc::new(ExecutionDispatcher::new(Arc::new(ToolRegistry::new())));
        let builder = CapabilityBuilder::new(dispatcher);
        let tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(FnTool::new(
                "dex.search_pairs",
                "Search pairs",
                json!({"type": "object"}),
                |_: Value| async { Ok(ToolOutput::from(json!({"price": 1.23}))) },
            )),
            Arc::new(FnTool::new(
                "math.double",
                "Double a number",
                json!({"type": "object"}),
                |args: Value| async move {
                    let n = args["n"].as_i64().unwrap_or_default();
                    Ok(ToolOutput::from((n * 2).to_string()))
                },
            )),
        ];
        builder.build_all(tools, &SelectionPolicy::accept_all())
    }

    fn host(adapter: Arc<ScriptedAdapter>) -> ConversationHost {
        let mut host = ConversationHost::new(adapter).with_system_prompt("be brief");
        host.add_capabilities(capabilities()).unwrap();
        host
    }

    #[tokio::test]
    async fn answers_without_tools() {
        let adapter = ScriptedAdapter::new(vec![InferenceChunk::new("hello", true)]);
        let outcome = host(adapter.clone()).process("hi").await.unwrap();

        assert_eq!(outcome.response(), "hello");
        assert!(outcome.tool_results().is_empty());

        let requests = adapter.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].system_prompt(), Some("be brief"));
        let offered: Vec<&str> = requests[0]
            .tools()
            .iter()
            .map(|spec| spec.name().as_str())
            .collect();
        assert_eq!(offered, ["dex_search_pairs", "math_double"]);
    }

    #[tokio::test]
    async fn runs_requested_calls_and_feeds_results_back() {
        let adapter = ScriptedAdapter::new(vec![
            InferenceChunk::new("", true).with_tool_calls(vec![
                ToolCall::new("c1", "dex_search_pairs", json!({"query": "X"})),
                ToolCall::new("c2", "math_double", json!({"n": 21})),
            ]),
            InferenceChunk::new("price is 1.23", true),
        ]);

        let outcome = host(adapter.clone()).process("price of X?").await.unwrap();

        assert_eq!(outcome.response(), "price is 1.23");
        let results = outcome.tool_results();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].call_id, "c1");
        assert_eq!(
            serde_json::from_str::<Value>(&results[0].output).unwrap(),
            json!({"price": 1.23})
        );
        assert_eq!(results[1].output, "42");

        let second = &adapter.requests()[1];
        let messages = second.messages();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1].tool_calls().len(), 2);
        assert_eq!(messages[2].role(), MessageRole::Tool);
        assert_eq!(messages[2].tool_call_id(), Some("c1"));
        assert_eq!(messages[3].content(), "42");
    }

    #[tokio::test]
    async fn unknown_capability_gets_error_text() {
        let adapter = ScriptedAdapter::new(vec![
            InferenceChunk::new("", true)
                .with_tool_calls(vec![ToolCall::new("c1", "nonexistent_tool", json!({}))]),
            InferenceChunk::new("sorry", true),
        ]);

        let outcome = host(adapter).process("do it").await.unwrap();

        assert_eq!(outcome.response(), "sorry");
        assert!(outcome.tool_results()[0].output.starts_with("Error:"));
    }

    #[tokio::test]
    async fn closed_scheduler_fails_only_the_call() {
        let adapter = ScriptedAdapter::new(vec![
            InferenceChunk::new("", true)
                .with_tool_calls(vec![ToolCall::new("c1", "math_double", json!({"n": 2}))]),
            InferenceChunk::new("could not run it", true),
        ]);
        let scheduler = InvocationScheduler::default();
        scheduler.close();
        let host = host(adapter).with_scheduler(scheduler);

        let outcome = host.process("double 2").await.unwrap();

        assert_eq!(outcome.response(), "could not run it");
        let output = &outcome.tool_results()[0].output;
        assert!(output.starts_with("Error:"), "{output}");
        assert!(output.contains("was not scheduled"), "{output}");
    }

    #[tokio::test]
    async fn stops_after_round_limit() {
        let looping = || {
            InferenceChunk::new("", true)
                .with_tool_calls(vec![ToolCall::new("c", "math_double", json!({"n": 1}))])
        };
        let adapter = ScriptedAdapter::new(vec![looping(), looping(), looping()]);
        let host = host(adapter.clone()).with_max_tool_rounds(2);

        let err = host.process("loop").await.unwrap_err();
        assert!(matches!(err, HostError::ToolRoundsExceeded { limit: 2 }));
        assert_eq!(adapter.requests().len(), 3);
    }

    #[tokio::test]
    async fn adapter_failure_is_reported() {
        let adapter = ScriptedAdapter::new(Vec::new());
        let err = host(adapter).process("hi").await.unwrap_err();
        assert!(matches!(err, HostError::Adapter { provider: "test", .. }));
    }

    #[tokio::test]
    async fn rejects_empty_capability_sets() {
        let adapter = ScriptedAdapter::new(vec![InferenceChunk::new("unused", true)]);
        let mut host = ConversationHost::new(adapter);

        assert!(matches!(host.add_capabilities(Vec::new()), Err(HostError::NoCapabilities)));
        assert!(matches!(host.process("hi").await, Err(HostError::NoCapabilities)));
    }

    #[test]
    fn re_adding_a_name_replaces_in_place() {
        let adapter = ScriptedAdapter::new(Vec::new());
        let mut host = ConversationHost::new(adapter);
        host.add_capabilities(capabilities()).unwrap();
        host.add_capabilities(capabilities()).unwrap();

        assert_eq!(host.capabilities().len(), 2);
    }
}
