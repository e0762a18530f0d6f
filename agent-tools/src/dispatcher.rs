//! Invocation path behind every capability.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use agent_primitives::InvocationId;
use futures::FutureExt;
use serde_json::Value;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::precondition::{Precondition, PreconditionViolation};
use crate::registry::{Resolution, ToolRegistry};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Failure of a single invocation. Never leaves the dispatcher as an `Err`;
/// it is rendered to text with [`DispatchError::to_message`].
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No tool is registered under the invoked name.
    #[error("capability `{name}` is not registered")]
    NotFound {
        /// Name that was invoked.
        name: String,
    },

    /// A precondition rejected the arguments; the tool was not called.
    #[error("{0}")]
    Precondition(#[from] PreconditionViolation),

    /// The tool returned an error.
    #[error("`{name}` failed: {reason}")]
    Execution {
        /// Capability name.
        name: String,
        /// Message reported by the tool.
        reason: String,
    },

    /// The tool did not finish within the configured limit.
    #[error("`{name}` timed out after {limit:?}")]
    Timeout {
        /// Capability name.
        name: String,
        /// Configured limit.
        limit: Duration,
    },

    /// The tool panicked while executing.
    #[error("`{name}` panicked: {message}")]
    Panicked {
        /// Capability name.
        name: String,
        /// Panic payload, when it was a string.
        message: String,
    },

    /// Structured output could not be serialized.
    #[error("failed to serialize output of `{name}`: {reason}")]
    Serialization {
        /// Capability name.
        name: String,
        /// Serializer error.
        reason: String,
    },
}

impl DispatchError {
    /// Text handed to the host in place of a tool result.
    #[must_use]
    pub fn to_message(&self) -> String {
        format!("Error: {self}")
    }
}

/// Tunables for the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    timeout: Option<Duration>,
}

impl DispatcherConfig {
    /// Creates a configuration with the supplied per-invocation timeout.
    #[must_use]
    pub const fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    /// Returns the per-invocation timeout, if any.
    #[must_use]
    pub const fn timeout(self) -> Option<Duration> {
        self.timeout
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self::new(Some(DEFAULT_TIMEOUT))
    }
}

/// Resolves, executes, and normalizes capability invocations.
pub struct ExecutionDispatcher {
    registry: Arc<ToolRegistry>,
    preconditions: Vec<Arc<dyn Precondition>>,
    config: DispatcherConfig,
}

impl fmt::Debug for ExecutionDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionDispatcher")
            .field("registry", &self.registry)
            .field("preconditions", &self.preconditions.len())
            .field("config", &self.config)
            .finish()
    }
}

impl ExecutionDispatcher {
    /// Creates a dispatcher over `registry` with default settings.
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            preconditions: Vec::new(),
            config: DispatcherConfig::default(),
        }
    }

    /// Replaces the dispatcher configuration.
    #[must_use]
    pub fn with_config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Adds a precondition checked before every execution.
    #[must_use]
    pub fn with_precondition(mut self, precondition: Arc<dyn Precondition>) -> Self {
        self.preconditions.push(precondition);
        self
    }

    /// Returns the registry this dispatcher resolves against.
    #[must_use]
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Invokes the tool registered under `name`.
    ///
    /// Always yields text: tool output on success, an `Error: ...` message
    /// otherwise. Concurrent invocations share nothing but the registry
    /// snapshot, so one failing call cannot affect another.
    pub async fn invoke(&self, name: &str, args: Value) -> String {
        let invocation_id = InvocationId::random();
        let started = Instant::now();

        match self.try_invoke(name, args).await {
            Ok(text) => {
                debug!(
                    capability = name,
                    %invocation_id,
                    elapsed_ms = elapsed_ms(started),
                    "capability invocation succeeded"
                );
                text
            }
            Err(err) => {
                warn!(
                    capability = name,
                    %invocation_id,
                    elapsed_ms = elapsed_ms(started),
                    error = %err,
                    "capability invocation failed"
                );
                err.to_message()
            }
        }
    }

    async fn try_invoke(&self, name: &str, args: Value) -> Result<String, DispatchError> {
        let Resolution::Found(tool) = self.registry.resolve(name) else {
            return Err(DispatchError::NotFound {
                name: name.to_owned(),
            });
        };

        for precondition in &self.preconditions {
            precondition.check(name, &args)?;
        }

        let execution = AssertUnwindSafe(tool.execute(args)).catch_unwind();
        let outcome = match self.config.timeout {
            Some(limit) => timeout(limit, execution)
                .await
                .map_err(|_| DispatchError::Timeout {
                    name: name.to_owned(),
                    limit,
                })?,
            None => execution.await,
        };

        let output = outcome
            .map_err(|payload| DispatchError::Panicked {
                name: name.to_owned(),
                message: panic_message(payload.as_ref()),
            })?
            .map_err(|err| DispatchError::Execution {
                name: name.to_owned(),
                reason: err.to_string(),
            })?;

        output.render().map_err(|err| DispatchError::Serialization {
            name: name.to_owned(),
            reason: err.to_string(),
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    use agent_primitives::format_name;
    use serde_json::json;

    use crate::error::ToolError;
    use crate::precondition::RequiredArgument;
    use crate::tool::{FnTool, Tool, ToolOutput};

    fn dispatcher_with(name: &str, tool: Arc<dyn Tool>) -> ExecutionDispatcher {
        let registry = Arc::new(ToolRegistry::new());
        registry.register(format_name(name), tool);
        ExecutionDispatcher::new(registry)
    }

    #[tokio::test]
    async fn unknown_name_returns_message_with_name() {
        let dispatcher = ExecutionDispatcher::new(Arc::new(ToolRegistry::new()));
        let reply = dispatcher.invoke("nonexistent_tool", json!({})).await;
        assert!(reply.starts_with("Error:"));
        assert!(reply.contains("nonexistent_tool"));
    }

    #[tokio::test]
    async fn structured_output_is_pretty_printed() {
        let tool = Arc::new(FnTool::new("dex.search_pairs", "", json!({}), |_| async {
            Ok(ToolOutput::from(json!({"price": 1.23})))
        }));
        let dispatcher = dispatcher_with("dex.search_pairs", tool);

        let reply = dispatcher.invoke("dex_search_pairs", json!({})).await;
        assert_eq!(reply, serde_json::to_string_pretty(&json!({"price": 1.23})).unwrap());
    }

    #[tokio::test]
    async fn tool_failure_message_is_embedded() {
        let tool = Arc::new(FnTool::new("dex.fail", "", json!({}), |_| async {
            Err::<ToolOutput, _>(ToolError::execution("upstream returned 502"))
        }));
        let dispatcher = dispatcher_with("dex.fail", tool);

        let reply = dispatcher.invoke("dex_fail", json!({})).await;
        assert!(reply.starts_with("Error:"));
        assert!(reply.contains("upstream returned 502"));
    }

    #[tokio::test]
    async fn panicking_tool_is_contained() {
        let tool = Arc::new(FnTool::new("dex.panic", "", json!({}), |_| async {
            if true {
                panic!("provider exploded");
            }
            Ok(ToolOutput::from("unreachable"))
        }));
        let dispatcher = dispatcher_with("dex.panic", tool);

        let reply = dispatcher.invoke("dex_panic", json!({})).await;
        assert!(reply.contains("provider exploded"));
    }

    #[tokio::test]
    async fn precondition_blocks_execution() {
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let tool = Arc::new(FnTool::new("uniswap.get_quote", "", json!({}), move |_| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            async { Ok(ToolOutput::from("quote")) }
        }));
        let dispatcher = dispatcher_with("uniswap.get_quote", tool)
            .with_precondition(Arc::new(RequiredArgument::new("uniswap_", "walletAddress")));

        let reply = dispatcher.invoke("uniswap_get_quote", json!({})).await;
        assert!(reply.contains("missing required argument"));
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);

        let reply = dispatcher
            .invoke("uniswap_get_quote", json!({"walletAddress": "0xabc"}))
            .await;
        assert_eq!(reply, "quote");
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_tool_times_out() {
        let tool = Arc::new(FnTool::new("slow.tool", "", json!({}), |_| async {
            futures::future::pending::<()>().await;
            Ok(ToolOutput::from("never"))
        }));
        let dispatcher = dispatcher_with("slow.tool", tool)
            .with_config(DispatcherConfig::new(Some(Duration::from_secs(5))));

        let reply = dispatcher.invoke("slow_tool", json!({})).await;
        assert!(reply.contains("timed out"));
    }

    #[tokio::test]
    async fn concurrent_failures_do_not_interfere() {
        let registry = Arc::new(ToolRegistry::new());
        registry.register(
            format_name("ok.tool"),
            Arc::new(FnTool::new("ok.tool", "", json!({}), |args: Value| async move {
                tokio::task::yield_now().await;
                Ok(ToolOutput::from(args))
            })),
        );
        registry.register(
            format_name("bad.tool"),
            Arc::new(FnTool::new("bad.tool", "", json!({}), |_| async {
                Err::<ToolOutput, _>(ToolError::execution("bad"))
            })),
        );
        let dispatcher = ExecutionDispatcher::new(registry);

        let (ok, bad) = tokio::join!(
            dispatcher.invoke("ok_tool", json!({"n": 1})),
            dispatcher.invoke("bad_tool", json!({}))
        );
        assert_eq!(serde_json::from_str::<Value>(&ok).unwrap(), json!({"n": 1}));
        assert!(bad.contains("bad"));
    }
}
