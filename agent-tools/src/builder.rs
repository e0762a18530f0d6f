//! Converts discovered tools into registered capabilities.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use agent_primitives::{CapabilitySpec, MAX_DESCRIPTION_CHARS, TRUNCATION_SUFFIX, format_name};
use tracing::{debug, warn};

use crate::capability::Capability;
use crate::dispatcher::ExecutionDispatcher;
use crate::policy::SelectionPolicy;
use crate::tool::Tool;

/// Builds capabilities and registers their tools with the dispatcher's registry.
///
/// Building is not pure: each accepted tool is written to the registry, and a
/// later tool formatting to the same name shadows the earlier one.
#[derive(Debug, Clone)]
pub struct CapabilityBuilder {
    dispatcher: Arc<ExecutionDispatcher>,
}

impl CapabilityBuilder {
    /// Creates a builder that registers into `dispatcher`'s registry.
    #[must_use]
    pub fn new(dispatcher: Arc<ExecutionDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Builds one capability, or returns `None` when `policy` skips the tool.
    #[must_use]
    pub fn build(&self, tool: Arc<dyn Tool>, policy: &SelectionPolicy) -> Option<Capability> {
        let Some(base) = policy.select(tool.name()) else {
            debug!(tool = tool.name(), "tool skipped by selection policy");
            return None;
        };

        let name = format_name(&base);
        if name.as_str().is_empty() {
            warn!(tool = tool.name(), "tool with an empty name skipped");
            return None;
        }
        let spec = CapabilitySpec::new(
            name.clone(),
            truncate_description(tool.description()),
            tool.parameters(),
        );

        let provider_name = tool.name().to_owned();
        let registered = Arc::clone(&tool);
        if let Some(shadowed) = self.dispatcher.registry().register(name.clone(), tool) {
            if !Arc::ptr_eq(&shadowed, &registered) {
                warn!(
                    capability = %name,
                    shadowed = shadowed.name(),
                    winner = %provider_name,
                    "capability name collision; last registration wins"
                );
            }
        }

        debug!(capability = %name, tool = %provider_name, "capability built");
        Some(Capability::new(spec, Arc::clone(&self.dispatcher)))
    }

    /// Builds every accepted tool, yielding one capability per distinct name.
    ///
    /// On collision the later capability replaces the earlier one in the
    /// earlier one's position, matching what the registry resolves to.
    pub fn build_all<I>(&self, tools: I, policy: &SelectionPolicy) -> Vec<Capability>
    where
        I: IntoIterator<Item = Arc<dyn Tool>>,
    {
        let mut capabilities: Vec<Capability> = Vec::new();
        let mut positions = HashMap::new();

        for tool in tools {
            let Some(capability) = self.build(tool, policy) else {
                continue;
            };
            match positions.get(capability.name()) {
                Some(&index) => capabilities[index] = capability,
                None => {
                    positions.insert(capability.name().clone(), capabilities.len());
                    capabilities.push(capability);
                }
            }
        }

        capabilities
    }
}

/// Cuts descriptions longer than [`MAX_DESCRIPTION_CHARS`] characters and
/// appends [`TRUNCATION_SUFFIX`].
#[must_use]
pub fn truncate_description(description: &str) -> Cow<'_, str> {
    match description.char_indices().nth(MAX_DESCRIPTION_CHARS) {
        Some((cut, _)) => Cow::Owned(format!("{}{TRUNCATION_SUFFIX}", &description[..cut])),
        None => Cow::Borrowed(description),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io;
    use std::sync::Mutex;

    use agent_primitives::format_name;
    use serde_json::{Value, json};

    use crate::registry::ToolRegistry;
    use crate::tool::{FnTool, ToolOutput};

    fn builder() -> CapabilityBuilder {
        let registry = Arc::new(ToolRegistry::new());
        CapabilityBuilder::new(Arc::new(ExecutionDispatcher::new(registry)))
    }

    fn tool(name: &str, description: &str, reply: &'static str) -> Arc<dyn Tool> {
        Arc::new(FnTool::new(
            name,
            description,
            json!({"type": "object", "properties": {}}),
            move |_: Value| async move { Ok(ToolOutput::from(reply)) },
        ))
    }

    #[tokio::test]
    async fn build_registers_and_runs() {
        let builder = builder();
        let capability = builder
            .build(
                Arc::new(FnTool::new("dex.search_pairs", "Search", json!({}), |_| async {
                    Ok(ToolOutput::from(json!({"price": 1.23})))
                })),
                &SelectionPolicy::accept_all(),
            )
            .expect("accepted");

        assert_eq!(capability.name().as_str(), "dex_search_pairs");
        let registered = builder
            .dispatcher
            .registry()
            .resolve("dex_search_pairs")
            .into_option()
            .expect("registered");
        assert_eq!(registered.name(), "dex.search_pairs");

        let reply = capability.run(json!({})).await;
        assert_eq!(reply, "{\n  \"price\": 1.23\n}");
    }

    #[test]
    fn skipped_tools_are_not_registered() {
        let builder = builder();
        let policy = SelectionPolicy::accept_all().allow_prefix("allora.");
        assert!(builder.build(tool("dex.search", "", "x"), &policy).is_none());
        assert!(builder.dispatcher.registry().is_empty());
    }

    #[test]
    fn empty_names_are_not_registered() {
        let builder = builder();
        assert!(builder.build(tool("", "nameless", "x"), &SelectionPolicy::accept_all()).is_none());
        assert!(builder.dispatcher.registry().is_empty());
    }

    #[test]
    fn aliased_name_is_formatted() {
        let builder = builder();
        let policy = SelectionPolicy::accept_all().alias(["get_quote"], "uniswap.get_swap_quote");
        let capability = builder
            .build(tool("uniswap.get_quote", "", "x"), &policy)
            .expect("accepted");
        assert_eq!(capability.name(), &format_name("uniswap.get_swap_quote"));
    }

    #[test]
    fn long_description_is_truncated() {
        let builder = builder();
        let description = "é".repeat(MAX_DESCRIPTION_CHARS + 250);
        let capability = builder
            .build(tool("big.tool", &description, "x"), &SelectionPolicy::accept_all())
            .expect("accepted");

        let expected = format!("{}{TRUNCATION_SUFFIX}", "é".repeat(MAX_DESCRIPTION_CHARS));
        assert_eq!(capability.description(), expected);
        assert!(!capability.spec().is_oversized());
    }

    #[test]
    fn boundary_description_is_untouched() {
        let description = "a".repeat(MAX_DESCRIPTION_CHARS);
        assert!(matches!(truncate_description(&description), Cow::Borrowed(_)));
    }

    #[tokio::test]
    async fn colliding_names_keep_last_tool() {
        let builder = builder();
        let capabilities = builder.build_all(
            [
                tool("a.b_c", "first", "first"),
                tool("other.tool", "", "other"),
                tool("a_b.c", "second", "second"),
            ],
            &SelectionPolicy::accept_all(),
        );

        assert_eq!(capabilities.len(), 2);
        assert_eq!(capabilities[0].name().as_str(), "a_b_c");
        assert_eq!(capabilities[0].description(), "second");
        assert_eq!(capabilities[0].run(json!({})).await, "second");
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn collisions_logged(build: impl FnOnce()) -> usize {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        tracing::subscriber::with_default(subscriber, build);
        logs.contents().matches("capability name collision").count()
    }

    #[test]
    fn same_qualified_name_from_two_providers_is_logged() {
        let builder = builder();
        let policy = SelectionPolicy::accept_all();

        let logged = collisions_logged(|| {
            assert!(builder.build(tool("dex.search", "", "first"), &policy).is_some());
            assert!(builder.build(tool("dex.search", "", "second"), &policy).is_some());
        });

        assert_eq!(logged, 1);
    }

    #[test]
    fn rebuilding_the_same_tool_is_not_a_collision() {
        let builder = builder();
        let policy = SelectionPolicy::accept_all();
        let shared = tool("dex.search", "", "only");

        let logged = collisions_logged(|| {
            assert!(builder.build(Arc::clone(&shared), &policy).is_some());
            assert!(builder.build(Arc::clone(&shared), &policy).is_some());
        });

        assert_eq!(logged, 0);
    }

    #[tokio::test]
    async fn rebuilding_rebinds_existing_capability() {
        let builder = builder();
        let policy = SelectionPolicy::accept_all();
        let first = builder.build(tool("x.y", "", "old"), &policy).unwrap();
        builder.build(tool("x_y", "", "new"), &policy).unwrap();

        assert_eq!(first.run(Value::Null).await, "new");
    }
}
