//! Runtime registry resolving capability names back to their tools.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use agent_primitives::FormattedName;
use arc_swap::ArcSwap;

use crate::tool::Tool;

type Snapshot = HashMap<FormattedName, Arc<dyn Tool>>;

/// Outcome of a registry lookup.
#[derive(Clone)]
pub enum Resolution {
    /// A tool is registered under the requested name.
    Found(Arc<dyn Tool>),
    /// Nothing is registered under the requested name.
    NotFound,
}

impl Resolution {
    /// Converts the resolution into an `Option`.
    #[must_use]
    pub fn into_option(self) -> Option<Arc<dyn Tool>> {
        match self {
            Self::Found(tool) => Some(tool),
            Self::NotFound => None,
        }
    }

    /// Returns `true` if a tool was found.
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found(tool) => f.debug_tuple("Found").field(&tool.name()).finish(),
            Self::NotFound => f.write_str("NotFound"),
        }
    }
}

/// Registry mapping formatted names to the tools that serve them.
///
/// Reads load an immutable snapshot and never block. Writes install a new
/// snapshot, so a reload running next to in-flight invocations is safe.
/// Exactly one tool is addressable per name: the last registration wins.
pub struct ToolRegistry {
    inner: ArcSwap<Snapshot>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self {
            inner: ArcSwap::from_pointee(Snapshot::new()),
        }
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("registered", &self.names())
            .finish()
    }
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `tool` under `name`, returning the tool it shadowed, if any.
    ///
    /// Registration never fails; a collision silently replaces the earlier entry.
    pub fn register(&self, name: FormattedName, tool: Arc<dyn Tool>) -> Option<Arc<dyn Tool>> {
        let mut shadowed = None;
        self.inner.rcu(|current| {
            let mut next = Snapshot::clone(current);
            shadowed = next.insert(name.clone(), Arc::clone(&tool));
            next
        });
        shadowed
    }

    /// Atomically replaces every registration with `entries`.
    pub fn replace_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (FormattedName, Arc<dyn Tool>)>,
    {
        let snapshot: Snapshot = entries.into_iter().collect();
        self.inner.store(Arc::new(snapshot));
    }

    /// Looks up the tool registered under `name`.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Resolution {
        match self.inner.load().get(name) {
            Some(tool) => Resolution::Found(Arc::clone(tool)),
            None => Resolution::NotFound,
        }
    }

    /// Returns the registered names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<FormattedName> {
        let mut names: Vec<_> = self.inner.load().keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the number of registered names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.load().len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.load().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use agent_primitives::format_name;
    use serde_json::{Value, json};

    use crate::tool::{FnTool, ToolOutput};

    fn tool(name: &str, reply: &'static str) -> Arc<dyn Tool> {
        Arc::new(FnTool::new(name, "test tool", json!({}), move |_: Value| async move {
            Ok(ToolOutput::from(reply))
        }))
    }

    #[test]
    fn resolves_registered_tool() {
        let registry = ToolRegistry::new();
        assert!(registry.register(format_name("dex.search"), tool("dex.search", "ok")).is_none());

        let found = registry.resolve("dex_search").into_option().expect("registered");
        assert_eq!(found.name(), "dex.search");
    }

    #[test]
    fn missing_name_is_not_found() {
        let registry = ToolRegistry::new();
        assert!(matches!(registry.resolve("missing"), Resolution::NotFound));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn last_registration_wins() {
        let registry = ToolRegistry::new();
        registry.register(format_name("a.b_c"), tool("a.b_c", "first"));
        let shadowed = registry
            .register(format_name("a_b.c"), tool("a_b.c", "second"))
            .expect("collision reported");
        assert_eq!(shadowed.name(), "a.b_c");
        assert_eq!(registry.len(), 1);

        let winner = registry.resolve("a_b_c").into_option().unwrap();
        let output = winner.execute(Value::Null).await.unwrap();
        assert_eq!(output, ToolOutput::from("second"));
    }

    #[test]
    fn replace_all_swaps_snapshot() {
        let registry = ToolRegistry::new();
        registry.register(format_name("old"), tool("old", "x"));

        registry.replace_all([(format_name("new.one"), tool("new.one", "y"))]);

        assert!(!registry.resolve("old").is_found());
        assert!(registry.resolve("new_one").is_found());
        assert_eq!(registry.names(), vec![format_name("new.one")]);
    }
}
