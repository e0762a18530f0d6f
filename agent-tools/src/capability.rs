//! Host-consumable wrappers around registered tools.

use std::fmt;
use std::sync::Arc;

use agent_primitives::{CapabilitySpec, FormattedName};
use serde_json::Value;

use crate::dispatcher::ExecutionDispatcher;

/// Uniform wrapper exposing a tool to the agent host.
///
/// Holds the formatted name, not the tool: every run goes back through the
/// registry, so re-registering a name redirects existing capabilities.
#[derive(Clone)]
pub struct Capability {
    spec: CapabilitySpec,
    dispatcher: Arc<ExecutionDispatcher>,
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("name", self.spec.name())
            .finish_non_exhaustive()
    }
}

impl Capability {
    pub(crate) fn new(spec: CapabilitySpec, dispatcher: Arc<ExecutionDispatcher>) -> Self {
        Self { spec, dispatcher }
    }

    /// Returns the capability name.
    #[must_use]
    pub fn name(&self) -> &FormattedName {
        self.spec.name()
    }

    /// Returns the description offered to the model.
    #[must_use]
    pub fn description(&self) -> &str {
        self.spec.description()
    }

    /// Returns the argument schema.
    #[must_use]
    pub fn parameters(&self) -> &Value {
        self.spec.parameters()
    }

    /// Returns the model-facing descriptor.
    #[must_use]
    pub fn spec(&self) -> &CapabilitySpec {
        &self.spec
    }

    /// Runs the capability; the result is always text.
    pub async fn run(&self, args: Value) -> String {
        self.dispatcher.invoke(self.spec.name().as_str(), args).await
    }
}
