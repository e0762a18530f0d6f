//! Setup-time discovery across tool providers.

use std::sync::Arc;

use tracing::info;

use crate::builder::CapabilityBuilder;
use crate::capability::Capability;
use crate::error::{ToolError, ToolResult};
use crate::policy::SelectionPolicy;
use crate::tool::ToolProvider;

/// Lists every provider in order and builds the resulting capability set.
///
/// # Errors
///
/// Returns [`ToolError::Discovery`] when a provider fails to list its tools or
/// when the policy leaves no capability to offer.
pub async fn discover_capabilities(
    providers: &[Arc<dyn ToolProvider>],
    policy: &SelectionPolicy,
    builder: &CapabilityBuilder,
) -> ToolResult<Vec<Capability>> {
    let mut tools = Vec::new();
    for provider in providers {
        let listed = provider
            .list()
            .await
            .map_err(|err| ToolError::discovery(provider.name(), err.to_string()))?;
        info!(provider = provider.name(), tools = listed.len(), "provider tools discovered");
        tools.extend(listed);
    }

    let capabilities = builder.build_all(tools, policy);
    if capabilities.is_empty() {
        let names: Vec<&str> = providers.iter().map(|provider| provider.name()).collect();
        return Err(ToolError::discovery(
            names.join(","),
            "selection policy left no capabilities",
        ));
    }

    Ok(capabilities)
}
