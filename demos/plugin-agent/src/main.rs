//! Runs a single prompt against the capabilities of one deployment.
//!
//! ```text
//! OPENAI_API_KEY=... plugin-agent --deployment market-data --prompt "Price of PEPE on base?"
//! ```

use std::sync::Arc;

use agent_bridge::adapters::observer::{ObservedAdapter, ToolListObserver};
use agent_bridge::adapters::openai::{OpenAiAdapter, OpenAiConfig};
use agent_bridge::config::{DeploymentKind, Settings};
use agent_bridge::kernel::{CapabilityHost, ConversationHost};
use agent_bridge::plugins::{Deployment, HttpsJsonTransport};
use agent_bridge::telemetry::{TracingConfig, init_tracing};
use agent_bridge::ToolRegistry;
use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "plugin-agent", about = "Ask a tool-backed agent one question")]
struct Args {
    /// User prompt to process.
    #[arg(short, long)]
    prompt: String,

    /// Deployment to run; overrides `AGENT_DEPLOYMENT`.
    #[arg(short, long)]
    deployment: Option<DeploymentKind>,

    /// System prompt; defaults to the deployment's own.
    #[arg(long)]
    system_prompt: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let settings = Settings::from_env(args.deployment).context("invalid configuration")?;
    init_tracing(&TracingConfig::new(settings.log_filter.clone()))?;
    settings.log_summary();

    let deployment = Deployment::from_settings(&settings, Arc::new(HttpsJsonTransport::new()))?;
    let capabilities = deployment
        .capabilities(Arc::new(ToolRegistry::new()))
        .await
        .context("tool discovery failed")?;

    let mut config = OpenAiConfig::new(settings.openai.model.clone())
        .with_api_key(settings.openai.api_key.expose());
    if let Some(base_url) = &settings.openai.base_url {
        config = config.with_base_url(base_url)?;
    }
    let adapter = ObservedAdapter::new(Arc::new(OpenAiAdapter::new(config)?))
        .with_observer(Arc::new(ToolListObserver));

    let system_prompt = args
        .system_prompt
        .unwrap_or_else(|| deployment.system_prompt().to_owned());
    let mut host = ConversationHost::new(Arc::new(adapter)).with_system_prompt(system_prompt);
    host.add_capabilities(capabilities)?;

    let outcome = host.process(&args.prompt).await?;
    for result in outcome.tool_results() {
        info!(capability = %result.name, bytes = result.output.len(), "tool result");
    }

    println!("{}", outcome.response());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_deployment_override() {
        let args = Args::try_parse_from(["plugin-agent", "--prompt", "hi", "-d", "swap"]).unwrap();
        assert_eq!(args.deployment, Some(DeploymentKind::Swap));
        assert_eq!(args.prompt, "hi");
        assert!(args.system_prompt.is_none());
    }

    #[test]
    fn rejects_unknown_deployment() {
        assert!(Args::try_parse_from(["plugin-agent", "-p", "hi", "-d", "lending"]).is_err());
    }
}
