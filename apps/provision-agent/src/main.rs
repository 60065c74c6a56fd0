//! Provisioning tool for The Globe's chat agent.
//!
//! Run during `azd up`: finds or creates the agent, stores its id in Key
//! Vault and appends it to the local azd environment file. Provisioning is
//! best effort, so failures are logged and the process still exits 0.

mod env_file;
mod settings;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use globe_core::chat::{AgentSettings, ensure_agent};
use globe_core::ports::{AgentService, SecretStore};
use globe_infra::azure::{
    AgentServiceConfig, AzureAgentClient, AzureCredential, KeyVaultSecretStore, TokenProvider,
    TokenSource,
};

use settings::ProvisionSettings;

#[derive(Parser, Debug)]
#[command(name = "provision-agent")]
#[command(about = "Create The Globe's chat agent and record its id")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Reuse the agent recorded in Key Vault, or create one (default)
    Create,
    /// List the agents in the project
    List,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command.unwrap_or(Command::Create) {
        Command::Create => create().await,
        Command::List => list().await,
    };

    if let Err(e) = outcome {
        tracing::warn!(error = %format!("{e:#}"), "Provisioning did not complete");
    }
}

fn env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn token_provider() -> Arc<dyn TokenSource> {
    let credential = AzureCredential::from_env();
    tracing::info!(credential = credential.kind(), "Using Azure credential");
    Arc::new(TokenProvider::new(credential))
}

async fn create() -> anyhow::Result<()> {
    let settings = match ProvisionSettings::from_lookup(env) {
        Ok(settings) => settings,
        Err(missing) => {
            tracing::info!(
                missing,
                "Missing AI project configuration (endpoint/subscription/resource-group/project/model). Skipping agent creation."
            );
            return Ok(());
        }
    };
    tracing::info!(
        endpoint = %settings.endpoint,
        subscription = %settings.subscription_id,
        resource_group = %settings.resource_group,
        project = %settings.project,
        "Provisioning agent"
    );

    let tokens = token_provider();
    let agents = AzureAgentClient::new(
        AgentServiceConfig::new(settings.endpoint.clone(), Some(settings.project.clone())),
        tokens.clone(),
    );
    let vault = settings
        .key_vault
        .as_ref()
        .map(|url| KeyVaultSecretStore::new(url.clone(), tokens.clone()));
    if vault.is_none() {
        tracing::info!("AZURE_KEY_VAULT_ENDPOINT not set; the agent id will not be stored in Key Vault");
    }

    let agent_settings = AgentSettings {
        model: Some(settings.model.clone()),
        ..Default::default()
    };
    let resolution = ensure_agent(
        &agents,
        vault.as_ref().map(|v| v as &dyn SecretStore),
        &agent_settings,
    )
    .await
    .context("could not find or create an agent")?;

    if resolution.created {
        tracing::info!(agent_id = %resolution.agent_id, "Created agent");
    } else {
        tracing::info!(agent_id = %resolution.agent_id, "Agent already exists. Nothing to create.");
    }

    let path = env_file::resolve(env("AZD_ENV_FILE"));
    match env_file::append_agent_id(&path, &resolution.agent_id) {
        Ok(()) => tracing::info!(path = %path.display(), "Wrote AZURE_AGENT_ID"),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to write agent id to local env file")
        }
    }

    println!("{}", resolution.agent_id);
    Ok(())
}

async fn list() -> anyhow::Result<()> {
    let endpoint = ["AZURE_AI_ENDPOINT", "AI_FOUNDRY_ACCOUNT_ENDPOINT", "PROJECT_ENDPOINT"]
        .iter()
        .find_map(|key| env(key).filter(|v| !v.trim().is_empty()))
        .context("AZURE_AI_ENDPOINT is not set")?;
    let project = ["AZURE_AI_PROJECT_NAME", "AI_FOUNDRY_PROJECT_NAME"]
        .iter()
        .find_map(|key| env(key).filter(|v| !v.trim().is_empty()));

    let agents = AzureAgentClient::new(AgentServiceConfig::new(endpoint, project), token_provider());
    tracing::info!(endpoint = %agents.base_url(), "Listing agents");

    let found = agents.list_agents().await.context("listing agents failed")?;
    println!("Found {} agents:", found.len());
    for agent in found {
        let created = agent
            .created_at
            .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
            .map(|at| at.to_rfc3339());
        println!("  ID: {}", agent.id);
        println!("  Name: {}", agent.name.as_deref().unwrap_or("-"));
        println!("  Description: {}", agent.description.as_deref().unwrap_or("-"));
        println!("  Created: {}", created.as_deref().unwrap_or("-"));
        println!("  ---");
    }
    Ok(())
}
