//! # The Globe API Server
//!
//! Blog CRUD and the chat agent bridge on Actix-web. Runs standalone or as
//! an Azure Functions custom handler.

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

use globe_core::ports::SecretStore;

mod config;
mod handlers;
mod middleware;
mod state;
mod telemetry;

use config::AppConfig;
use middleware::cors::cors_middleware;
use middleware::functions::FunctionsPrefix;
use state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    telemetry::init_telemetry(&config.telemetry);

    let (config, secrets) = apply_key_vault(config).await;

    tracing::info!(
        host = %config.host,
        port = config.port,
        serverless = config.serverless,
        route_prefix = ?config.route_prefix,
        "Starting The Globe API Server"
    );

    let state = AppState::new(&config, secrets);

    // Warm storage up without holding back the listener; a failure here is
    // retried by the first request that needs the database.
    let storage = state.storage.clone();
    actix_rt::spawn(async move {
        match storage.ensure_ready().await {
            Ok(()) => tracing::info!("Storage ready"),
            Err(e) => tracing::warn!(error = %e, "Storage warmup failed; will retry on demand"),
        }
    });

    let cors = config.cors.clone();
    let route_prefix = config.route_prefix.clone();

    let result = HttpServer::new(move || {
        App::new()
            .wrap(cors_middleware(&cors))
            .wrap(FunctionsPrefix::new(route_prefix.as_deref()))
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await;

    telemetry::shutdown_telemetry();
    result
}

/// Overlay Key Vault secrets on the environment when a vault is configured.
///
/// An unreachable vault is logged and the environment alone is used.
#[cfg(feature = "azure")]
async fn apply_key_vault(config: AppConfig) -> (AppConfig, Option<Arc<dyn SecretStore>>) {
    use globe_infra::azure::{AzureCredential, KeyVaultSecretStore, TokenProvider, load_overrides};

    let Some(vault_url) = std::env::var("AZURE_KEY_VAULT_ENDPOINT")
        .ok()
        .filter(|v| !v.trim().is_empty())
    else {
        return (config, None);
    };

    let tokens = Arc::new(TokenProvider::new(AzureCredential::from_env()));
    let store: Arc<dyn SecretStore> = Arc::new(KeyVaultSecretStore::new(vault_url.clone(), tokens));

    match load_overrides(store.as_ref()).await {
        Ok(overrides) => {
            tracing::info!(vault = %vault_url, settings = overrides.len(), "Loaded settings from Key Vault");
            (AppConfig::with_overrides(&overrides), Some(store))
        }
        Err(e) => {
            tracing::warn!(vault = %vault_url, error = %e, "Key Vault unavailable; using environment only");
            (config, Some(store))
        }
    }
}

#[cfg(not(feature = "azure"))]
async fn apply_key_vault(config: AppConfig) -> (AppConfig, Option<Arc<dyn SecretStore>>) {
    (config, None)
}
