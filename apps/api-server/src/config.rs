//! Application configuration loaded from environment variables, optionally
//! overlaid with secrets from Key Vault.

use std::collections::HashMap;

use globe_core::chat::AgentSettings;
use globe_infra::DatabaseConfig;
#[cfg(feature = "azure")]
use globe_infra::azure::AzureCredential;

/// Origins always allowed outside development.
const PORTAL_ORIGINS: [&str; 2] = ["https://portal.azure.com", "https://ms.portal.azure.com"];

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Set when running as an Azure Functions custom handler.
    pub serverless: bool,
    /// Route prefix the function host puts in front of every path.
    pub route_prefix: Option<String>,
    /// `None` runs the server against in-memory storage.
    pub database: Option<DatabaseConfig>,
    pub cors: CorsConfig,
    pub chat: ChatConfig,
    pub telemetry: TelemetryConfig,
    /// Identity used for the agent service, resolved after Key Vault
    /// overrides are applied.
    #[cfg(feature = "azure")]
    pub azure_credential: AzureCredential,
}

#[derive(Debug, Clone, Default)]
pub struct CorsConfig {
    /// `API_ENVIRONMENT=develop`: any origin is allowed.
    pub allow_any: bool,
    pub origins: Vec<String>,
}

/// Where the chat agent lives and how to find or create it.
#[derive(Debug, Clone, Default)]
pub struct ChatConfig {
    pub endpoint: Option<String>,
    pub project: Option<String>,
    pub subscription_id: Option<String>,
    pub resource_group: Option<String>,
    pub api_version: String,
    pub agent: AgentSettings,
}

/// Telemetry configuration.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Enable JSON logging (for production).
    pub json_logs: bool,
    /// Service name for tracing.
    pub service_name: String,
    /// OTLP collector endpoint; traces are exported only when set.
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            json_logs: false,
            service_name: "globe-api".to_string(),
            otlp_endpoint: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration with Key Vault values taking precedence over the
    /// environment.
    pub fn with_overrides(overrides: &HashMap<String, String>) -> Self {
        Self::from_lookup(|key| {
            overrides
                .get(key)
                .cloned()
                .or_else(|| std::env::var(key).ok())
        })
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        // Blank values count as unset.
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let first = |keys: &[&str]| keys.iter().find_map(|key| get(*key));
        let number = |key: &str| get(key).and_then(|v| v.trim().parse::<u32>().ok());

        let handler_port = get("FUNCTIONS_CUSTOMHANDLER_PORT").and_then(|p| p.parse().ok());
        let serverless = handler_port.is_some();
        let route_prefix = match get("FUNCTIONS_ROUTE_PREFIX") {
            Some(prefix) => Some(prefix),
            None if serverless => Some("api".to_string()),
            None => None,
        }
        .map(|p| p.trim_matches('/').to_string())
        .filter(|p| !p.is_empty());

        let database = first(&["DATABASE_URL", "AZURE_COSMOS_CONNECTION_STRING"]).map(|url| {
            DatabaseConfig {
                url,
                database_name: get("AZURE_COSMOS_DATABASE_NAME")
                    .unwrap_or_else(|| "Blog".to_string()),
                max_connections: number("DB_MAX_CONNECTIONS").unwrap_or(10),
                min_connections: number("DB_MIN_CONNECTIONS").unwrap_or(1),
            }
        });

        let allow_any = get("API_ENVIRONMENT").as_deref() == Some("develop");
        let mut origins: Vec<String> = PORTAL_ORIGINS.iter().map(|o| o.to_string()).collect();
        if let Some(extra) = get("API_ALLOW_ORIGINS") {
            origins.extend(
                extra
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string),
            );
        }

        let chat = ChatConfig {
            endpoint: first(&["AZURE_AI_ENDPOINT", "PROJECT_ENDPOINT"]),
            project: first(&["AZURE_AI_PROJECT_NAME", "PROJECT_NAME"]),
            subscription_id: first(&["AZURE_SUBSCRIPTION_ID", "SUBSCRIPTION_ID"]),
            resource_group: first(&["AZURE_RESOURCE_GROUP_NAME", "RESOURCE_GROUP"]),
            api_version: get("AZURE_AI_API_VERSION").unwrap_or_else(|| "v1".to_string()),
            agent: AgentSettings {
                agent_id: get("AZURE_AGENT_ID"),
                model: get("AZURE_MODEL"),
                ..Default::default()
            },
        };

        let telemetry = TelemetryConfig {
            json_logs: get("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
            service_name: first(&["APPLICATIONINSIGHTS_ROLENAME", "OTEL_SERVICE_NAME"])
                .unwrap_or_else(|| "globe-api".to_string()),
            otlp_endpoint: get("OTEL_EXPORTER_OTLP_ENDPOINT"),
        };

        Self {
            host: get("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: handler_port
                .or_else(|| get("PORT").and_then(|p| p.parse().ok()))
                .unwrap_or(8080),
            serverless,
            route_prefix,
            database,
            cors: CorsConfig { allow_any, origins },
            chat,
            telemetry,
            #[cfg(feature = "azure")]
            azure_credential: AzureCredential::from_lookup(&lookup),
        }
    }
}
