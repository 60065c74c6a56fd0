//! Azure integrations: credentials, Key Vault and the AI Foundry Agents API.

mod agents;
mod credential;
mod key_vault;

pub use agents::{AgentServiceConfig, AzureAgentClient};
pub use credential::{
    AI_SCOPE, AmbientIdentity, AzureCredential, CredentialError, KEY_VAULT_SCOPE, TokenProvider,
    TokenSource,
};
pub use key_vault::{KeyVaultSecretStore, load_overrides, setting_key};

use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::Deserialize;

/// Error payload shared by Azure data-plane APIs:
/// `{"error": {"code": "...", "message": "..."}}`.
#[derive(Debug, Default)]
struct ServiceError {
    code: Option<String>,
    message: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ServiceError {
    /// Parse an error body, falling back to the raw text.
    fn parse(body: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => Self {
                message: envelope
                    .error
                    .message
                    .unwrap_or_else(|| body.to_string()),
                code: envelope.error.code,
            },
            Err(_) => Self {
                code: None,
                message: body.to_string(),
            },
        }
    }
}

/// `Retry-After` in seconds. HTTP-date values are ignored.
fn retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
