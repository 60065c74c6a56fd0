//! Azure AD token acquisition.
//!
//! [`AzureCredential`] is chosen once from configuration: a service principal
//! when client id, secret and tenant are all present, otherwise the ambient
//! identity of the host (App Service managed identity, the instance metadata
//! service, or a signed-in Azure CLI, tried in that order).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;

/// Token scope for the AI Foundry Agents API.
pub const AI_SCOPE: &str = "https://ai.azure.com/.default";

/// Token scope for Key Vault.
pub const KEY_VAULT_SCOPE: &str = "https://vault.azure.net/.default";

const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
const IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const IMDS_TIMEOUT: Duration = Duration::from_secs(2);

/// Tokens this close to expiry are refreshed.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Lifetime assumed when a token response carries no expiry.
const DEFAULT_LIFETIME: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub enum AzureCredential {
    ServicePrincipal {
        tenant_id: String,
        client_id: String,
        client_secret: String,
        authority_host: String,
    },
    Ambient(AmbientIdentity),
}

/// Where an ambient identity can be found.
#[derive(Debug, Clone, Default)]
pub struct AmbientIdentity {
    /// Client id of a user-assigned managed identity.
    pub client_id: Option<String>,
    /// App Service identity endpoint (`IDENTITY_ENDPOINT`).
    pub identity_endpoint: Option<String>,
    /// App Service identity secret (`IDENTITY_HEADER`).
    pub identity_header: Option<String>,
    pub imds_endpoint: String,
}

impl AzureCredential {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        match (
            get("AZURE_TENANT_ID"),
            get("AZURE_CLIENT_ID"),
            get("AZURE_CLIENT_SECRET"),
        ) {
            (Some(tenant_id), Some(client_id), Some(client_secret)) => Self::ServicePrincipal {
                tenant_id,
                client_id,
                client_secret,
                authority_host: get("AZURE_AUTHORITY_HOST")
                    .unwrap_or_else(|| DEFAULT_AUTHORITY_HOST.to_string()),
            },
            (_, client_id, _) => Self::Ambient(AmbientIdentity {
                client_id,
                identity_endpoint: get("IDENTITY_ENDPOINT"),
                identity_header: get("IDENTITY_HEADER"),
                imds_endpoint: IMDS_ENDPOINT.to_string(),
            }),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::ServicePrincipal { .. } => "service_principal",
            Self::Ambient(_) => "ambient",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Token request failed: {0}")]
    Request(String),

    #[error("Token endpoint returned {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("No ambient Azure identity available ({0})")]
    Unavailable(String),
}

/// Anything that can hand out bearer tokens for a scope.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn token(&self, scope: &str) -> Result<String, CredentialError>;
}

/// Token endpoints disagree on how expiry is spelled: AAD sends
/// `expires_in` as a number, IMDS as a string, App Service sends
/// `expires_on` as a unix timestamp string.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<serde_json::Value>,
    #[serde(default)]
    expires_on: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliToken {
    access_token: String,
    #[serde(default, rename = "expires_on")]
    expires_on: Option<i64>,
}

fn as_i64(value: &serde_json::Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

fn lifetime_from_unix(expires_on: i64) -> Duration {
    let remaining = expires_on - chrono::Utc::now().timestamp();
    Duration::from_secs(remaining.max(0) as u64)
}

impl TokenResponse {
    fn lifetime(&self) -> Duration {
        if let Some(secs) = self.expires_in.as_ref().and_then(as_i64) {
            return Duration::from_secs(secs.max(0) as u64);
        }
        self.expires_on
            .as_ref()
            .and_then(as_i64)
            .map(lifetime_from_unix)
            .unwrap_or(DEFAULT_LIFETIME)
    }
}

/// Managed-identity endpoints take a resource, not a scope.
fn resource_for(scope: &str) -> &str {
    scope.strip_suffix("/.default").unwrap_or(scope)
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Token provider with a per-scope cache.
pub struct TokenProvider {
    credential: AzureCredential,
    http: reqwest::Client,
    cache: RwLock<HashMap<String, CachedToken>>,
}

impl TokenProvider {
    pub fn new(credential: AzureCredential) -> Self {
        Self::with_client(credential, reqwest::Client::new())
    }

    pub fn with_client(credential: AzureCredential, http: reqwest::Client) -> Self {
        Self {
            credential,
            http,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn credential(&self) -> &AzureCredential {
        &self.credential
    }

    async fn fetch(&self, scope: &str) -> Result<(String, Duration), CredentialError> {
        match &self.credential {
            AzureCredential::ServicePrincipal {
                tenant_id,
                client_id,
                client_secret,
                authority_host,
            } => {
                let url = format!(
                    "{}/{tenant_id}/oauth2/v2.0/token",
                    authority_host.trim_end_matches('/')
                );
                let request = self.http.post(url).form(&[
                    ("grant_type", "client_credentials"),
                    ("client_id", client_id.as_str()),
                    ("client_secret", client_secret.as_str()),
                    ("scope", scope),
                ]);
                read_token(request).await
            }
            AzureCredential::Ambient(identity) => self.ambient(identity, scope).await,
        }
    }

    async fn ambient(
        &self,
        identity: &AmbientIdentity,
        scope: &str,
    ) -> Result<(String, Duration), CredentialError> {
        let mut failures = Vec::new();

        if let (Some(endpoint), Some(secret)) =
            (&identity.identity_endpoint, &identity.identity_header)
        {
            let mut request = self
                .http
                .get(endpoint)
                .header("X-IDENTITY-HEADER", secret)
                .query(&[("api-version", "2019-08-01"), ("resource", resource_for(scope))]);
            if let Some(client_id) = &identity.client_id {
                request = request.query(&[("client_id", client_id)]);
            }
            match read_token(request).await {
                Ok(token) => return Ok(token),
                Err(e) => failures.push(format!("app service: {e}")),
            }
        }

        let mut request = self
            .http
            .get(&identity.imds_endpoint)
            .header("Metadata", "true")
            .timeout(IMDS_TIMEOUT)
            .query(&[("api-version", "2018-02-01"), ("resource", resource_for(scope))]);
        if let Some(client_id) = &identity.client_id {
            request = request.query(&[("client_id", client_id)]);
        }
        match read_token(request).await {
            Ok(token) => return Ok(token),
            Err(e) => failures.push(format!("imds: {e}")),
        }

        match azure_cli_token(scope).await {
            Ok(token) => Ok(token),
            Err(e) => {
                failures.push(format!("azure cli: {e}"));
                Err(CredentialError::Unavailable(failures.join("; ")))
            }
        }
    }
}

async fn read_token(
    request: reqwest::RequestBuilder,
) -> Result<(String, Duration), CredentialError> {
    let response = request
        .send()
        .await
        .map_err(|e| CredentialError::Request(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(CredentialError::Rejected {
            status: status.as_u16(),
            message,
        });
    }

    let body: TokenResponse = response
        .json()
        .await
        .map_err(|e| CredentialError::Request(e.to_string()))?;
    let lifetime = body.lifetime();
    Ok((body.access_token, lifetime))
}

async fn azure_cli_token(scope: &str) -> Result<(String, Duration), CredentialError> {
    let output = tokio::process::Command::new("az")
        .args(["account", "get-access-token", "--output", "json", "--scope", scope])
        .output()
        .await
        .map_err(|e| CredentialError::Request(e.to_string()))?;

    if !output.status.success() {
        return Err(CredentialError::Request(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    let token: CliToken = serde_json::from_slice(&output.stdout)
        .map_err(|e| CredentialError::Request(e.to_string()))?;
    let lifetime = token
        .expires_on
        .map(lifetime_from_unix)
        .unwrap_or(DEFAULT_LIFETIME);
    Ok((token.access_token, lifetime))
}

#[async_trait]
impl TokenSource for TokenProvider {
    async fn token(&self, scope: &str) -> Result<String, CredentialError> {
        if let Some(cached) = self.cache.read().await.get(scope) {
            if cached.expires_at > Instant::now() + EXPIRY_MARGIN {
                return Ok(cached.value.clone());
            }
        }

        let (value, lifetime) = self.fetch(scope).await?;
        tracing::debug!(
            scope,
            credential = self.credential.kind(),
            expires_in = lifetime.as_secs(),
            "Acquired Azure token"
        );

        self.cache.write().await.insert(
            scope.to_string(),
            CachedToken {
                value: value.clone(),
                expires_at: Instant::now() + lifetime,
            },
        );
        Ok(value)
    }
}
