//! Key Vault secret store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::json;

use globe_core::ports::{SecretError, SecretStore};

use super::ServiceError;
use super::credential::{KEY_VAULT_SCOPE, TokenSource};

const API_VERSION: &str = "7.4";

#[derive(Debug, Deserialize)]
struct SecretBundle {
    #[serde(default)]
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecretList {
    #[serde(default)]
    value: Vec<SecretItem>,
    #[serde(default)]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SecretItem {
    id: String,
}

impl SecretItem {
    /// `https://{vault}/secrets/{name}` -> `{name}`
    fn name(&self) -> Option<&str> {
        self.id
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|n| !n.is_empty())
    }
}

/// Secret store backed by an Azure Key Vault.
pub struct KeyVaultSecretStore {
    vault_url: String,
    tokens: Arc<dyn TokenSource>,
    http: reqwest::Client,
}

impl KeyVaultSecretStore {
    pub fn new(vault_url: impl Into<String>, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            vault_url: vault_url.into().trim_end_matches('/').to_string(),
            tokens,
            http: reqwest::Client::new(),
        }
    }

    async fn authorized(&self, method: Method, url: &str) -> Result<RequestBuilder, SecretError> {
        let token = self
            .tokens
            .token(KEY_VAULT_SCOPE)
            .await
            .map_err(|e| SecretError::Auth(e.to_string()))?;
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, SecretError> {
        let response = request
            .send()
            .await
            .map_err(|e| SecretError::Request(e.to_string()))?;

        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = ServiceError::parse(&body);
        let message = format!("{status}: {}", error.message);
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            Err(SecretError::Auth(message))
        } else {
            Err(SecretError::Request(message))
        }
    }
}

#[async_trait]
impl SecretStore for KeyVaultSecretStore {
    async fn get_secret(&self, name: &str) -> Result<Option<String>, SecretError> {
        let url = format!("{}/secrets/{name}", self.vault_url);
        let request = self
            .authorized(Method::GET, &url)
            .await?
            .query(&[("api-version", API_VERSION)]);

        let response = self.send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let bundle: SecretBundle = response
            .json()
            .await
            .map_err(|e| SecretError::Request(e.to_string()))?;
        Ok(bundle.value)
    }

    async fn set_secret(&self, name: &str, value: &str) -> Result<(), SecretError> {
        let url = format!("{}/secrets/{name}", self.vault_url);
        let request = self
            .authorized(Method::PUT, &url)
            .await?
            .query(&[("api-version", API_VERSION)])
            .json(&json!({ "value": value }));

        let response = self.send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(SecretError::Request(format!("vault rejected secret {name}")));
        }
        Ok(())
    }

    async fn list_secret_names(&self) -> Result<Vec<String>, SecretError> {
        let mut names = Vec::new();
        let mut next = Some(format!(
            "{}/secrets?api-version={API_VERSION}",
            self.vault_url
        ));

        while let Some(url) = next {
            let response = self.send(self.authorized(Method::GET, &url).await?).await?;
            if response.status() == StatusCode::NOT_FOUND {
                break;
            }
            let page: SecretList = response
                .json()
                .await
                .map_err(|e| SecretError::Request(e.to_string()))?;

            names.extend(page.value.iter().filter_map(SecretItem::name).map(str::to_string));
            next = page.next_link.filter(|link| !link.is_empty());
        }

        Ok(names)
    }
}

/// Setting key a secret name maps to: `azure-cosmos-connection-string` ->
/// `AZURE_COSMOS_CONNECTION_STRING`.
pub fn setting_key(secret_name: &str) -> String {
    secret_name.replace('-', "_").to_uppercase()
}

/// Fetch every secret in the store, keyed by [`setting_key`].
///
/// Empty values are skipped. A secret that cannot be read is logged and
/// skipped; only a failure to list the store is an error.
pub async fn load_overrides(
    store: &dyn SecretStore,
) -> Result<HashMap<String, String>, SecretError> {
    let mut overrides = HashMap::new();

    for name in store.list_secret_names().await? {
        match store.get_secret(&name).await {
            Ok(Some(value)) if !value.is_empty() => {
                overrides.insert(setting_key(&name), value);
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(secret = %name, error = %e, "Skipping unreadable secret"),
        }
    }

    tracing::info!(count = overrides.len(), "Loaded settings from Key Vault");
    Ok(overrides)
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::azure::credential::CredentialError;

    struct FixedToken;

    #[async_trait]
    impl TokenSource for FixedToken {
        async fn token(&self, _scope: &str) -> Result<String, CredentialError> {
            Ok("kv-token".into())
        }
    }

    fn store(server: &MockServer) -> KeyVaultSecretStore {
        KeyVaultSecretStore::new(format!("{}/", server.uri()), Arc::new(FixedToken))
    }

    #[test]
    fn secret_names_map_to_setting_keys() {
        assert_eq!(
            setting_key("azure-cosmos-connection-string"),
            "AZURE_COSMOS_CONNECTION_STRING"
        );
        assert_eq!(setting_key("azure-agent-id"), "AZURE_AGENT_ID");
    }

    #[tokio::test]
    async fn missing_secret_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/secrets/azure-agent-id"))
            .and(query_param("api-version", "7.4"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": { "code": "SecretNotFound", "message": "not found" }
            })))
            .mount(&server)
            .await;

        assert_eq!(store(&server).get_secret("azure-agent-id").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_secret_puts_value() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/secrets/azure-agent-id"))
            .and(body_json(serde_json::json!({ "value": "asst_1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": "asst_1",
                "id": "https://vault/secrets/azure-agent-id/abc"
            })))
            .expect(1)
            .mount(&server)
            .await;

        store(&server)
            .set_secret("azure-agent-id", "asst_1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn overrides_follow_next_link_and_skip_empty_values() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/secrets"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [{ "id": format!("{}/secrets/empty-secret", server.uri()) }],
                "nextLink": null
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/secrets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [{ "id": format!("{}/secrets/azure-cosmos-database-name", server.uri()) }],
                "nextLink": format!("{}/secrets?api-version=7.4&page=2", server.uri())
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/secrets/azure-cosmos-database-name"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "value": "Newsroom" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/secrets/empty-secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "value": "" })))
            .mount(&server)
            .await;

        let overrides = load_overrides(&store(&server)).await.unwrap();

        assert_eq!(overrides.len(), 1);
        assert_eq!(
            overrides.get("AZURE_COSMOS_DATABASE_NAME").map(String::as_str),
            Some("Newsroom")
        );
    }
}
