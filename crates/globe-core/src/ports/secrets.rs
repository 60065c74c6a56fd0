use async_trait::async_trait;

/// Secret store - remote key/value store for credentials and identifiers.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Read a secret. A missing secret is `Ok(None)`.
    async fn get_secret(&self, name: &str) -> Result<Option<String>, SecretError>;

    /// Create or overwrite a secret.
    async fn set_secret(&self, name: &str, value: &str) -> Result<(), SecretError>;

    /// Names of every secret in the store.
    async fn list_secret_names(&self) -> Result<Vec<String>, SecretError>;
}

/// Secret store errors.
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("Secret store authentication failed: {0}")]
    Auth(String),

    #[error("Secret store request failed: {0}")]
    Request(String),
}
