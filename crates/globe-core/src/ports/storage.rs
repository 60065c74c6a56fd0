//! Storage lifecycle port.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::RepoError;

/// Lifecycle of the lazily-initialized storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "snake_case")]
pub enum InitState {
    Uninitialized,
    Initializing,
    Ready,
    /// Initialization failed; the host keeps serving and the next data
    /// request retries.
    Failed(String),
}

/// What a live connectivity probe saw.
#[derive(Debug, Clone, Serialize)]
pub struct StorageProbe {
    pub backend: &'static str,
    pub databases: Vec<String>,
    pub collections: Vec<String>,
}

/// Storage initialization and diagnostics.
#[async_trait]
pub trait StorageHealth: Send + Sync {
    /// Bring the backend up if it is not already. Concurrent callers share
    /// a single attempt.
    async fn ensure_ready(&self) -> Result<(), RepoError>;

    /// Snapshot of the initializer state.
    fn state(&self) -> InitState;

    /// Open a fresh connection and list what the backend holds.
    async fn probe(&self) -> Result<StorageProbe, RepoError>;
}
