//! Application state - shared across all handlers.

use std::sync::Arc;

use globe_core::chat::ChatService;
use globe_core::ports::{
    CategoryRepository, CommentRepository, PostRepository, SecretStore, StorageHealth,
};
use globe_infra::InMemoryBlogStore;

#[cfg(feature = "postgres")]
use globe_infra::{SqlCategoryRepository, SqlCommentRepository, SqlPersistence, SqlPostRepository};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub categories: Arc<dyn CategoryRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub storage: Arc<dyn StorageHealth>,
    /// `None` when no agent endpoint is configured.
    pub chat: Option<Arc<ChatService>>,
}

impl AppState {
    /// State over a fresh in-memory store, without chat.
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryBlogStore::new());
        Self {
            categories: store.clone(),
            posts: store.clone(),
            comments: store.clone(),
            storage: store,
            chat: None,
        }
    }

    pub fn with_chat(mut self, chat: Arc<ChatService>) -> Self {
        self.chat = Some(chat);
        self
    }

    /// Build the application state with appropriate implementations.
    ///
    /// Nothing here touches the network: the database is connected lazily by
    /// the first request (or the startup warmup) that needs it.
    pub fn new(config: &AppConfig, secrets: Option<Arc<dyn SecretStore>>) -> Self {
        let state = match &config.database {
            #[cfg(feature = "postgres")]
            Some(db) => {
                tracing::info!(
                    database = %db.database_name,
                    schema = %db.schema(),
                    "Using SQL storage"
                );
                let persistence = Arc::new(SqlPersistence::new(db.clone()));
                Self {
                    categories: Arc::new(SqlCategoryRepository::new(persistence.clone())),
                    posts: Arc::new(SqlPostRepository::new(persistence.clone())),
                    comments: Arc::new(SqlCommentRepository::new(persistence.clone())),
                    storage: persistence,
                    chat: None,
                }
            }
            #[cfg(not(feature = "postgres"))]
            Some(_) => {
                tracing::warn!(
                    "A database is configured but the postgres feature is disabled. Using in-memory storage."
                );
                Self::in_memory()
            }
            None => {
                tracing::warn!(
                    "DATABASE_URL / AZURE_COSMOS_CONNECTION_STRING not set. Running with in-memory storage; data is lost on restart."
                );
                Self::in_memory()
            }
        };

        match chat_service(config, secrets) {
            Some(chat) => state.with_chat(chat),
            None => state,
        }
    }
}

#[cfg(feature = "azure")]
fn chat_service(
    config: &AppConfig,
    secrets: Option<Arc<dyn SecretStore>>,
) -> Option<Arc<ChatService>> {
    use globe_infra::azure::{AgentServiceConfig, AzureAgentClient, TokenProvider};

    let Some(endpoint) = config.chat.endpoint.clone() else {
        tracing::info!("AZURE_AI_ENDPOINT / PROJECT_ENDPOINT not set; /chat is disabled");
        return None;
    };

    let service = AgentServiceConfig {
        api_version: config.chat.api_version.clone(),
        ..AgentServiceConfig::new(endpoint, config.chat.project.clone())
    };
    let tokens = Arc::new(TokenProvider::new(config.azure_credential.clone()));
    let agents = AzureAgentClient::new(service, tokens);

    tracing::info!(
        endpoint = %agents.base_url(),
        subscription = ?config.chat.subscription_id,
        resource_group = ?config.chat.resource_group,
        credential = config.azure_credential.kind(),
        "Chat agent configured"
    );

    Some(Arc::new(ChatService::new(
        Arc::new(agents),
        secrets,
        config.chat.agent.clone(),
    )))
}

#[cfg(not(feature = "azure"))]
fn chat_service(
    _config: &AppConfig,
    _secrets: Option<Arc<dyn SecretStore>>,
) -> Option<Arc<ChatService>> {
    tracing::info!("Running without azure feature; /chat is disabled");
    None
}
