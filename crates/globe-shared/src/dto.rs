//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `skip`/`top` window accepted by every list route.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListQuery {
    pub skip: Option<u64>,
    pub top: Option<u64>,
}

/// Query string for `GET /posts`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostListQuery {
    pub published: Option<bool>,
    #[serde(rename = "categoryId", alias = "category_id")]
    pub category_id: Option<String>,
    pub skip: Option<u64>,
    pub top: Option<u64>,
}

/// Query string for `GET /posts/{id}/comments`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentListQuery {
    pub approved: Option<bool>,
    pub skip: Option<u64>,
    pub top: Option<u64>,
}

/// One remembered turn. Either field may be missing; a missing role is
/// treated as `user` and a missing content as empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub conversation_history: Option<Vec<HistoryEntry>>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub conversation_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

/// Persistence initializer state as reported by `/db-status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializationStatus {
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `/db-status`. Always served with 200.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DbStatusResponse {
    Connected {
        backend: String,
        ping: bool,
        databases: Vec<String>,
        collections: Vec<String>,
        initialization: InitializationStatus,
    },
    Error {
        error: String,
        #[serde(rename = "type")]
        error_type: String,
        initialization: InitializationStatus,
    },
}

/// Body of `/db-check`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DbCheckResponse {
    Success { blog_posts_count: u64 },
    Error { error: String },
}
