//! # Globe Infrastructure
//!
//! Concrete implementations of the ports defined in `globe-core`.
//! This crate contains the database layer, the in-memory fallback store and
//! the Azure integrations (credentials, Key Vault, AI Foundry Agents).
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `postgres` - PostgreSQL storage via SeaORM, with migrations
//! - `azure` - Azure REST clients via reqwest

pub mod database;

#[cfg(feature = "azure")]
pub mod azure;

// Re-exports - In-Memory
pub use database::{DatabaseConfig, InMemoryBlogStore, Transport};

#[cfg(feature = "postgres")]
pub use database::{
    Migrator, SqlCategoryRepository, SqlCommentRepository, SqlPersistence, SqlPostRepository,
};

#[cfg(feature = "azure")]
pub use azure::{
    AgentServiceConfig, AzureAgentClient, AzureCredential, KeyVaultSecretStore, TokenProvider,
    TokenSource,
};
