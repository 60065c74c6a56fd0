//! Database connection management and repositories.

mod config;
mod memory;

#[cfg(feature = "postgres")]
pub mod entity;
#[cfg(feature = "postgres")]
mod migration;
#[cfg(feature = "postgres")]
mod persistence;
#[cfg(feature = "postgres")]
mod sql_base;
#[cfg(feature = "postgres")]
pub mod sql_repo;

pub use config::{DatabaseConfig, Transport};
pub use memory::InMemoryBlogStore;

#[cfg(feature = "postgres")]
pub use migration::Migrator;
#[cfg(feature = "postgres")]
pub use persistence::SqlPersistence;
#[cfg(feature = "postgres")]
pub use sql_repo::{SqlCategoryRepository, SqlCommentRepository, SqlPostRepository};
