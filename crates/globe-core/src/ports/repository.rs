use async_trait::async_trait;

use crate::domain::{Category, Comment, CommentFilter, Page, Post, PostFilter};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T>: Send + Sync {
    /// Find an entity by its document id.
    async fn find_by_id(&self, id: &str) -> Result<Option<T>, RepoError>;

    /// Store a new entity.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Replace a stored entity. Fails with `RepoError::NotFound` if it is gone.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its id.
    async fn delete(&self, id: &str) -> Result<(), RepoError>;
}

/// Category repository.
#[async_trait]
pub trait CategoryRepository: BaseRepository<Category> {
    async fn list(&self, page: Page) -> Result<Vec<Category>, RepoError>;
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post> {
    async fn list(&self, filter: &PostFilter, page: Page) -> Result<Vec<Post>, RepoError>;

    async fn count(&self) -> Result<u64, RepoError>;
}

/// Comment repository. Comments are always addressed through their post.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment> {
    async fn list_for_post(
        &self,
        post_id: &str,
        filter: &CommentFilter,
        page: Page,
    ) -> Result<Vec<Comment>, RepoError>;

    async fn find_for_post(
        &self,
        post_id: &str,
        comment_id: &str,
    ) -> Result<Option<Comment>, RepoError>;
}
