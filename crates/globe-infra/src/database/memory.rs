//! In-memory blog store - used when no database is configured.

use async_trait::async_trait;
use tokio::sync::RwLock;

use globe_core::domain::{Category, Comment, CommentFilter, Page, Post, PostFilter};
use globe_core::error::RepoError;
use globe_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, InitState, PostRepository,
    StorageHealth, StorageProbe,
};

trait Document: Clone + Send + Sync {
    fn id(&self) -> &str;
}

impl Document for Category {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Document for Post {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Document for Comment {
    fn id(&self) -> &str {
        &self.id
    }
}

/// One collection, kept in insertion order.
struct Collection<T> {
    items: RwLock<Vec<T>>,
}

impl<T: Document> Collection<T> {
    fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
        }
    }

    async fn find(&self, id: &str) -> Option<T> {
        self.items.read().await.iter().find(|i| i.id() == id).cloned()
    }

    async fn insert(&self, item: T) -> T {
        self.items.write().await.push(item.clone());
        item
    }

    async fn update(&self, item: T) -> Result<T, RepoError> {
        let mut items = self.items.write().await;
        let slot = items
            .iter_mut()
            .find(|i| i.id() == item.id())
            .ok_or(RepoError::NotFound)?;
        *slot = item.clone();
        Ok(item)
    }

    async fn delete(&self, id: &str) -> Result<(), RepoError> {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|i| i.id() != id);
        if items.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn select(&self, page: Page, keep: impl Fn(&T) -> bool) -> Vec<T> {
        let items = self.items.read().await;
        page.slice(items.iter().filter(|i| keep(*i)).cloned())
    }

    async fn len(&self) -> usize {
        self.items.read().await.len()
    }
}

/// In-memory storage for all three collections.
///
/// Note: Data is lost on process restart.
pub struct InMemoryBlogStore {
    categories: Collection<Category>,
    posts: Collection<Post>,
    comments: Collection<Comment>,
}

impl InMemoryBlogStore {
    pub fn new() -> Self {
        Self {
            categories: Collection::new(),
            posts: Collection::new(),
            comments: Collection::new(),
        }
    }
}

impl Default for InMemoryBlogStore {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! base_repository {
    ($entity:ty, $field:ident) => {
        #[async_trait]
        impl BaseRepository<$entity> for InMemoryBlogStore {
            async fn find_by_id(&self, id: &str) -> Result<Option<$entity>, RepoError> {
                Ok(self.$field.find(id).await)
            }

            async fn insert(&self, entity: $entity) -> Result<$entity, RepoError> {
                Ok(self.$field.insert(entity).await)
            }

            async fn update(&self, entity: $entity) -> Result<$entity, RepoError> {
                self.$field.update(entity).await
            }

            async fn delete(&self, id: &str) -> Result<(), RepoError> {
                self.$field.delete(id).await
            }
        }
    };
}

base_repository!(Category, categories);
base_repository!(Post, posts);
base_repository!(Comment, comments);

#[async_trait]
impl CategoryRepository for InMemoryBlogStore {
    async fn list(&self, page: Page) -> Result<Vec<Category>, RepoError> {
        Ok(self.categories.select(page, |_| true).await)
    }
}

#[async_trait]
impl PostRepository for InMemoryBlogStore {
    async fn list(&self, filter: &PostFilter, page: Page) -> Result<Vec<Post>, RepoError> {
        Ok(self
            .posts
            .select(page, |post| {
                filter.published.is_none_or(|p| post.published == p)
                    && filter
                        .category_id
                        .as_deref()
                        .is_none_or(|c| post.category_id.as_deref() == Some(c))
            })
            .await)
    }

    async fn count(&self) -> Result<u64, RepoError> {
        Ok(self.posts.len().await as u64)
    }
}

#[async_trait]
impl CommentRepository for InMemoryBlogStore {
    async fn list_for_post(
        &self,
        post_id: &str,
        filter: &CommentFilter,
        page: Page,
    ) -> Result<Vec<Comment>, RepoError> {
        Ok(self
            .comments
            .select(page, |comment| {
                comment.post_id == post_id
                    && filter.approved.is_none_or(|a| comment.approved == a)
            })
            .await)
    }

    async fn find_for_post(
        &self,
        post_id: &str,
        comment_id: &str,
    ) -> Result<Option<Comment>, RepoError> {
        Ok(self
            .comments
            .find(comment_id)
            .await
            .filter(|c| c.post_id == post_id))
    }
}

#[async_trait]
impl StorageHealth for InMemoryBlogStore {
    async fn ensure_ready(&self) -> Result<(), RepoError> {
        Ok(())
    }

    fn state(&self) -> InitState {
        InitState::Ready
    }

    async fn probe(&self) -> Result<StorageProbe, RepoError> {
        Ok(StorageProbe {
            backend: "memory",
            databases: Vec::new(),
            collections: vec![
                "categories".to_string(),
                "comments".to_string(),
                "posts".to_string(),
            ],
        })
    }
}
