//! SQL repository implementations.

use async_trait::async_trait;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};

use globe_core::domain::{Category, Comment, CommentFilter, Page, Post, PostFilter};
use globe_core::error::RepoError;
use globe_core::ports::{CategoryRepository, CommentRepository, PostRepository};

use super::entity::category::{self, Entity as CategoryEntity};
use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::sql_base::{SqlBaseRepository, query_err};

/// SQL category repository.
pub type SqlCategoryRepository = SqlBaseRepository<CategoryEntity>;

/// SQL post repository.
pub type SqlPostRepository = SqlBaseRepository<PostEntity>;

/// SQL comment repository.
pub type SqlCommentRepository = SqlBaseRepository<CommentEntity>;

#[async_trait]
impl CategoryRepository for SqlCategoryRepository {
    async fn list(&self, page: Page) -> Result<Vec<Category>, RepoError> {
        let db = self.db().await?;
        let result = CategoryEntity::find()
            .order_by_asc(category::Column::CreatedDate)
            .order_by_asc(category::Column::Id)
            .offset(page.skip)
            .limit(page.top)
            .all(&db)
            .await
            .map_err(query_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl PostRepository for SqlPostRepository {
    async fn list(&self, filter: &PostFilter, page: Page) -> Result<Vec<Post>, RepoError> {
        tracing::debug!(published = ?filter.published, category_id = ?filter.category_id, "Listing posts");

        let mut query = PostEntity::find();
        if let Some(published) = filter.published {
            query = query.filter(post::Column::Published.eq(published));
        }
        if let Some(category_id) = &filter.category_id {
            query = query.filter(post::Column::CategoryId.eq(category_id.as_str()));
        }

        let db = self.db().await?;
        let result = query
            .order_by_asc(post::Column::CreatedDate)
            .order_by_asc(post::Column::Id)
            .offset(page.skip)
            .limit(page.top)
            .all(&db)
            .await
            .map_err(query_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn count(&self) -> Result<u64, RepoError> {
        let db = self.db().await?;
        PostEntity::find().count(&db).await.map_err(query_err)
    }
}

#[async_trait]
impl CommentRepository for SqlCommentRepository {
    async fn list_for_post(
        &self,
        post_id: &str,
        filter: &CommentFilter,
        page: Page,
    ) -> Result<Vec<Comment>, RepoError> {
        let mut query = CommentEntity::find().filter(comment::Column::PostId.eq(post_id));
        if let Some(approved) = filter.approved {
            query = query.filter(comment::Column::Approved.eq(approved));
        }

        let db = self.db().await?;
        let result = query
            .order_by_asc(comment::Column::CreatedDate)
            .order_by_asc(comment::Column::Id)
            .offset(page.skip)
            .limit(page.top)
            .all(&db)
            .await
            .map_err(query_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_for_post(
        &self,
        post_id: &str,
        comment_id: &str,
    ) -> Result<Option<Comment>, RepoError> {
        let db = self.db().await?;
        let result = CommentEntity::find_by_id(comment_id.to_string())
            .filter(comment::Column::PostId.eq(post_id))
            .one(&db)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }
}
