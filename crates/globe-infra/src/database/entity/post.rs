//! Post entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub excerpt: Option<String>,
    pub author: String,
    /// Not a foreign key: posts may outlive their category.
    pub category_id: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,
    pub slug: String,
    pub published: bool,
    pub published_date: Option<DateTimeWithTimeZone>,
    pub created_date: Option<DateTimeWithTimeZone>,
    pub updated_date: Option<DateTimeWithTimeZone>,
    pub image_url: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for globe_core::domain::Post {
    fn from(model: Model) -> Self {
        let tags = match serde_json::from_value(model.tags) {
            Ok(tags) => tags,
            Err(e) => {
                tracing::warn!(post_id = %model.id, error = %e, "Stored tags are not a string list");
                Vec::new()
            }
        };

        Self {
            id: model.id,
            title: model.title,
            content: model.content,
            excerpt: model.excerpt,
            author: model.author,
            category_id: model.category_id,
            tags,
            slug: model.slug,
            published: model.published,
            published_date: model.published_date.map(Into::into),
            created_date: model.created_date.map(Into::into),
            updated_date: model.updated_date.map(Into::into),
            image_url: model.image_url,
        }
    }
}

impl From<globe_core::domain::Post> for ActiveModel {
    fn from(post: globe_core::domain::Post) -> Self {
        Self {
            id: Set(post.id),
            title: Set(post.title),
            content: Set(post.content),
            excerpt: Set(post.excerpt),
            author: Set(post.author),
            category_id: Set(post.category_id),
            tags: Set(Json::from(post.tags)),
            slug: Set(post.slug),
            published: Set(post.published),
            published_date: Set(post.published_date.map(Into::into)),
            created_date: Set(post.created_date.map(Into::into)),
            updated_date: Set(post.updated_date.map(Into::into)),
            image_url: Set(post.image_url),
        }
    }
}
