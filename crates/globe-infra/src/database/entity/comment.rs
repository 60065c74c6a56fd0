//! Comment entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "comments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub post_id: String,
    pub author: String,
    pub email: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub approved: bool,
    pub created_date: Option<DateTimeWithTimeZone>,
    pub updated_date: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for globe_core::domain::Comment {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            post_id: model.post_id,
            author: model.author,
            email: model.email,
            content: model.content,
            approved: model.approved,
            created_date: model.created_date.map(Into::into),
            updated_date: model.updated_date.map(Into::into),
        }
    }
}

impl From<globe_core::domain::Comment> for ActiveModel {
    fn from(comment: globe_core::domain::Comment) -> Self {
        Self {
            id: Set(comment.id),
            post_id: Set(comment.post_id),
            author: Set(comment.author),
            email: Set(comment.email),
            content: Set(comment.content),
            approved: Set(comment.approved),
            created_date: Set(comment.created_date.map(Into::into)),
            updated_date: Set(comment.updated_date.map(Into::into)),
        }
    }
}
