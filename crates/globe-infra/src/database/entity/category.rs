//! Category entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub slug: String,
    pub created_date: Option<DateTimeWithTimeZone>,
    pub updated_date: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for globe_core::domain::Category {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            slug: model.slug,
            created_date: model.created_date.map(Into::into),
            updated_date: model.updated_date.map(Into::into),
        }
    }
}

impl From<globe_core::domain::Category> for ActiveModel {
    fn from(category: globe_core::domain::Category) -> Self {
        Self {
            id: Set(category.id),
            name: Set(category.name),
            description: Set(category.description),
            slug: Set(category.slug),
            created_date: Set(category.created_date.map(Into::into)),
            updated_date: Set(category.updated_date.map(Into::into)),
        }
    }
}
