use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::new_document_id;

/// Category entity - groups posts under a named, slugged heading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub slug: String,
    pub created_date: Option<DateTime<Utc>>,
    pub updated_date: Option<DateTime<Utc>>,
}

/// Body accepted when creating a category.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub slug: String,
}

/// Fields a category update may set. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub description: Option<Option<String>>,
    pub slug: Option<String>,
}

impl Category {
    /// Create a new category with a generated id, stamped at `now`.
    pub fn create(new: NewCategory, now: DateTime<Utc>) -> Self {
        Self {
            id: new_document_id(),
            name: new.name,
            description: new.description,
            slug: new.slug,
            created_date: Some(now),
            updated_date: None,
        }
    }

    /// Set the provided fields and stamp `updated_date`.
    pub fn apply(&mut self, patch: CategoryPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(slug) = patch.slug {
            self.slug = slug;
        }
        self.updated_date = Some(now);
    }
}
