//! Domain entities - the blog's records and the rules for creating and
//! changing them.

mod category;
mod comment;
pub mod id;
mod post;
mod query;

pub use category::{Category, CategoryPatch, NewCategory};
pub use comment::{Comment, CommentPatch, NewComment};
pub use post::{NewPost, Post, PostPatch};
pub use query::{CommentFilter, Page, PostFilter};

use serde::{Deserialize, Deserializer};

use crate::error::DomainError;

/// Deserializes a field that distinguishes "absent" from "explicitly null".
///
/// Use with `#[serde(default, deserialize_with = "...")]` on an
/// `Option<Option<T>>`: absent stays `None`, `null` becomes `Some(None)`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Reject a foreign key that is not a well-formed document id.
pub(crate) fn check_reference(field: &str, value: Option<&str>) -> Result<(), DomainError> {
    match value {
        Some(v) if !id::is_document_id(v) => Err(DomainError::Validation(format!(
            "{field} must be a 24-character hex id"
        ))),
        _ => Ok(()),
    }
}
