use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::new_document_id;

/// Comment entity - a reader's reply attached to a post by `post_id`.
///
/// The post reference is not checked when the comment is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub author: String,
    pub email: Option<String>,
    pub content: String,
    pub approved: bool,
    pub created_date: Option<DateTime<Utc>>,
    pub updated_date: Option<DateTime<Utc>>,
}

/// Body accepted when creating a comment. The post id comes from the route.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub author: String,
    #[serde(default)]
    pub email: Option<String>,
    pub content: String,
    #[serde(default)]
    pub approved: bool,
}

/// Fields a comment update may set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPatch {
    pub author: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub email: Option<Option<String>>,
    pub content: Option<String>,
    pub approved: Option<bool>,
}

impl Comment {
    pub fn create(post_id: impl Into<String>, new: NewComment, now: DateTime<Utc>) -> Self {
        Self {
            id: new_document_id(),
            post_id: post_id.into(),
            author: new.author,
            email: new.email,
            content: new.content,
            approved: new.approved,
            created_date: Some(now),
            updated_date: None,
        }
    }

    pub fn apply(&mut self, patch: CommentPatch, now: DateTime<Utc>) {
        if let Some(author) = patch.author {
            self.author = author;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(approved) = patch.approved {
            self.approved = approved;
        }
        self.updated_date = Some(now);
    }
}
