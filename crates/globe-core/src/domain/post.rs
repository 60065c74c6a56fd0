use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::check_reference;
use super::id::new_document_id;
use crate::error::DomainError;

/// Post entity - a blog article, optionally filed under a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub author: String,
    pub category_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub slug: String,
    pub published: bool,
    pub published_date: Option<DateTime<Utc>>,
    pub created_date: Option<DateTime<Utc>>,
    pub updated_date: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
}

/// Body accepted when creating a post.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    pub author: String,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub slug: String,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub published_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Fields a post update may set. Absent fields are left untouched; `null`
/// clears the nullable ones.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub excerpt: Option<Option<String>>,
    pub author: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub category_id: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub slug: Option<String>,
    pub published: Option<bool>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub published_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub image_url: Option<Option<String>>,
}

impl NewPost {
    pub fn validate(&self) -> Result<(), DomainError> {
        check_reference("categoryId", self.category_id.as_deref())
    }
}

impl PostPatch {
    pub fn validate(&self) -> Result<(), DomainError> {
        check_reference("categoryId", self.category_id.as_ref().and_then(|c| c.as_deref()))
    }
}

impl Post {
    /// Create a post stamped at `now`.
    ///
    /// A post created as published without an explicit `published_date`
    /// gets `now` as its publication date.
    pub fn create(new: NewPost, now: DateTime<Utc>) -> Self {
        let published_date = match new.published_date {
            None if new.published => Some(now),
            date => date,
        };

        Self {
            id: new_document_id(),
            title: new.title,
            content: new.content,
            excerpt: new.excerpt,
            author: new.author,
            category_id: new.category_id,
            tags: new.tags,
            slug: new.slug,
            published: new.published,
            published_date,
            created_date: Some(now),
            updated_date: None,
            image_url: new.image_url,
        }
    }

    /// Set the provided fields and stamp `updated_date`.
    ///
    /// `published_date` is assigned only on the first transition to
    /// published; later updates keep the original date. A `null` date is
    /// honoured only when the post ends up unpublished.
    pub fn apply(&mut self, patch: PostPatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(excerpt) = patch.excerpt {
            self.excerpt = excerpt;
        }
        if let Some(author) = patch.author {
            self.author = author;
        }
        if let Some(category_id) = patch.category_id {
            self.category_id = category_id;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(slug) = patch.slug {
            self.slug = slug;
        }
        if let Some(published) = patch.published {
            self.published = published;
        }
        match patch.published_date {
            Some(Some(date)) => self.published_date = Some(date),
            // Only drafts can drop their date; a published post keeps it.
            Some(None) if !self.published => self.published_date = None,
            _ => {}
        }
        if self.published && self.published_date.is_none() {
            self.published_date = Some(now);
        }
        self.updated_date = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn draft(published: bool) -> NewPost {
        NewPost {
            title: "Hello".into(),
            content: "World".into(),
            excerpt: None,
            author: "Alice".into(),
            category_id: None,
            tags: vec!["intro".into()],
            slug: "hello".into(),
            published,
            published_date: None,
            image_url: None,
        }
    }

    #[test]
    fn published_on_create_gets_a_date() {
        let now = Utc::now();
        let post = Post::create(draft(true), now);
        assert_eq!(post.published_date, Some(now));
        assert_eq!(post.created_date, Some(now));

        let unpublished = Post::create(draft(false), now);
        assert_eq!(unpublished.published_date, None);
    }

    #[test]
    fn explicit_published_date_is_kept() {
        let now = Utc::now();
        let earlier = now - Duration::days(3);
        let post = Post::create(
            NewPost {
                published_date: Some(earlier),
                ..draft(true)
            },
            now,
        );
        assert_eq!(post.published_date, Some(earlier));
    }

    #[test]
    fn published_date_is_set_once() {
        let created = Utc::now();
        let mut post = Post::create(draft(false), created);

        let first = created + Duration::minutes(5);
        post.apply(
            PostPatch {
                published: Some(true),
                ..Default::default()
            },
            first,
        );
        assert_eq!(post.published_date, Some(first));

        let second = first + Duration::minutes(5);
        post.apply(
            PostPatch {
                title: Some("Hello again".into()),
                published: Some(true),
                ..Default::default()
            },
            second,
        );
        assert_eq!(post.published_date, Some(first));
        assert_eq!(post.updated_date, Some(second));
    }

    #[test]
    fn null_date_does_not_restamp_published_post() {
        let created = Utc::now();
        let mut post = Post::create(draft(true), created);

        let later = created + Duration::minutes(5);
        let patch: PostPatch = serde_json::from_str(r#"{"publishedDate": null}"#).unwrap();
        post.apply(patch, later);
        assert_eq!(post.published_date, Some(created));
        assert_eq!(post.updated_date, Some(later));

        let patch: PostPatch =
            serde_json::from_str(r#"{"published": false, "publishedDate": null}"#).unwrap();
        post.apply(patch, later);
        assert!(!post.published);
        assert_eq!(post.published_date, None);
    }

    #[test]
    fn rejects_malformed_category_reference() {
        let bad = NewPost {
            category_id: Some("not-an-id".into()),
            ..draft(false)
        };
        assert!(matches!(bad.validate(), Err(DomainError::Validation(_))));

        let patch: PostPatch = serde_json::from_str(r#"{"categoryId": null}"#).unwrap();
        assert!(patch.validate().is_ok());
    }
}
