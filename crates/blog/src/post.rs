use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use inkpost_core::{CursorKey, DomainResult, PostId, SoftDelete, UserId};

use crate::validate;

pub const TITLE_MAX: usize = 100;
pub const EXCERPT_MAX: usize = 200;
pub const CONTENT_MAX: usize = 100_000;

/// A stored blog post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub thumbnail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SoftDelete for Post {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

impl CursorKey for Post {
    fn cursor_key(&self) -> i64 {
        self.id.get()
    }
}

/// Command: publish a post. The author is always the acting principal.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePost {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

impl CreatePost {
    pub fn validate(&self) -> DomainResult<()> {
        validate::required("title", &self.title, TITLE_MAX)?;
        validate::required("content", &self.content, CONTENT_MAX)?;
        validate::required("excerpt", &self.excerpt, EXCERPT_MAX)?;
        Ok(())
    }
}

/// Command: edit a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePost {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub thumbnail: Option<String>,
}

impl UpdatePost {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(title) = &self.title {
            validate::required("title", title, TITLE_MAX)?;
        }
        if let Some(content) = &self.content {
            validate::required("content", content, CONTENT_MAX)?;
        }
        if let Some(excerpt) = &self.excerpt {
            validate::required("excerpt", excerpt, EXCERPT_MAX)?;
        }
        Ok(())
    }
}

impl Post {
    pub fn apply(&mut self, update: UpdatePost, now: DateTime<Utc>) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(content) = update.content {
            self.content = content;
        }
        if let Some(excerpt) = update.excerpt {
            self.excerpt = excerpt;
        }
        if let Some(thumbnail) = update.thumbnail {
            self.thumbnail = Some(thumbnail);
        }
        self.updated_at = now;
    }
}
