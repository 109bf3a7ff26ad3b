use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use inkpost_core::{CommentId, CursorKey, DomainResult, PostId, SoftDelete, UserId};

use crate::validate;

pub const CONTENT_MAX: usize = 500;

/// A stored comment on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub commenter_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SoftDelete for Comment {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

impl CursorKey for Comment {
    fn cursor_key(&self) -> i64 {
        self.id.get()
    }
}

/// Command: comment on a post. The commenter is always the acting principal.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateComment {
    pub post_id: PostId,
    pub content: String,
}

impl CreateComment {
    pub fn validate(&self) -> DomainResult<()> {
        validate::required("content", &self.content, CONTENT_MAX)
    }
}

/// Command: edit a comment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateComment {
    pub content: Option<String>,
}

impl UpdateComment {
    pub fn validate(&self) -> DomainResult<()> {
        match &self.content {
            Some(content) => validate::required("content", content, CONTENT_MAX),
            None => Ok(()),
        }
    }
}

impl Comment {
    pub fn apply(&mut self, update: UpdateComment, now: DateTime<Utc>) {
        if let Some(content) = update.content {
            self.content = content;
        }
        self.updated_at = now;
    }
}
