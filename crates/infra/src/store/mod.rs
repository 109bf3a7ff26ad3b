//! Storage collaborators for users, posts and comments.
//!
//! Every store is an injected `Arc<dyn …Store>` owned by the application's
//! startup composition. Point reads (`find_*`) return rows regardless of
//! soft deletion; window reads and `tail_key` only ever see visible rows.

use async_trait::async_trait;
use thiserror::Error;

use inkpost_blog::{
    Comment, CreateComment, CreatePost, NewUser, Post, UpdateComment, UpdatePost, User,
    UserChanges,
};
use inkpost_core::{CommentId, PostId, SortOrder, UserId};

use crate::pagination::QueryWindow;

pub mod in_memory;
pub mod postgres;

pub use in_memory::{InMemoryCommentStore, InMemoryPostStore, InMemoryUserStore};
pub use postgres::{PgCommentStore, PgPostStore, PgUserStore};

/// Storage operation error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A row the write depends on does not exist.
    #[error("missing reference: {0}")]
    MissingReference(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return StoreError::Conflict(db.message().to_string());
            }
            if db.is_foreign_key_violation() {
                return StoreError::MissingReference(db.message().to_string());
            }
        }
        StoreError::Backend(err.to_string())
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Fails with [`StoreError::Conflict`] if the email is already registered.
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    async fn update(&self, id: UserId, changes: UserChanges) -> Result<Option<User>, StoreError>;

    /// Mark a visible user deleted. `None` if there was no visible user.
    async fn soft_delete(&self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn fetch_window(&self, window: &QueryWindow) -> Result<Vec<User>, StoreError>;

    /// Key of the last visible user when walking in `order`.
    async fn tail_key(&self, order: SortOrder) -> Result<Option<i64>, StoreError>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, StoreError>;

    async fn insert(&self, author: UserId, post: CreatePost) -> Result<Post, StoreError>;

    async fn update(&self, id: PostId, update: UpdatePost) -> Result<Option<Post>, StoreError>;

    async fn soft_delete(&self, id: PostId) -> Result<Option<Post>, StoreError>;

    async fn fetch_window(&self, window: &QueryWindow) -> Result<Vec<Post>, StoreError>;

    async fn tail_key(&self, order: SortOrder) -> Result<Option<i64>, StoreError>;
}

/// Which comments a window read covers.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CommentScope {
    All,
    Post(PostId),
}

impl CommentScope {
    pub fn post_id(self) -> Option<PostId> {
        match self {
            CommentScope::All => None,
            CommentScope::Post(id) => Some(id),
        }
    }

    pub fn contains(self, comment: &Comment) -> bool {
        self.post_id().is_none_or(|id| comment.post_id == id)
    }
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn find_by_id(&self, id: CommentId) -> Result<Option<Comment>, StoreError>;

    async fn insert(&self, commenter: UserId, comment: CreateComment) -> Result<Comment, StoreError>;

    async fn update(&self, id: CommentId, update: UpdateComment) -> Result<Option<Comment>, StoreError>;

    async fn soft_delete(&self, id: CommentId) -> Result<Option<Comment>, StoreError>;

    async fn fetch_window(
        &self,
        scope: CommentScope,
        window: &QueryWindow,
    ) -> Result<Vec<Comment>, StoreError>;

    async fn tail_key(&self, scope: CommentScope, order: SortOrder) -> Result<Option<i64>, StoreError>;
}
