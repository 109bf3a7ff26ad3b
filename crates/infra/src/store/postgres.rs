//! Postgres-backed stores.
//!
//! ## Soft deletion
//!
//! Deleting sets `deleted_at`; rows are never removed. Window reads and tail
//! lookups filter `deleted_at IS NULL`, point reads do not.
//!
//! ## Ordering
//!
//! Every collection is ordered by its `BIGSERIAL` primary key, which is
//! assigned once at insert and never rewritten.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use inkpost_blog::{
    Comment, CreateComment, CreatePost, NewUser, Post, UpdateComment, UpdatePost, User,
    UserChanges,
};
use inkpost_core::{CommentId, PostId, SortOrder, UserId};

use super::{CommentScope, CommentStore, PostStore, StoreError, UserStore};
use crate::pagination::QueryWindow;

const SCHEMA: &str = include_str!("../../migrations/0001_blog.sql");

/// Create tables and indexes if they do not exist yet.
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}

const USER_COLUMNS: &str = "id, email, username, password_hash, bio, profile_pic, is_admin, created_at, updated_at, deleted_at";
const POST_COLUMNS: &str = "id, author_id, title, content, excerpt, thumbnail, created_at, updated_at, deleted_at";
const COMMENT_COLUMNS: &str = "id, post_id, commenter_id, content, created_at, updated_at, deleted_at";

/// SQL fragments for a walk direction. Only static strings are interpolated.
fn direction(order: SortOrder) -> (&'static str, &'static str, &'static str) {
    match order {
        SortOrder::Ascending => (">", "ASC", "MAX"),
        SortOrder::Descending => ("<", "DESC", "MIN"),
    }
}

fn take(window: &QueryWindow) -> Option<i64> {
    window.take.map(|t| i64::try_from(t).unwrap_or(i64::MAX))
}

#[derive(Debug)]
struct UserRow {
    id: i64,
    email: String,
    username: String,
    password_hash: String,
    bio: Option<String>,
    profile_pic: Option<String>,
    is_admin: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            bio: row.try_get("bio")?,
            profile_pic: row.try_get("profile_pic")?,
            is_admin: row.try_get("is_admin")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            deleted_at: row.try_get("deleted_at")?,
        })
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::new(row.id),
            email: row.email,
            username: row.username,
            password_hash: row.password_hash,
            bio: row.bio,
            profile_pic: row.profile_pic,
            is_admin: row.is_admin,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

#[derive(Debug)]
struct PostRow {
    id: i64,
    author_id: i64,
    title: String,
    content: String,
    excerpt: String,
    thumbnail: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for PostRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(PostRow {
            id: row.try_get("id")?,
            author_id: row.try_get("author_id")?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            excerpt: row.try_get("excerpt")?,
            thumbnail: row.try_get("thumbnail")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            deleted_at: row.try_get("deleted_at")?,
        })
    }
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: PostId::new(row.id),
            author_id: UserId::new(row.author_id),
            title: row.title,
            content: row.content,
            excerpt: row.excerpt,
            thumbnail: row.thumbnail,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

#[derive(Debug)]
struct CommentRow {
    id: i64,
    post_id: i64,
    commenter_id: i64,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for CommentRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(CommentRow {
            id: row.try_get("id")?,
            post_id: row.try_get("post_id")?,
            commenter_id: row.try_get("commenter_id")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            deleted_at: row.try_get("deleted_at")?,
        })
    }
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: CommentId::new(row.id),
            post_id: PostId::new(row.post_id),
            commenter_id: UserId::new(row.commenter_id),
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (email, username, password_hash, is_admin) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&user.email)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(user.is_admin)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn update(&self, id: UserId, changes: UserChanges) -> Result<Option<User>, StoreError> {
        let sql = format!(
            "UPDATE users SET \
                username = COALESCE($2, username), \
                password_hash = COALESCE($3, password_hash), \
                bio = COALESCE($4, bio), \
                profile_pic = COALESCE($5, profile_pic), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.get())
            .bind(changes.username)
            .bind(changes.password_hash)
            .bind(changes.bio)
            .bind(changes.profile_pic)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn soft_delete(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let sql = format!(
            "UPDATE users SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn fetch_window(&self, window: &QueryWindow) -> Result<Vec<User>, StoreError> {
        let (after, dir, _) = direction(window.order);
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE deleted_at IS NULL AND ($1::BIGINT IS NULL OR id {after} $1) \
             ORDER BY id {dir} LIMIT $2"
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(window.after.map(|c| c.key()))
            .bind(take(window))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn tail_key(&self, order: SortOrder) -> Result<Option<i64>, StoreError> {
        let (_, _, agg) = direction(order);
        let sql = format!("SELECT {agg}(id) FROM users WHERE deleted_at IS NULL");
        let tail = sqlx::query_scalar::<_, Option<i64>>(&sql)
            .fetch_one(&self.pool)
            .await?;
        Ok(tail)
    }
}

#[derive(Clone)]
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, StoreError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Post::from))
    }

    async fn insert(&self, author: UserId, post: CreatePost) -> Result<Post, StoreError> {
        let sql = format!(
            "INSERT INTO posts (author_id, title, content, excerpt, thumbnail) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {POST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(author.get())
            .bind(&post.title)
            .bind(&post.content)
            .bind(&post.excerpt)
            .bind(&post.thumbnail)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn update(&self, id: PostId, update: UpdatePost) -> Result<Option<Post>, StoreError> {
        let sql = format!(
            "UPDATE posts SET \
                title = COALESCE($2, title), \
                content = COALESCE($3, content), \
                excerpt = COALESCE($4, excerpt), \
                thumbnail = COALESCE($5, thumbnail), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {POST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id.get())
            .bind(update.title)
            .bind(update.content)
            .bind(update.excerpt)
            .bind(update.thumbnail)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Post::from))
    }

    async fn soft_delete(&self, id: PostId) -> Result<Option<Post>, StoreError> {
        let sql = format!(
            "UPDATE posts SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING {POST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Post::from))
    }

    async fn fetch_window(&self, window: &QueryWindow) -> Result<Vec<Post>, StoreError> {
        let (after, dir, _) = direction(window.order);
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts \
             WHERE deleted_at IS NULL AND ($1::BIGINT IS NULL OR id {after} $1) \
             ORDER BY id {dir} LIMIT $2"
        );
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(window.after.map(|c| c.key()))
            .bind(take(window))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn tail_key(&self, order: SortOrder) -> Result<Option<i64>, StoreError> {
        let (_, _, agg) = direction(order);
        let sql = format!("SELECT {agg}(id) FROM posts WHERE deleted_at IS NULL");
        let tail = sqlx::query_scalar::<_, Option<i64>>(&sql)
            .fetch_one(&self.pool)
            .await?;
        Ok(tail)
    }
}

#[derive(Clone)]
pub struct PgCommentStore {
    pool: PgPool,
}

impl PgCommentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentStore for PgCommentStore {
    async fn find_by_id(&self, id: CommentId) -> Result<Option<Comment>, StoreError> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1");
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Comment::from))
    }

    async fn insert(&self, commenter: UserId, comment: CreateComment) -> Result<Comment, StoreError> {
        let sql = format!(
            "INSERT INTO comments (post_id, commenter_id, content) \
             VALUES ($1, $2, $3) RETURNING {COMMENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(comment.post_id.get())
            .bind(commenter.get())
            .bind(&comment.content)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn update(&self, id: CommentId, update: UpdateComment) -> Result<Option<Comment>, StoreError> {
        let sql = format!(
            "UPDATE comments SET content = COALESCE($2, content), updated_at = NOW() \
             WHERE id = $1 RETURNING {COMMENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(id.get())
            .bind(update.content)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Comment::from))
    }

    async fn soft_delete(&self, id: CommentId) -> Result<Option<Comment>, StoreError> {
        let sql = format!(
            "UPDATE comments SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING {COMMENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Comment::from))
    }

    async fn fetch_window(
        &self,
        scope: CommentScope,
        window: &QueryWindow,
    ) -> Result<Vec<Comment>, StoreError> {
        let (after, dir, _) = direction(window.order);
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments \
             WHERE deleted_at IS NULL \
               AND ($1::BIGINT IS NULL OR id {after} $1) \
               AND ($3::BIGINT IS NULL OR post_id = $3) \
             ORDER BY id {dir} LIMIT $2"
        );
        let rows = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(window.after.map(|c| c.key()))
            .bind(take(window))
            .bind(scope.post_id().map(PostId::get))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn tail_key(&self, scope: CommentScope, order: SortOrder) -> Result<Option<i64>, StoreError> {
        let (_, _, agg) = direction(order);
        let sql = format!(
            "SELECT {agg}(id) FROM comments \
             WHERE deleted_at IS NULL AND ($1::BIGINT IS NULL OR post_id = $1)"
        );
        let tail = sqlx::query_scalar::<_, Option<i64>>(&sql)
            .bind(scope.post_id().map(PostId::get))
            .fetch_one(&self.pool)
            .await?;
        Ok(tail)
    }
}
