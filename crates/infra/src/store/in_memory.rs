//! In-memory stores for tests/dev.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use inkpost_blog::{
    Comment, CreateComment, CreatePost, NewUser, Post, UpdateComment, UpdatePost, User,
    UserChanges,
};
use inkpost_core::{CommentId, CursorKey, PostId, SoftDelete, SortOrder, UserId};

use super::{CommentScope, CommentStore, PostStore, StoreError, UserStore};
use crate::pagination::QueryWindow;

/// Rows keyed by a storage-assigned, strictly increasing identifier.
#[derive(Debug)]
struct Table<T> {
    next_id: i64,
    rows: BTreeMap<i64, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }
}

impl<T: Clone + CursorKey + SoftDelete> Table<T> {
    fn allocate(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn walk(&self, order: SortOrder) -> Box<dyn Iterator<Item = &T> + '_> {
        match order {
            SortOrder::Ascending => Box::new(self.rows.values()),
            SortOrder::Descending => Box::new(self.rows.values().rev()),
        }
    }

    fn window(&self, window: &QueryWindow, keep: impl Fn(&T) -> bool) -> Vec<T> {
        self.walk(window.order)
            .filter(|row| row.is_visible() && keep(row))
            .filter(|row| window.admits(row.cursor_key()))
            .take(window.take.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    fn tail(&self, order: SortOrder, keep: impl Fn(&T) -> bool) -> Option<i64> {
        self.walk(order)
            .filter(|row| row.is_visible() && keep(row))
            .last()
            .map(CursorKey::cursor_key)
    }

    fn visible_mut(&mut self, id: i64) -> Option<&mut T> {
        self.rows.get_mut(&id).filter(|row| row.is_visible())
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".to_string())
}

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<Table<User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned())?;
        Ok(table.rows.get(&id.get()).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned())?;
        Ok(table.rows.values().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        if table.rows.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!("email {} already exists", user.email)));
        }

        let id = table.allocate();
        let now = Utc::now();
        let row = User {
            id: UserId::new(id),
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
            bio: None,
            profile_pic: None,
            is_admin: user.is_admin,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        table.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: UserId, changes: UserChanges) -> Result<Option<User>, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        Ok(table.rows.get_mut(&id.get()).map(|user| {
            user.apply(changes, Utc::now());
            user.clone()
        }))
    }

    async fn soft_delete(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        Ok(table.visible_mut(id.get()).map(|user| {
            let now = Utc::now();
            user.deleted_at = Some(now);
            user.updated_at = now;
            user.clone()
        }))
    }

    async fn fetch_window(&self, window: &QueryWindow) -> Result<Vec<User>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned())?;
        Ok(table.window(window, |_| true))
    }

    async fn tail_key(&self, order: SortOrder) -> Result<Option<i64>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned())?;
        Ok(table.tail(order, |_| true))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryPostStore {
    inner: RwLock<Table<Post>>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned())?;
        Ok(table.rows.get(&id.get()).cloned())
    }

    async fn insert(&self, author: UserId, post: CreatePost) -> Result<Post, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        let id = table.allocate();
        let now = Utc::now();
        let row = Post {
            id: PostId::new(id),
            author_id: author,
            title: post.title,
            content: post.content,
            excerpt: post.excerpt,
            thumbnail: post.thumbnail,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        table.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: PostId, update: UpdatePost) -> Result<Option<Post>, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        Ok(table.rows.get_mut(&id.get()).map(|post| {
            post.apply(update, Utc::now());
            post.clone()
        }))
    }

    async fn soft_delete(&self, id: PostId) -> Result<Option<Post>, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        Ok(table.visible_mut(id.get()).map(|post| {
            let now = Utc::now();
            post.deleted_at = Some(now);
            post.updated_at = now;
            post.clone()
        }))
    }

    async fn fetch_window(&self, window: &QueryWindow) -> Result<Vec<Post>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned())?;
        Ok(table.window(window, |_| true))
    }

    async fn tail_key(&self, order: SortOrder) -> Result<Option<i64>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned())?;
        Ok(table.tail(order, |_| true))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCommentStore {
    inner: RwLock<Table<Comment>>,
}

impl InMemoryCommentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommentStore for InMemoryCommentStore {
    async fn find_by_id(&self, id: CommentId) -> Result<Option<Comment>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned())?;
        Ok(table.rows.get(&id.get()).cloned())
    }

    async fn insert(&self, commenter: UserId, comment: CreateComment) -> Result<Comment, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        let id = table.allocate();
        let now = Utc::now();
        let row = Comment {
            id: CommentId::new(id),
            post_id: comment.post_id,
            commenter_id: commenter,
            content: comment.content,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        table.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: CommentId, update: UpdateComment) -> Result<Option<Comment>, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        Ok(table.rows.get_mut(&id.get()).map(|comment| {
            comment.apply(update, Utc::now());
            comment.clone()
        }))
    }

    async fn soft_delete(&self, id: CommentId) -> Result<Option<Comment>, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        Ok(table.visible_mut(id.get()).map(|comment| {
            let now = Utc::now();
            comment.deleted_at = Some(now);
            comment.updated_at = now;
            comment.clone()
        }))
    }

    async fn fetch_window(
        &self,
        scope: CommentScope,
        window: &QueryWindow,
    ) -> Result<Vec<Comment>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned())?;
        Ok(table.window(window, |c| scope.contains(c)))
    }

    async fn tail_key(&self, scope: CommentScope, order: SortOrder) -> Result<Option<i64>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned())?;
        Ok(table.tail(order, |c| scope.contains(c)))
    }
}
