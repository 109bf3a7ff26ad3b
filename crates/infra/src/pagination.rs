//! Cursor pagination over soft-deletable collections.
//!
//! A page request is turned into a [`QueryWindow`] (where to start, which
//! way to walk, how many rows to take) and a [`CursorPolicy`] (whether the
//! page gets a continuation cursor). The window only ever admits visible
//! rows, and the cursor is a key comparison rather than a row lookup, so
//! soft-deleting the row a client's cursor names does not move the page
//! boundary.
//!
//! The policy never hands out a cursor at or past the last visible key of
//! the whole collection: a page that happens to end exactly on the tail is
//! the final page.

use std::sync::Arc;

use async_trait::async_trait;

use inkpost_blog::{Comment, Post, User};
use inkpost_core::{Cursor, CursorKey, Page, SortOrder};

use crate::store::{CommentScope, CommentStore, PostStore, StoreError, UserStore};

/// Which visible rows a storage read should return.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct QueryWindow {
    pub order: SortOrder,
    /// Rows must lie strictly after this key in `order`. `None` is the head.
    pub after: Option<Cursor>,
    /// Maximum number of rows; `None` is unbounded.
    pub take: Option<usize>,
}

impl QueryWindow {
    pub fn admits(&self, key: i64) -> bool {
        self.after.is_none_or(|cursor| self.order.is_after(key, cursor))
    }
}

/// A client's page request, as parsed from `?limit=&cursor=`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: Option<usize>,
    pub cursor: Option<Cursor>,
}

impl PageRequest {
    /// `limit=0` means unbounded, `cursor=0` means the head.
    pub fn from_query(limit: Option<u64>, cursor: Option<u64>) -> Self {
        Self {
            limit: limit
                .filter(|&l| l > 0)
                .map(|l| usize::try_from(l).unwrap_or(usize::MAX)),
            cursor: Cursor::from_query(cursor),
        }
    }
}

/// Decides the continuation cursor for a fetched page.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CursorPolicy {
    limit: Option<usize>,
    order: SortOrder,
}

impl CursorPolicy {
    /// Whether a page of `len` items is full and may need a cursor.
    ///
    /// Only full pages need the collection tail, so callers can skip that
    /// read otherwise.
    pub fn is_full(&self, len: usize) -> bool {
        self.limit.is_some_and(|limit| len >= limit)
    }

    /// `tail` is the key of the last visible row of the whole collection in
    /// this policy's order, or `None` if nothing is visible.
    pub fn next_cursor<T: CursorKey>(&self, items: &[T], tail: Option<i64>) -> Option<Cursor> {
        if !self.is_full(items.len()) {
            return None;
        }
        let provisional = items.last()?.cursor();
        let tail = tail?;
        if self.order.reaches(provisional, tail) {
            None
        } else {
            Some(provisional)
        }
    }
}

/// Turn a page size and optional cursor into a storage window and the
/// policy for the page's continuation cursor.
pub fn paginate(
    limit: Option<usize>,
    cursor: Option<Cursor>,
    order: SortOrder,
) -> (QueryWindow, CursorPolicy) {
    let limit = limit.filter(|&l| l > 0);
    (
        QueryWindow {
            order,
            after: cursor,
            take: limit,
        },
        CursorPolicy { limit, order },
    )
}

/// A collection that can be read one window at a time.
#[async_trait]
pub trait PageSource: Send + Sync {
    type Item: CursorKey + Send;

    const ORDER: SortOrder;

    async fn fetch(&self, window: &QueryWindow) -> Result<Vec<Self::Item>, StoreError>;

    async fn tail_key(&self, order: SortOrder) -> Result<Option<i64>, StoreError>;
}

/// Serves pages from an injected [`PageSource`].
pub struct CursorPaginator<S> {
    source: S,
}

impl<S: PageSource> CursorPaginator<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Items and tail are separate reads; a write landing between them can
    /// only suppress a cursor, never produce one past the visible tail.
    pub async fn page(&self, request: PageRequest) -> Result<Page<S::Item>, StoreError> {
        let (window, policy) = paginate(request.limit, request.cursor, S::ORDER);
        let items = self.source.fetch(&window).await?;

        let tail = if policy.is_full(items.len()) {
            self.source.tail_key(S::ORDER).await?
        } else {
            None
        };
        let next_cursor = policy.next_cursor(&items, tail);

        tracing::debug!(
            order = ?S::ORDER,
            after = ?window.after,
            returned = items.len(),
            next_cursor = ?next_cursor,
            "page served"
        );

        Ok(Page { items, next_cursor })
    }
}

/// Posts, newest first.
#[derive(Clone)]
pub struct PostFeed(pub Arc<dyn PostStore>);

#[async_trait]
impl PageSource for PostFeed {
    type Item = Post;

    const ORDER: SortOrder = SortOrder::Descending;

    async fn fetch(&self, window: &QueryWindow) -> Result<Vec<Post>, StoreError> {
        self.0.fetch_window(window).await
    }

    async fn tail_key(&self, order: SortOrder) -> Result<Option<i64>, StoreError> {
        self.0.tail_key(order).await
    }
}

/// Users, oldest first.
#[derive(Clone)]
pub struct UserDirectory(pub Arc<dyn UserStore>);

#[async_trait]
impl PageSource for UserDirectory {
    type Item = User;

    const ORDER: SortOrder = SortOrder::Ascending;

    async fn fetch(&self, window: &QueryWindow) -> Result<Vec<User>, StoreError> {
        self.0.fetch_window(window).await
    }

    async fn tail_key(&self, order: SortOrder) -> Result<Option<i64>, StoreError> {
        self.0.tail_key(order).await
    }
}

/// Comments oldest first, either site-wide or under one post.
#[derive(Clone)]
pub struct CommentThread {
    pub store: Arc<dyn CommentStore>,
    pub scope: CommentScope,
}

#[async_trait]
impl PageSource for CommentThread {
    type Item = Comment;

    const ORDER: SortOrder = SortOrder::Ascending;

    async fn fetch(&self, window: &QueryWindow) -> Result<Vec<Comment>, StoreError> {
        self.store.fetch_window(self.scope, window).await
    }

    async fn tail_key(&self, order: SortOrder) -> Result<Option<i64>, StoreError> {
        self.store.tail_key(self.scope, order).await
    }
}
