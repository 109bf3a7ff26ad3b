//! Cursor pagination primitives.
//!
//! A [`Cursor`] is the ordering key of the last item a client has seen. Keys
//! are row identifiers: unique, strictly monotonic with creation order and
//! never rewritten, so a cursor keeps denoting the same position even after
//! the row it names is soft-deleted.

use serde::{Deserialize, Serialize};

/// Opaque continuation token (the last-seen ordering key).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(i64);

impl Cursor {
    pub const fn new(key: i64) -> Self {
        Self(key)
    }

    pub const fn key(self) -> i64 {
        self.0
    }

    /// Interpret a client-supplied cursor value.
    ///
    /// Identifiers start at 1, so `0` carries no position and means "start at
    /// the head". Values past the key space clamp to the largest key.
    pub fn from_query(value: Option<u64>) -> Option<Self> {
        match value {
            None | Some(0) => None,
            Some(v) => Some(Self(i64::try_from(v).unwrap_or(i64::MAX))),
        }
    }
}

impl core::fmt::Display for Cursor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Anything that can be positioned in a cursor-paginated collection.
pub trait CursorKey {
    fn cursor_key(&self) -> i64;

    fn cursor(&self) -> Cursor {
        Cursor(self.cursor_key())
    }
}

/// Direction a collection is walked in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Oldest first.
    Ascending,
    /// Newest first.
    Descending,
}

impl SortOrder {
    /// Whether `key` lies strictly after `cursor` when walking in this order.
    pub fn is_after(self, key: i64, cursor: Cursor) -> bool {
        match self {
            SortOrder::Ascending => key > cursor.0,
            SortOrder::Descending => key < cursor.0,
        }
    }

    /// Whether `cursor` sits on or beyond `tail` (the last visible key).
    pub fn reaches(self, cursor: Cursor, tail: i64) -> bool {
        !self.is_after(tail, cursor)
    }
}

/// One page of a cursor-paginated collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<Cursor>,
}

impl<T> Page<T> {
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}
