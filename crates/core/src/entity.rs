//! Soft-delete lifecycle shared by every stored record.

use chrono::{DateTime, Utc};

/// Rows that are marked deleted instead of being removed.
///
/// A soft-deleted row keeps its identifier (and therefore its ordering key),
/// but is excluded from every "visible" read.
pub trait SoftDelete {
    fn deleted_at(&self) -> Option<DateTime<Utc>>;

    fn is_deleted(&self) -> bool {
        self.deleted_at().is_some()
    }

    fn is_visible(&self) -> bool {
        !self.is_deleted()
    }
}
