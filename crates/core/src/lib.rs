//! `inkpost-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod page;

pub use entity::SoftDelete;
pub use error::{DomainError, DomainResult};
pub use id::{CommentId, PostId, UserId};
pub use page::{Cursor, CursorKey, Page, SortOrder};
