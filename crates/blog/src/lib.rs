//! Blog domain module (users, posts, comments).
//!
//! Records as they are stored, plus the input commands that create or change
//! them. Everything here is deterministic domain logic (no IO, no HTTP, no
//! storage).

pub mod comment;
pub mod post;
pub mod user;
mod validate;

pub use comment::{Comment, CreateComment, UpdateComment};
pub use post::{CreatePost, Post, UpdatePost};
pub use user::{NewUser, RegisterUser, UpdateUser, User, UserChanges};
