//! Infrastructure layer: storage collaborators, auth lookups, pagination.

pub mod lookup;
pub mod pagination;
pub mod store;

pub use lookup::StoreLookup;
pub use pagination::{
    CommentThread, CursorPaginator, CursorPolicy, PageRequest, PageSource, PostFeed, QueryWindow,
    UserDirectory, paginate,
};
pub use store::{CommentScope, CommentStore, PostStore, StoreError, UserStore};
