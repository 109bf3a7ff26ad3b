use axum::Router;

use inkpost_auth::AccessGate;

pub mod auth;
pub mod comments;
pub mod posts;
pub mod system;
pub mod users;

/// Router for every resource endpoint. Each route declares its own policy.
pub fn router(gate: &AccessGate) -> Router {
    Router::new()
        .merge(auth::router(gate))
        .nest("/users", users::router(gate))
        .nest("/posts", posts::router(gate))
        .nest("/comments", comments::router(gate))
}
