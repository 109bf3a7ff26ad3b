use axum::{Extension, Json, http::StatusCode, response::IntoResponse};

use crate::app::dto::WhoAmI;
use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(principal): Extension<PrincipalContext>) -> impl IntoResponse {
    Json(WhoAmI::from(principal.principal()))
}
