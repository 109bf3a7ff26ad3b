use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};

use inkpost_auth::{AccessGate, Policy};
use inkpost_blog::{CreateComment, UpdateComment};
use inkpost_core::{CommentId, SoftDelete};
use inkpost_infra::{CommentScope, CommentThread, CursorPaginator};

use crate::app::dto::ListQuery;
use crate::app::errors;
use crate::app::routes::posts::visible_post;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;
use crate::middleware::guarded;

pub fn router(gate: &AccessGate) -> Router {
    Router::new()
        .route(
            "/",
            get(list_comments).merge(guarded(post(create_comment), gate, Policy::None)),
        )
        .route(
            "/:id",
            get(get_comment).merge(guarded(
                patch(update_comment).delete(delete_comment),
                gate,
                Policy::OwnsComment,
            )),
        )
}

pub async fn list_comments(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::query_error_to_response(e),
    };

    let thread = CursorPaginator::new(CommentThread {
        store: services.comments.clone(),
        scope: CommentScope::All,
    });
    match thread.page(query.page_request()).await {
        Ok(page) => Json(page).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    match services.comments.find_by_id(CommentId::new(id)).await {
        Ok(Some(comment)) if comment.is_visible() => Json(comment).into_response(),
        Ok(_) => errors::not_found("comment"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<CreateComment>,
) -> axum::response::Response {
    if let Err(e) = body.validate() {
        return errors::domain_error_to_response(e);
    }

    match visible_post(&services, body.post_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return errors::not_found("post"),
        Err(e) => return errors::store_error_to_response(e),
    }

    match services.comments.insert(principal.user_id(), body).await {
        Ok(comment) => {
            tracing::info!(
                comment_id = %comment.id,
                post_id = %comment.post_id,
                commenter_id = %comment.commenter_id,
                "comment created"
            );
            (StatusCode::CREATED, Json(comment)).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateComment>,
) -> axum::response::Response {
    if let Err(e) = body.validate() {
        return errors::domain_error_to_response(e);
    }

    let id = CommentId::new(id);
    match services.comments.find_by_id(id).await {
        Ok(Some(c)) if c.is_visible() => {}
        Ok(_) => return errors::not_found("comment"),
        Err(e) => return errors::store_error_to_response(e),
    }

    match services.comments.update(id, body).await {
        Ok(Some(comment)) => Json(comment).into_response(),
        Ok(None) => errors::not_found("comment"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    match services.comments.soft_delete(CommentId::new(id)).await {
        Ok(Some(comment)) => {
            tracing::info!(comment_id = %comment.id, "comment soft-deleted");
            Json(comment).into_response()
        }
        Ok(None) => errors::not_found("comment"),
        Err(e) => errors::store_error_to_response(e),
    }
}
