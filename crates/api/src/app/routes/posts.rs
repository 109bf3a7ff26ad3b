use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};

use inkpost_auth::{AccessGate, Policy};
use inkpost_blog::{CreatePost, Post, UpdatePost};
use inkpost_core::{PostId, SoftDelete};
use inkpost_infra::{
    CommentScope, CommentThread, CursorPaginator, PageRequest, PostFeed, StoreError,
};

use crate::app::dto::{ListQuery, PostDetail};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;
use crate::middleware::guarded;

pub fn router(gate: &AccessGate) -> Router {
    Router::new()
        .route(
            "/",
            get(list_posts).merge(guarded(post(create_post), gate, Policy::None)),
        )
        .route(
            "/:id",
            get(get_post).merge(guarded(
                patch(update_post).delete(delete_post),
                gate,
                Policy::OwnsPost,
            )),
        )
        .route("/:id/comments", get(list_post_comments))
}

/// The post, if it exists and is not soft-deleted.
pub(crate) async fn visible_post(
    services: &AppServices,
    id: PostId,
) -> Result<Option<Post>, StoreError> {
    Ok(services.posts.find_by_id(id).await?.filter(|p| p.is_visible()))
}

pub async fn list_posts(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::query_error_to_response(e),
    };

    let paginator = CursorPaginator::new(PostFeed(services.posts.clone()));
    match paginator.page(query.page_request()).await {
        Ok(page) => Json(page).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_post(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    let id = PostId::new(id);
    let post = match visible_post(&services, id).await {
        Ok(Some(p)) => p,
        Ok(None) => return errors::not_found("post"),
        Err(e) => return errors::store_error_to_response(e),
    };

    let thread = CursorPaginator::new(CommentThread {
        store: services.comments.clone(),
        scope: CommentScope::Post(id),
    });
    match thread.page(PageRequest::default()).await {
        Ok(page) => Json(PostDetail {
            post,
            comments: page.items,
        })
        .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_post_comments(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<i64>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::query_error_to_response(e),
    };

    let id = PostId::new(id);
    match visible_post(&services, id).await {
        Ok(Some(_)) => {}
        Ok(None) => return errors::not_found("post"),
        Err(e) => return errors::store_error_to_response(e),
    }

    let thread = CursorPaginator::new(CommentThread {
        store: services.comments.clone(),
        scope: CommentScope::Post(id),
    });
    match thread.page(query.page_request()).await {
        Ok(page) => Json(page).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_post(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<CreatePost>,
) -> axum::response::Response {
    if let Err(e) = body.validate() {
        return errors::domain_error_to_response(e);
    }

    match services.posts.insert(principal.user_id(), body).await {
        Ok(post) => {
            tracing::info!(post_id = %post.id, author_id = %post.author_id, "post created");
            (StatusCode::CREATED, Json(post)).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_post(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<i64>,
    Json(body): Json<UpdatePost>,
) -> axum::response::Response {
    if let Err(e) = body.validate() {
        return errors::domain_error_to_response(e);
    }

    let id = PostId::new(id);
    match visible_post(&services, id).await {
        Ok(Some(_)) => {}
        Ok(None) => return errors::not_found("post"),
        Err(e) => return errors::store_error_to_response(e),
    }

    match services.posts.update(id, body).await {
        Ok(Some(post)) => Json(post).into_response(),
        Ok(None) => errors::not_found("post"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_post(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    match services.posts.soft_delete(PostId::new(id)).await {
        Ok(Some(post)) => {
            tracing::info!(post_id = %post.id, "post soft-deleted");
            Json(post).into_response()
        }
        Ok(None) => errors::not_found("post"),
        Err(e) => errors::store_error_to_response(e),
    }
}
