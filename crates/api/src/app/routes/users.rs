use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};

use inkpost_auth::{AccessGate, Policy};
use inkpost_blog::{UpdateUser, UserChanges};
use inkpost_core::{SoftDelete, UserId};
use inkpost_infra::{CursorPaginator, UserDirectory};

use crate::app::dto::{CreateUserRequest, ListQuery};
use crate::app::errors;
use crate::app::routes::auth::{hash_password, register};
use crate::app::services::AppServices;
use crate::middleware::guarded;

pub fn router(gate: &AccessGate) -> Router {
    Router::new()
        .route(
            "/",
            guarded(get(list_users).post(create_user), gate, Policy::AdminOnly),
        )
        .route(
            "/:id",
            get(get_user).merge(guarded(
                patch(update_user).delete(delete_user),
                gate,
                Policy::SelfOnly,
            )),
        )
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::query_error_to_response(e),
    };

    let paginator = CursorPaginator::new(UserDirectory(services.users.clone()));
    match paginator.page(query.page_request()).await {
        Ok(page) => Json(page).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<CreateUserRequest>,
) -> axum::response::Response {
    match register(&services, body.account, body.is_admin).await {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(resp) => resp,
    }
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    match services.users.find_by_id(UserId::new(id)).await {
        Ok(Some(user)) if user.is_visible() => Json(user).into_response(),
        Ok(_) => errors::not_found("user"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateUser>,
) -> axum::response::Response {
    if let Err(e) = body.validate() {
        return errors::domain_error_to_response(e);
    }

    let password_hash = match body.password {
        Some(password) => match hash_password(&services, password).await {
            Ok(hash) => Some(hash),
            Err(resp) => return resp,
        },
        None => None,
    };

    let changes = UserChanges {
        password_hash,
        username: body.username,
        bio: body.bio,
        profile_pic: body.profile_pic,
    };

    match services.users.update(UserId::new(id), changes).await {
        Ok(Some(user)) => Json(user).into_response(),
        Ok(None) => errors::not_found("user"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    match services.users.soft_delete(UserId::new(id)).await {
        Ok(Some(user)) => {
            tracing::info!(user_id = %user.id, "user soft-deleted");
            Json(user).into_response()
        }
        Ok(None) => errors::not_found("user"),
        Err(e) => errors::store_error_to_response(e),
    }
}
