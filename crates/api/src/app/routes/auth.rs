use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use inkpost_auth::{AccessGate, Policy};
use inkpost_blog::{NewUser, RegisterUser, User};
use inkpost_core::SoftDelete;

use crate::app::dto::{LoginRequest, LoginResponse};
use crate::app::errors;
use crate::app::routes::system;
use crate::app::services::AppServices;
use crate::middleware::{CREDENTIAL_COOKIE, guarded};

pub fn router(gate: &AccessGate) -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", guarded(post(logout), gate, Policy::None))
        .route("/whoami", guarded(get(system::whoami), gate, Policy::None))
}

/// bcrypt is CPU-bound, so it runs on the blocking pool.
pub(crate) async fn hash_password(
    services: &AppServices,
    password: String,
) -> Result<String, axum::response::Response> {
    let hasher = services.hasher.clone();
    match tokio::task::spawn_blocking(move || hasher.hash(&password)).await {
        Ok(Ok(hash)) => Ok(hash),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "password hashing failed");
            Err(errors::password_error_to_response())
        }
        Err(e) => {
            tracing::error!(error = %e, "password hashing task panicked");
            Err(errors::password_error_to_response())
        }
    }
}

async fn verify_password(services: &AppServices, password: String, stored: String) -> bool {
    let hasher = services.hasher.clone();
    tokio::task::spawn_blocking(move || hasher.verify(&password, &stored))
        .await
        .unwrap_or(false)
}

/// Hash the password and store a new account.
pub(crate) async fn register(
    services: &AppServices,
    account: RegisterUser,
    is_admin: bool,
) -> Result<User, axum::response::Response> {
    account.validate().map_err(errors::domain_error_to_response)?;

    let new_user = NewUser {
        password_hash: hash_password(services, account.password).await?,
        email: account.email,
        username: account.username,
        is_admin,
    };
    let user = services
        .users
        .insert(new_user)
        .await
        .map_err(errors::store_error_to_response)?;

    tracing::info!(user_id = %user.id, is_admin, "account created");
    Ok(user)
}

pub async fn signup(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<RegisterUser>,
) -> axum::response::Response {
    match register(&services, body, false).await {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(resp) => resp,
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<LoginRequest>,
) -> axum::response::Response {
    let user = match services.users.find_by_email(&body.email).await {
        Ok(found) => found.filter(|u| u.is_visible()),
        Err(e) => return errors::store_error_to_response(e),
    };

    let verified = match &user {
        Some(u) => verify_password(&services, body.password, u.password_hash.clone()).await,
        None => false,
    };
    let Some(user) = user.filter(|_| verified) else {
        return errors::json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "wrong email or password",
        );
    };

    let token = match services.issuer.issue(user.id, Utc::now()) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "failed to sign access token");
            return errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "token_error",
                "could not issue token",
            );
        }
    };

    let cookie = credential_cookie(&token, services.issuer.ttl().num_seconds());
    tracing::info!(user_id = %user.id, "logged in");

    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse { token, user }),
    )
        .into_response()
}

pub async fn logout() -> axum::response::Response {
    (
        StatusCode::OK,
        [(header::SET_COOKIE, credential_cookie("", 0))],
        Json(serde_json::json!({ "message": "logged out" })),
    )
        .into_response()
}

fn credential_cookie(token: &str, max_age_secs: i64) -> String {
    format!("{CREDENTIAL_COOKIE}={token}; HttpOnly; SameSite=Strict; Path=/; Max-Age={max_age_secs}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_carries_token_and_lifetime() {
        assert_eq!(
            credential_cookie("abc", 3600),
            "Authorization=abc; HttpOnly; SameSite=Strict; Path=/; Max-Age=3600"
        );
        assert!(credential_cookie("", 0).ends_with("Max-Age=0"));
    }
}
