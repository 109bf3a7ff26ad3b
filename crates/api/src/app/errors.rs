use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use inkpost_auth::AuthError;
use inkpost_core::DomainError;
use inkpost_infra::StoreError;

pub fn auth_error_to_response(err: &AuthError) -> axum::response::Response {
    let status = match err {
        // Kept as 404 for compatibility with existing clients.
        AuthError::MissingCredential => StatusCode::NOT_FOUND,
        AuthError::Unauthenticated | AuthError::InvalidPrincipal => StatusCode::UNAUTHORIZED,
        AuthError::Forbidden => StatusCode::FORBIDDEN,
        AuthError::NotFound { .. } => StatusCode::NOT_FOUND,
        AuthError::Lookup(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    json_error(status, err.code(), err.to_string())
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::MissingReference(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        StoreError::Backend(msg) => {
            tracing::error!(error = %msg, "storage failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "storage failure",
            )
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation { .. } => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", err.to_string())
        }
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
    }
}

pub fn password_error_to_response() -> axum::response::Response {
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "password_error",
        "could not process password",
    )
}

pub fn query_error_to_response(err: QueryRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "validation_error", err.body_text())
}

pub fn not_found(resource: &'static str) -> axum::response::Response {
    json_error(
        StatusCode::NOT_FOUND,
        "not_found",
        format!("{resource} not found"),
    )
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
