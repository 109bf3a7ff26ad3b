use std::collections::HashMap;

use axum::{
    extract::{Path, Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
    routing::MethodRouter,
};
use chrono::Utc;

use inkpost_auth::{AccessGate, AuthError, Policy, RouteParams};

use crate::app::errors;
use crate::context::PrincipalContext;

/// Name of the cookie carrying the access token.
pub const CREDENTIAL_COOKIE: &str = "Authorization";

#[derive(Clone)]
pub struct GateState {
    pub gate: AccessGate,
    pub policy: Policy,
}

/// Put `route` behind the access gate with the given policy.
///
/// The gate runs as a route layer, so it only sees requests that matched the
/// route and can read its `:id` segment.
pub fn guarded(route: MethodRouter, gate: &AccessGate, policy: Policy) -> MethodRouter {
    let state = GateState {
        gate: gate.clone(),
        policy,
    };
    route.route_layer(axum::middleware::from_fn_with_state(state, access_middleware))
}

pub async fn access_middleware(
    State(state): State<GateState>,
    params: Option<Path<HashMap<String, String>>>,
    mut req: Request,
    next: Next,
) -> Response {
    let credential = extract_credential(req.headers());
    let route = RouteParams {
        target_id: params.and_then(|Path(p)| p.get("id").and_then(|id| id.parse().ok())),
    };

    let admitted = state
        .gate
        .admit(credential.as_deref(), state.policy, route, Utc::now())
        .await;

    match admitted {
        Ok(principal) => {
            req.extensions_mut().insert(PrincipalContext::new(principal));
            next.run(req).await
        }
        Err(err) => {
            log_refusal(&err, state.policy, req.uri().path());
            errors::auth_error_to_response(&err)
        }
    }
}

fn log_refusal(err: &AuthError, policy: Policy, path: &str) {
    match err {
        AuthError::Lookup(e) => {
            tracing::error!(%policy, path, error = %e, "access check failed")
        }
        other => tracing::debug!(%policy, path, reason = other.code(), "request refused"),
    }
}

/// The access token, cookie first, then `Authorization: Bearer`.
///
/// A header that carries no bearer token (another scheme, or an empty
/// token) counts as no credential at all.
fn extract_credential(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = cookie_credential(headers) {
        return Some(token);
    }

    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn cookie_credential(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == CREDENTIAL_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}
