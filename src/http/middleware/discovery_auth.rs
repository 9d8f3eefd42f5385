//! Bearer-token guard for the flag discovery endpoint.

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::http::server::AppState;

pub async fn discovery_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    // Discovery is off unless a secret is configured.
    let Some(secret) = state.flag_config.discovery_secret.as_deref() else {
        return Err(StatusCode::NOT_FOUND);
    };

    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if let Some(token) = token {
        if bool::from(token.as_bytes().ct_eq(secret.as_bytes())) {
            return Ok(next.run(request).await);
        }
    }

    Err(StatusCode::UNAUTHORIZED)
}
