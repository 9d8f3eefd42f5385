//! Experimentation collaborator endpoints.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::experiments::flag_definitions;
use crate::experiments::signature::{verify_signature, SIGNATURE_HEADER};
use crate::http::cookies::CookieJar;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::routing::visitor::generate_user_id;

/// Datafile revalidation webhook.
pub async fn revalidate_datafile(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(secret) = state.webhook_secret.as_deref() else {
        tracing::error!("Webhook secret is not configured");
        metrics::record_webhook("misconfigured");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "message": "Internal server error" })),
        )
            .into_response();
    };

    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    match verify_signature(secret.as_bytes(), signature, &body) {
        Ok(()) => {
            state.datafile.invalidate();
            metrics::record_webhook("accepted");
            tracing::info!("Revalidating experiment datafile");
            (StatusCode::OK, Json(json!({ "success": true }))).into_response()
        }
        Err(e) => {
            metrics::record_webhook("rejected");
            tracing::warn!(error = %e, "Rejected datafile webhook");
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "success": false, "message": "Invalid webhook request" })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TrackClick {
    #[serde(default)]
    pub button_text: Option<String>,
}

/// Forward a button click for the current visitor.
pub async fn track_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<TrackClick>,
) -> Response {
    let Some(flags) = &state.flags else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "success": false, "error": "Experimentation is disabled" })),
        )
            .into_response();
    };

    let jar = CookieJar::from_headers(&headers);
    let user_id = jar
        .get(&state.cookies.user_id)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .unwrap_or_else(generate_user_id);

    match flags.track_click(&user_id, payload.button_text.as_deref()).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to track button click");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "success": false, "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// Flag definitions and the cached datafile revision.
pub async fn flag_discovery(State(state): State<AppState>) -> Json<Value> {
    let revision = state
        .datafile
        .cached()
        .and_then(|d| d.revision.clone());

    Json(json!({
        "definitions": flag_definitions(&state.flag_config),
        "datafile_revision": revision,
    }))
}
