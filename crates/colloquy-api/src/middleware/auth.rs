use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::state::AppState;

const API_KEY_HEADER: &str = "x-api-key";

/// Single shared credential check for the versioned API surface.
///
/// When no key is configured the check is disabled, which keeps local
/// development friction-free.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let expected = state.config.api_key.as_str();
    if expected.is_empty() {
        return next.run(req).await;
    }

    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    if provided == Some(expected) {
        next.run(req).await
    } else {
        tracing::warn!("Rejected request with invalid or missing API key");
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid or missing API key" })),
        )
            .into_response()
    }
}
