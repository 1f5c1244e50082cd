use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use colloquy_persist::StateError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error")]
    Internal,
}

/// Structural caller mistakes keep their message; storage failures are
/// logged in full and redacted in the response body.
impl From<StateError> for ApiError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::AssistantNotFound(_)
            | StateError::ThreadNotFound(_)
            | StateError::MessageNotFound(_) => Self::NotFound(err.to_string()),
            StateError::Validation(_) => Self::BadRequest(err.to_string()),
            StateError::Storage(_) | StateError::Metadata(_) | StateError::Internal(_) => {
                Self::Storage(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Storage(ref e) => {
                tracing::error!("Storage error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
            }
            ApiError::Internal => {
                tracing::error!("Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
