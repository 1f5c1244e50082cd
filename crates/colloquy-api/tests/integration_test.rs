use axum::response::IntoResponse;
use colloquy_api::error::ApiError;
use colloquy_persist::StateError;

#[tokio::test]
async fn test_not_found_maps_to_404() {
    let error: ApiError = StateError::ThreadNotFound("t-123".to_string()).into();
    let response = error.into_response();
    assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_validation_maps_to_400() {
    let error: ApiError = StateError::Validation("Instructions cannot be empty".to_string()).into();
    let response = error.into_response();
    assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_storage_failure_maps_to_500() {
    let error: ApiError = StateError::Internal("corrupt row".to_string()).into();
    let response = error.into_response();
    assert_eq!(
        response.status(),
        axum::http::StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn test_bad_request_keeps_its_message() {
    let error = ApiError::BadRequest("Test error".to_string());
    assert!(error.to_string().contains("Test error"));

    let response = error.into_response();
    assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
}
