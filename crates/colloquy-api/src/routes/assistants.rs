use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use colloquy_persist::Assistant;

use super::{cap_limit, default_limit, default_skip};
use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Deserialize)]
pub struct CreateAssistantRequest {
    pub name: String,
    pub instructions: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub id: Option<String>,
}

fn default_model() -> String {
    "gpt-4".to_string()
}

#[derive(Debug, Deserialize)]
pub struct UpdateAssistantRequest {
    pub name: Option<String>,
    pub instructions: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AssistantResponse {
    pub id: String,
    pub name: String,
    pub instructions: String,
    pub model: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Assistant> for AssistantResponse {
    fn from(assistant: Assistant) -> Self {
        Self {
            id: assistant.id,
            name: assistant.name,
            instructions: assistant.instructions,
            model: assistant.model,
            created_at: assistant.created_at,
            updated_at: assistant.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListAssistantsQuery {
    #[serde(default = "default_skip")]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[derive(Debug, Serialize)]
pub struct ListAssistantsResponse {
    pub assistants: Vec<AssistantResponse>,
    pub has_more: bool,
}

/// Create a new assistant
pub async fn create_assistant(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAssistantRequest>,
) -> ApiResult<(StatusCode, Json<AssistantResponse>)> {
    let assistant = state
        .manager
        .create_assistant(&req.name, &req.instructions, &req.model, req.id)
        .await?;

    Ok((StatusCode::CREATED, Json(assistant.into())))
}

/// List assistants, newest first
pub async fn list_assistants(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListAssistantsQuery>,
) -> ApiResult<Json<ListAssistantsResponse>> {
    let limit = cap_limit(query.limit);

    let assistants = state.manager.list_assistants(query.skip, limit).await?;

    let has_more = assistants.len() as i64 == limit;
    Ok(Json(ListAssistantsResponse {
        assistants: assistants.into_iter().map(Into::into).collect(),
        has_more,
    }))
}

/// Get a specific assistant by ID
pub async fn get_assistant(
    State(state): State<Arc<AppState>>,
    Path(assistant_id): Path<String>,
) -> ApiResult<Json<AssistantResponse>> {
    let assistant = state.manager.get_assistant(&assistant_id).await?;
    Ok(Json(assistant.into()))
}

/// Partially update an assistant
pub async fn update_assistant(
    State(state): State<Arc<AppState>>,
    Path(assistant_id): Path<String>,
    Json(req): Json<UpdateAssistantRequest>,
) -> ApiResult<Json<AssistantResponse>> {
    let assistant = state
        .manager
        .update_assistant(
            &assistant_id,
            req.name.as_deref(),
            req.instructions.as_deref(),
            req.model.as_deref(),
        )
        .await?;

    Ok(Json(assistant.into()))
}

/// Delete an assistant (cascades to its threads and messages)
pub async fn delete_assistant(
    State(state): State<Arc<AppState>>,
    Path(assistant_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.manager.delete_assistant(&assistant_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
