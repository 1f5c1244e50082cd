use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use colloquy_llm::{estimate_tokens, Role};
use colloquy_persist::{Message, Thread, ThreadContext};

use super::{cap_limit, default_limit, default_skip};
use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Deserialize)]
pub struct CreateThreadRequest {
    pub assistant_id: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateThreadRequest {
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct ThreadResponse {
    pub id: String,
    pub assistant_id: String,
    pub metadata: serde_json::Value,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Thread> for ThreadResponse {
    fn from(thread: Thread) -> Self {
        Self {
            id: thread.id,
            assistant_id: thread.assistant_id,
            metadata: thread.metadata,
            created_at: thread.created_at,
            updated_at: thread.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListThreadsQuery {
    pub assistant_id: Option<String>,
    #[serde(default = "default_skip")]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[derive(Debug, Serialize)]
pub struct ListThreadsResponse {
    pub threads: Vec<ThreadResponse>,
    pub has_more: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub token_count: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: String,
    pub thread_id: String,
    pub role: Role,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub token_count: i64,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            thread_id: message.thread_id,
            role: message.role,
            content: message.content,
            created_at: message.created_at,
            token_count: message.token_count,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListMessagesQuery {
    #[serde(default = "default_skip")]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[derive(Debug, Serialize)]
pub struct ListMessagesResponse {
    pub messages: Vec<MessageResponse>,
    pub has_more: bool,
}

#[derive(Debug, Deserialize)]
pub struct PruneRequest {
    pub keep_count: i64,
}

#[derive(Debug, Serialize)]
pub struct PruneResponse {
    pub deleted: u64,
}

/// Create a new thread under an existing assistant
pub async fn create_thread(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateThreadRequest>,
) -> ApiResult<(StatusCode, Json<ThreadResponse>)> {
    let thread = state
        .manager
        .create_thread(&req.assistant_id, req.id, req.metadata)
        .await?;

    Ok((StatusCode::CREATED, Json(thread.into())))
}

/// List threads, newest first, optionally filtered by assistant
pub async fn list_threads(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListThreadsQuery>,
) -> ApiResult<Json<ListThreadsResponse>> {
    let limit = cap_limit(query.limit);

    let threads = state
        .manager
        .list_threads(query.assistant_id.as_deref(), query.skip, limit)
        .await?;

    let has_more = threads.len() as i64 == limit;
    Ok(Json(ListThreadsResponse {
        threads: threads.into_iter().map(Into::into).collect(),
        has_more,
    }))
}

/// Get a specific thread by ID
pub async fn get_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<ThreadResponse>> {
    let thread = state.manager.get_thread(&thread_id).await?;
    Ok(Json(thread.into()))
}

/// Replace a thread's metadata document
pub async fn update_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
    Json(req): Json<UpdateThreadRequest>,
) -> ApiResult<Json<ThreadResponse>> {
    let thread = state.manager.update_thread(&thread_id, req.metadata).await?;
    Ok(Json(thread.into()))
}

/// Delete a thread (cascades to its messages)
pub async fn delete_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.manager.delete_thread(&thread_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Append a message to a thread.
///
/// When the caller supplies no token count, the shared heuristic fills one
/// in so user turns and generated turns are estimated the same way.
pub async fn add_message(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
    Json(req): Json<CreateMessageRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let token_count = req
        .token_count
        .unwrap_or_else(|| i64::from(estimate_tokens(&req.content)));

    let message = state
        .manager
        .add_message(&thread_id, req.role, &req.content, Some(token_count))
        .await?;

    Ok((StatusCode::CREATED, Json(message.into())))
}

/// List a thread's messages in conversational order (oldest first)
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
    Query(query): Query<ListMessagesQuery>,
) -> ApiResult<Json<ListMessagesResponse>> {
    let limit = cap_limit(query.limit);

    let messages = state
        .manager
        .get_messages(&thread_id, query.skip, limit)
        .await?;

    let has_more = messages.len() as i64 == limit;
    Ok(Json(ListMessagesResponse {
        messages: messages.into_iter().map(Into::into).collect(),
        has_more,
    }))
}

/// Full ordered conversation snapshot, as handed to inference
pub async fn get_context(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<ThreadContext>> {
    let context = state.manager.get_thread_context(&thread_id).await?;
    Ok(Json(context))
}

/// Prune a thread's history down to its most recent messages
pub async fn prune_messages(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
    Json(req): Json<PruneRequest>,
) -> ApiResult<Json<PruneResponse>> {
    let deleted = state
        .manager
        .delete_old_messages(&thread_id, req.keep_count)
        .await?;

    Ok(Json(PruneResponse { deleted }))
}
