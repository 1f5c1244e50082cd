use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::sse::{Event, Sse},
    response::{IntoResponse, Response},
    Json,
};
use futures::StreamExt;
use serde::Deserialize;

use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Deserialize)]
pub struct CreateRunRequest {
    pub assistant_id: String,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub stream: bool,
}

/// Execute one inference cycle against a thread.
///
/// Non-streaming requests get the terminal run record; a missing thread or
/// assistant is a request-level 404, while an inference failure is reported
/// through the record's `failed` status. Streaming requests get the
/// fragments as Server-Sent Events ending in a `done` event.
pub async fn create_run(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
    Json(req): Json<CreateRunRequest>,
) -> ApiResult<Response> {
    if req.stream {
        let fragments = state
            .orchestrator
            .create_run_stream(&thread_id, &req.assistant_id, req.instructions.as_deref())
            .await?;

        let sse_stream = fragments.map(|item| {
            let event = match item {
                Ok(fragment) => Event::default().event("message").data(fragment),
                Err(e) => Event::default()
                    .event("error")
                    .data(e.to_string()),
            };
            Ok::<Event, Infallible>(event)
        });

        let done = futures::stream::once(async {
            Ok::<Event, Infallible>(Event::default().event("done").data("[DONE]"))
        });

        Ok(Sse::new(sse_stream.chain(done)).into_response())
    } else {
        let run = state
            .orchestrator
            .create_run(&thread_id, &req.assistant_id, req.instructions.as_deref())
            .await?;

        Ok(Json(run).into_response())
    }
}
