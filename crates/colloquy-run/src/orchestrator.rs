use std::sync::Arc;

use colloquy_llm::{
    estimate_tokens, ChatTurn, FragmentStream, GenerateOptions, GenerateRequest,
    InferenceClient, Role,
};
use colloquy_persist::{StateError, StateManager};
use futures::StreamExt;

use crate::run::Run;

/// Executes exactly one inference cycle against a thread and reports a
/// terminal status. Owns no persistent state of its own.
///
/// Structural failures (missing thread or assistant) are the caller's
/// mistake and propagate as errors before inference is attempted. A failure
/// of the inference call itself, or of the write-back, is a normal business
/// outcome: it is caught and converted into a `Failed` run record.
pub struct RunOrchestrator {
    state: Arc<StateManager>,
    inference: Arc<dyn InferenceClient>,
    options: GenerateOptions,
}

impl RunOrchestrator {
    pub fn new(state: Arc<StateManager>, inference: Arc<dyn InferenceClient>) -> Self {
        Self {
            state,
            inference,
            options: GenerateOptions::default(),
        }
    }

    /// Override the generation parameters used for every run.
    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    /// Validate the request and build the inference payload.
    ///
    /// Shared head of both run paths: thread and assistant must exist
    /// (propagating NotFound untouched), then the full ordered context is
    /// loaded. A caller-supplied instructions override is prepended as a
    /// transient system turn, never persisted.
    async fn prepare_request(
        &self,
        thread_id: &str,
        assistant_id: &str,
        instructions: Option<&str>,
    ) -> Result<GenerateRequest, StateError> {
        self.state.get_thread(thread_id).await?;
        let assistant = self.state.get_assistant(assistant_id).await?;
        let context = self.state.get_thread_context(thread_id).await?;

        let mut turns = context.chat_turns();
        if let Some(instructions) = instructions {
            if !instructions.trim().is_empty() {
                turns.insert(0, ChatTurn::system(instructions));
            }
        }

        tracing::debug!(
            thread_id,
            assistant_id,
            turns = turns.len(),
            "Prepared inference request"
        );

        Ok(GenerateRequest::new(&assistant.model, turns).with_options(self.options.clone()))
    }

    /// Synchronous run: generate a completion, persist it as an
    /// assistant-role message, and return the terminal run record.
    pub async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        instructions: Option<&str>,
    ) -> Result<Run, StateError> {
        let mut run = Run::queued(thread_id, assistant_id);
        tracing::info!(run_id = %run.id, thread_id, "Creating run");

        let request = self
            .prepare_request(thread_id, assistant_id, instructions)
            .await?;
        run.start();

        match self.inference.generate(request).await {
            Ok(text) => {
                let token_count = i64::from(estimate_tokens(&text));
                match self
                    .state
                    .add_message(thread_id, Role::Assistant, &text, Some(token_count))
                    .await
                {
                    Ok(_) => run.complete(),
                    Err(e) => {
                        tracing::error!(run_id = %run.id, "Failed to persist completion: {}", e);
                        run.fail(e.to_string());
                    }
                }
            }
            Err(e) => {
                tracing::warn!(run_id = %run.id, "Inference failed: {}", e);
                run.fail(e.to_string());
            }
        }

        Ok(run)
    }

    /// Streaming run: fragments are handed to the caller as the backend
    /// produces them.
    ///
    /// The orchestrator accumulates the fragments it relays and, when the
    /// backend signals normal completion, persists the aggregate as one
    /// assistant-role message. A stream that ends in an error persists
    /// nothing; a persistence failure after the stream is fully delivered is
    /// logged rather than surfaced.
    pub async fn create_run_stream(
        &self,
        thread_id: &str,
        assistant_id: &str,
        instructions: Option<&str>,
    ) -> Result<FragmentStream, StateError> {
        let request = self
            .prepare_request(thread_id, assistant_id, instructions)
            .await?;

        let state = Arc::clone(&self.state);
        let inference = Arc::clone(&self.inference);
        let thread_id = thread_id.to_string();

        Ok(Box::pin(async_stream::stream! {
            let mut fragments = match inference.generate_stream(request).await {
                Ok(fragments) => fragments,
                Err(e) => {
                    tracing::warn!(thread_id = %thread_id, "Inference stream failed to open: {}", e);
                    yield Err(e);
                    return;
                }
            };

            let mut aggregate = String::new();
            while let Some(item) = fragments.next().await {
                match item {
                    Ok(fragment) => {
                        aggregate.push_str(&fragment);
                        yield Ok(fragment);
                    }
                    Err(e) => {
                        tracing::warn!(thread_id = %thread_id, "Inference stream dropped: {}", e);
                        yield Err(e);
                        return;
                    }
                }
            }

            if !aggregate.is_empty() {
                let token_count = i64::from(estimate_tokens(&aggregate));
                if let Err(e) = state
                    .add_message(&thread_id, Role::Assistant, &aggregate, Some(token_count))
                    .await
                {
                    tracing::error!(
                        thread_id = %thread_id,
                        "Failed to persist streamed completion: {}",
                        e
                    );
                }
            }
        }))
    }
}
