//! # Colloquy
//!
//! Colloquy is a conversational-assistant record-keeper: it stores
//! assistants (named system-prompt + model configurations), threads
//! (conversations) and messages (turns), and can "run" a thread —
//! assembling its ordered history into a prompt, obtaining a completion
//! from an inference backend, and persisting the result as a new message.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use colloquy::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Open the store and build the state manager
//!     let store = Store::open("sqlite://data/colloquy.db").await?;
//!     let state = Arc::new(StateManager::new(store));
//!
//!     // Pick an inference backend once, at startup
//!     let inference: Arc<dyn InferenceClient> =
//!         Arc::new(SimulatedInferenceClient::new());
//!     let orchestrator = RunOrchestrator::new(Arc::clone(&state), inference);
//!
//!     // Record a conversation
//!     let assistant = state
//!         .create_assistant("Bot", "Analyze markets", "gpt-4", None)
//!         .await?;
//!     let thread = state.create_thread(&assistant.id, None, None).await?;
//!     state
//!         .add_message(&thread.id, Role::User, "How are markets?", None)
//!         .await?;
//!
//!     // Run it
//!     let run = orchestrator.create_run(&thread.id, &assistant.id, None).await?;
//!     println!("run {} finished as {:?}", run.id, run.status);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! Colloquy consists of composable crates:
//!
//! - **colloquy-llm**: the inference capability (HTTP backend with
//!   streaming, local simulated backend, token estimation)
//! - **colloquy-persist**: SQLite persistence with a transactional state
//!   manager and cascading deletes
//! - **colloquy-run**: the run orchestrator (one inference cycle per call)
//! - **colloquy-api**: HTTP transport (axum) over all of the above

pub mod prelude;

// LLM layer
pub use colloquy_llm::{
    estimate_tokens, ChatTurn, FragmentStream, GenerateOptions, GenerateRequest,
    HttpInferenceClient, InferenceClient, Role, SimulatedInferenceClient,
};

// Persistence layer
pub use colloquy_persist::{
    Assistant, ContextMessage, Message, StateError, StateManager, Store, Thread, ThreadContext,
};

// Run orchestration
pub use colloquy_run::{Run, RunOrchestrator, RunStatus};
