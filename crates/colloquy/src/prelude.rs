//! Prelude module for convenient imports
//!
//! Import everything you need with:
//! ```rust
//! use colloquy::prelude::*;
//! ```

pub use crate::{
    Assistant, ChatTurn, ContextMessage, FragmentStream, GenerateOptions, GenerateRequest,
    HttpInferenceClient, InferenceClient, Message, Role, Run, RunOrchestrator, RunStatus,
    SimulatedInferenceClient, StateError, StateManager, Store, Thread, ThreadContext,
};
