pub mod models;
pub mod schema;
pub mod store;
pub mod manager;
pub mod context;
pub mod error;

pub use models::{Assistant, Thread, Message};
pub use store::Store;
pub use manager::StateManager;
pub use context::{ThreadContext, ContextMessage};
pub use error::{StateError, Result};

// Role is defined next to the inference types so persisted turns and wire
// turns share one closed enumeration.
pub use colloquy_llm::Role;
