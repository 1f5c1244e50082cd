use thiserror::Error;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("Assistant not found: {0}")]
    AssistantNotFound(String),

    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("Message not found: {0}")]
    MessageNotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Invalid metadata document: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StateError {
    /// True for the not-found family, regardless of entity.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::AssistantNotFound(_) | Self::ThreadNotFound(_) | Self::MessageNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, StateError>;
