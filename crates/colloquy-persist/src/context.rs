use chrono::{DateTime, Utc};
use colloquy_llm::{ChatTurn, Role};
use serde::{Deserialize, Serialize};

use crate::models::Message;

/// Detached snapshot of a thread's full conversation, ready for inference.
///
/// Messages are in canonical chronological order (oldest first). This is
/// the exact payload handed to the inference capability once persistence
/// metadata is stripped by [`ThreadContext::chat_turns`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadContext {
    pub thread_id: String,
    pub assistant_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<ContextMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub token_count: i64,
}

impl From<Message> for ContextMessage {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            role: message.role,
            content: message.content,
            timestamp: message.created_at,
            token_count: message.token_count,
        }
    }
}

impl ThreadContext {
    /// Reduce to the ordered role/content turns an inference backend takes.
    pub fn chat_turns(&self) -> Vec<ChatTurn> {
        self.messages
            .iter()
            .map(|m| ChatTurn::new(m.role, m.content.clone()))
            .collect()
    }
}
