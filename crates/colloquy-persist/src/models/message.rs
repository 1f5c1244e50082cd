use std::str::FromStr;

use chrono::{DateTime, Utc};
use colloquy_llm::Role;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StateError};

/// One conversational turn inside a thread.
///
/// Within a thread, messages have a strict chronological order: creation
/// timestamp, with insertion order breaking ties. `token_count` is an
/// informational estimate only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub token_count: i64,
}

/// Raw row shape; role is stored as text and constrained by a CHECK clause.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct MessageRow {
    pub id: String,
    pub thread_id: String,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub token_count: i64,
}

impl TryFrom<MessageRow> for Message {
    type Error = StateError;

    fn try_from(row: MessageRow) -> Result<Self> {
        let role = Role::from_str(&row.role)
            .map_err(|e| StateError::Internal(format!("corrupt role column: {}", e)))?;

        Ok(Self {
            id: row.id,
            thread_id: row.thread_id,
            role,
            content: row.content,
            created_at: row.created_at,
            token_count: row.token_count,
        })
    }
}
