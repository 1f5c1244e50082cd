use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StateError};

/// A conversation scope owned by an assistant.
///
/// `metadata` is an opaque caller-supplied document; the core never
/// interprets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub assistant_id: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw row shape; metadata is stored as a JSON text column.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ThreadRow {
    pub id: String,
    pub assistant_id: String,
    pub metadata: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ThreadRow> for Thread {
    type Error = StateError;

    fn try_from(row: ThreadRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            assistant_id: row.assistant_id,
            metadata: serde_json::from_str(&row.metadata)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
