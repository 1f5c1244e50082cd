use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named, reusable system-prompt + model configuration.
///
/// Instances returned by the state manager are detached snapshots; mutating
/// them has no effect on stored state.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Assistant {
    pub id: String,
    pub name: String,
    pub instructions: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
