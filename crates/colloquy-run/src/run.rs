use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of one inference cycle.
///
/// `Queued` and `InProgress` are transient; in the synchronous design a
/// caller only ever observes `Completed` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
}

/// Terminal record of a synchronous run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub thread_id: String,
    pub assistant_id: String,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl Run {
    pub(crate) fn queued(thread_id: &str, assistant_id: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            thread_id: thread_id.to_string(),
            assistant_id: assistant_id.to_string(),
            status: RunStatus::Queued,
            created_at: Utc::now(),
            completed_at: None,
            last_error: None,
        }
    }

    pub(crate) fn start(&mut self) {
        self.status = RunStatus::InProgress;
    }

    pub(crate) fn complete(&mut self) {
        self.status = RunStatus::Completed;
        self.completed_at = Some(Utc::now());
        self.last_error = None;
    }

    /// A run that fails to generate is a normal, reportable outcome; the
    /// failure text is recorded verbatim and no completion timestamp is set.
    pub(crate) fn fail(&mut self, error: impl Into<String>) {
        self.status = RunStatus::Failed;
        self.completed_at = None;
        self.last_error = Some(error.into());
    }
}
