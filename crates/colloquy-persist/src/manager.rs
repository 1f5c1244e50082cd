use chrono::Utc;
use colloquy_llm::Role;
use uuid::Uuid;

use crate::context::{ContextMessage, ThreadContext};
use crate::error::{Result, StateError};
use crate::models::{Assistant, Message, MessageRow, Thread, ThreadRow};
use crate::store::Store;

/// The sole mutation and query surface for assistants, threads and messages.
///
/// Every operation acquires a session from the pool, runs inside one
/// transaction, and commits or rolls back before returning — an
/// uncommitted transaction rolls back when dropped, so no partial state
/// survives an early error return. Returned entities are detached
/// snapshots, never live handles into the store.
pub struct StateManager {
    store: Store,
}

impl StateManager {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    fn pool(&self) -> &sqlx::SqlitePool {
        self.store.pool()
    }

    // Assistant operations

    /// Create an assistant. Generates an id when none is supplied.
    pub async fn create_assistant(
        &self,
        name: &str,
        instructions: &str,
        model: &str,
        assistant_id: Option<String>,
    ) -> Result<Assistant> {
        validate_instructions(instructions)?;

        let now = Utc::now();
        let assistant = Assistant {
            id: assistant_id.unwrap_or_else(new_id),
            name: name.to_string(),
            instructions: instructions.to_string(),
            model: model.to_string(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO assistants (id, name, instructions, model, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&assistant.id)
        .bind(&assistant.name)
        .bind(&assistant.instructions)
        .bind(&assistant.model)
        .bind(assistant.created_at)
        .bind(assistant.updated_at)
        .execute(self.pool())
        .await?;

        tracing::info!(assistant_id = %assistant.id, "Created assistant");
        Ok(assistant)
    }

    pub async fn get_assistant(&self, assistant_id: &str) -> Result<Assistant> {
        sqlx::query_as::<_, Assistant>("SELECT * FROM assistants WHERE id = ?")
            .bind(assistant_id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| StateError::AssistantNotFound(assistant_id.to_string()))
    }

    /// Partial update: only supplied fields change; the update timestamp is
    /// refreshed on any successful update.
    pub async fn update_assistant(
        &self,
        assistant_id: &str,
        name: Option<&str>,
        instructions: Option<&str>,
        model: Option<&str>,
    ) -> Result<Assistant> {
        if let Some(instructions) = instructions {
            validate_instructions(instructions)?;
        }

        let mut tx = self.pool().begin().await?;

        let mut assistant =
            sqlx::query_as::<_, Assistant>("SELECT * FROM assistants WHERE id = ?")
                .bind(assistant_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| StateError::AssistantNotFound(assistant_id.to_string()))?;

        if let Some(name) = name {
            assistant.name = name.to_string();
        }
        if let Some(instructions) = instructions {
            assistant.instructions = instructions.to_string();
        }
        if let Some(model) = model {
            assistant.model = model.to_string();
        }
        assistant.updated_at = Utc::now();

        sqlx::query(
            "UPDATE assistants SET name = ?, instructions = ?, model = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&assistant.name)
        .bind(&assistant.instructions)
        .bind(&assistant.model)
        .bind(assistant.updated_at)
        .bind(assistant_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(assistant_id, "Updated assistant");
        Ok(assistant)
    }

    /// Delete an assistant; cascades to its threads and their messages in
    /// the same transaction.
    pub async fn delete_assistant(&self, assistant_id: &str) -> Result<()> {
        let mut tx = self.pool().begin().await?;

        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM assistants WHERE id = ?")
            .bind(assistant_id)
            .fetch_one(&mut *tx)
            .await?;

        if exists == 0 {
            return Err(StateError::AssistantNotFound(assistant_id.to_string()));
        }

        sqlx::query("DELETE FROM assistants WHERE id = ?")
            .bind(assistant_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(assistant_id, "Deleted assistant and associated data");
        Ok(())
    }

    /// Newest first, offset pagination.
    pub async fn list_assistants(&self, skip: i64, limit: i64) -> Result<Vec<Assistant>> {
        let assistants = sqlx::query_as::<_, Assistant>(
            "SELECT * FROM assistants ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(skip)
        .fetch_all(self.pool())
        .await?;

        tracing::debug!(count = assistants.len(), "Listed assistants");
        Ok(assistants)
    }

    // Thread operations

    /// Create a thread under an existing assistant. The existence check and
    /// the insert share one transaction, so the assistant cannot vanish
    /// between the two.
    pub async fn create_thread(
        &self,
        assistant_id: &str,
        thread_id: Option<String>,
        metadata: Option<serde_json::Value>,
    ) -> Result<Thread> {
        let mut tx = self.pool().begin().await?;

        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM assistants WHERE id = ?")
            .bind(assistant_id)
            .fetch_one(&mut *tx)
            .await?;

        if exists == 0 {
            return Err(StateError::AssistantNotFound(assistant_id.to_string()));
        }

        let now = Utc::now();
        let thread = Thread {
            id: thread_id.unwrap_or_else(new_id),
            assistant_id: assistant_id.to_string(),
            metadata: metadata.unwrap_or_else(|| serde_json::json!({})),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO threads (id, assistant_id, metadata, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&thread.id)
        .bind(&thread.assistant_id)
        .bind(serde_json::to_string(&thread.metadata)?)
        .bind(thread.created_at)
        .bind(thread.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(thread_id = %thread.id, assistant_id, "Created thread");
        Ok(thread)
    }

    pub async fn get_thread(&self, thread_id: &str) -> Result<Thread> {
        let row = sqlx::query_as::<_, ThreadRow>("SELECT * FROM threads WHERE id = ?")
            .bind(thread_id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| StateError::ThreadNotFound(thread_id.to_string()))?;

        row.try_into()
    }

    pub async fn update_thread(
        &self,
        thread_id: &str,
        metadata: Option<serde_json::Value>,
    ) -> Result<Thread> {
        let mut tx = self.pool().begin().await?;

        let row = sqlx::query_as::<_, ThreadRow>("SELECT * FROM threads WHERE id = ?")
            .bind(thread_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StateError::ThreadNotFound(thread_id.to_string()))?;

        let mut thread: Thread = row.try_into()?;

        if let Some(metadata) = metadata {
            thread.metadata = metadata;
        }
        thread.updated_at = Utc::now();

        sqlx::query("UPDATE threads SET metadata = ?, updated_at = ? WHERE id = ?")
            .bind(serde_json::to_string(&thread.metadata)?)
            .bind(thread.updated_at)
            .bind(thread_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(thread_id, "Updated thread");
        Ok(thread)
    }

    /// Delete a thread; cascades to its messages in the same transaction.
    pub async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        let mut tx = self.pool().begin().await?;

        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM threads WHERE id = ?")
            .bind(thread_id)
            .fetch_one(&mut *tx)
            .await?;

        if exists == 0 {
            return Err(StateError::ThreadNotFound(thread_id.to_string()));
        }

        sqlx::query("DELETE FROM threads WHERE id = ?")
            .bind(thread_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(thread_id, "Deleted thread and associated messages");
        Ok(())
    }

    /// Newest first, optionally filtered by owning assistant.
    pub async fn list_threads(
        &self,
        assistant_id: Option<&str>,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Thread>> {
        let rows = match assistant_id {
            Some(assistant_id) => {
                sqlx::query_as::<_, ThreadRow>(
                    "SELECT * FROM threads WHERE assistant_id = ?
                     ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
                )
                .bind(assistant_id)
                .bind(limit)
                .bind(skip)
                .fetch_all(self.pool())
                .await?
            }
            None => {
                sqlx::query_as::<_, ThreadRow>(
                    "SELECT * FROM threads ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
                )
                .bind(limit)
                .bind(skip)
                .fetch_all(self.pool())
                .await?
            }
        };

        tracing::debug!(count = rows.len(), "Listed threads");
        rows.into_iter().map(Thread::try_from).collect()
    }

    // Message operations

    /// Append a message to an existing thread.
    ///
    /// Role arrives as the closed enum — transport-level deserialization is
    /// the single point where invalid role text is rejected.
    pub async fn add_message(
        &self,
        thread_id: &str,
        role: Role,
        content: &str,
        token_count: Option<i64>,
    ) -> Result<Message> {
        let mut tx = self.pool().begin().await?;

        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM threads WHERE id = ?")
            .bind(thread_id)
            .fetch_one(&mut *tx)
            .await?;

        if exists == 0 {
            return Err(StateError::ThreadNotFound(thread_id.to_string()));
        }

        let message = Message {
            id: new_id(),
            thread_id: thread_id.to_string(),
            role,
            content: content.to_string(),
            created_at: Utc::now(),
            token_count: token_count.unwrap_or(0),
        };

        sqlx::query(
            "INSERT INTO messages (id, thread_id, role, content, created_at, token_count)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&message.id)
        .bind(&message.thread_id)
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(message.created_at)
        .bind(message.token_count)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(message_id = %message.id, thread_id, "Added message");
        Ok(message)
    }

    /// Messages in conversational replay order (oldest first) — the inverse
    /// of the entity listings' recent-activity order.
    pub async fn get_messages(
        &self,
        thread_id: &str,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Message>> {
        let mut tx = self.pool().begin().await?;

        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM threads WHERE id = ?")
            .bind(thread_id)
            .fetch_one(&mut *tx)
            .await?;

        if exists == 0 {
            return Err(StateError::ThreadNotFound(thread_id.to_string()));
        }

        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT * FROM messages WHERE thread_id = ?
             ORDER BY created_at ASC, rowid ASC LIMIT ? OFFSET ?",
        )
        .bind(thread_id)
        .bind(limit)
        .bind(skip)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(count = rows.len(), thread_id, "Retrieved messages");
        rows.into_iter().map(Message::try_from).collect()
    }

    /// Assemble the complete ordered context of a thread in one consistent
    /// snapshot.
    pub async fn get_thread_context(&self, thread_id: &str) -> Result<ThreadContext> {
        let mut tx = self.pool().begin().await?;

        let thread_row = sqlx::query_as::<_, ThreadRow>("SELECT * FROM threads WHERE id = ?")
            .bind(thread_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StateError::ThreadNotFound(thread_id.to_string()))?;

        let message_rows = sqlx::query_as::<_, MessageRow>(
            "SELECT * FROM messages WHERE thread_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(thread_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let thread: Thread = thread_row.try_into()?;
        let messages = message_rows
            .into_iter()
            .map(|row| Message::try_from(row).map(ContextMessage::from))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            thread_id,
            messages = messages.len(),
            "Loaded thread context"
        );

        Ok(ThreadContext {
            thread_id: thread.id,
            assistant_id: thread.assistant_id,
            created_at: thread.created_at,
            updated_at: thread.updated_at,
            messages,
        })
    }

    /// Prune a thread's history to its `keep_count` most recent messages.
    ///
    /// Deletes exactly `max(0, total - keep_count)` of the oldest messages;
    /// the kept suffix stays in order. Returns the number deleted.
    pub async fn delete_old_messages(&self, thread_id: &str, keep_count: i64) -> Result<u64> {
        let mut tx = self.pool().begin().await?;

        let thread_exists =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM threads WHERE id = ?")
                .bind(thread_id)
                .fetch_one(&mut *tx)
                .await?;

        if thread_exists == 0 {
            return Err(StateError::ThreadNotFound(thread_id.to_string()));
        }

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM messages WHERE thread_id = ?",
        )
        .bind(thread_id)
        .fetch_one(&mut *tx)
        .await?;

        let delete_count = (total - keep_count).max(0);
        if delete_count == 0 {
            tx.commit().await?;
            return Ok(0);
        }

        let deleted = sqlx::query(
            "DELETE FROM messages WHERE id IN (
                 SELECT id FROM messages WHERE thread_id = ?
                 ORDER BY created_at ASC, rowid ASC LIMIT ?
             )",
        )
        .bind(thread_id)
        .bind(delete_count)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        tracing::info!(
            thread_id,
            deleted,
            keep_count,
            "Pruned old messages"
        );
        Ok(deleted)
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn validate_instructions(instructions: &str) -> Result<()> {
    if instructions.trim().is_empty() {
        return Err(StateError::Validation(
            "Instructions cannot be empty".to_string(),
        ));
    }
    Ok(())
}
