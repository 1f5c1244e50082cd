//! Relational schema for the three entities.
//!
//! Foreign keys carry ON DELETE CASCADE so a parent delete removes the whole
//! subtree in one statement; `PRAGMA foreign_keys = ON` is set per
//! connection by the store. The indices cover the three access patterns
//! every query uses: point lookup by id, scan by owning foreign key, and
//! ordering by creation timestamp.

pub(crate) const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS assistants (
    id           TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    instructions TEXT NOT NULL,
    model        TEXT NOT NULL DEFAULT 'gpt-4',
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_assistants_created_at ON assistants(created_at);

CREATE TABLE IF NOT EXISTS threads (
    id           TEXT PRIMARY KEY,
    assistant_id TEXT NOT NULL REFERENCES assistants(id) ON DELETE CASCADE,
    metadata     TEXT NOT NULL DEFAULT '{}',
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_threads_assistant_id ON threads(assistant_id);
CREATE INDEX IF NOT EXISTS idx_threads_created_at   ON threads(created_at);

CREATE TABLE IF NOT EXISTS messages (
    id          TEXT PRIMARY KEY,
    thread_id   TEXT NOT NULL REFERENCES threads(id) ON DELETE CASCADE,
    role        TEXT NOT NULL CHECK(role IN ('system', 'user', 'assistant')),
    content     TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    token_count INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_messages_thread_id  ON messages(thread_id);
CREATE INDEX IF NOT EXISTS idx_messages_created_at ON messages(created_at);
"#;
