use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::error::Result;
use crate::schema::SCHEMA;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Connection pool over the SQLite database, schema applied at open.
///
/// Every pooled connection gets `foreign_keys = ON`, so referential
/// integrity and cascade deletes are enforced at the storage boundary even
/// when the state manager's own existence checks are bypassed.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if missing) the database at `database_url`,
    /// e.g. `sqlite://data/colloquy.db`.
    pub async fn open(database_url: &str) -> Result<Self> {
        Self::open_with_pool_size(database_url, DEFAULT_MAX_CONNECTIONS).await
    }

    pub async fn open_with_pool_size(database_url: &str, max_connections: u32) -> Result<Self> {
        ensure_database_directory(database_url)?;

        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        sqlx::raw_sql(SCHEMA).execute(&pool).await?;

        tracing::info!(database_url, "Store opened, schema ensured");
        Ok(Self { pool })
    }

    /// In-memory database for tests. A single pooled connection held open
    /// for the pool's lifetime, so every handle sees the same database.
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        sqlx::raw_sql(SCHEMA).execute(&pool).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// SQLite creates missing database files but not missing directories.
fn ensure_database_directory(database_url: &str) -> Result<()> {
    let Some(path) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                crate::error::StateError::Internal(format!(
                    "Failed to create database directory: {}",
                    e
                ))
            })?;
        }
    }
    Ok(())
}
