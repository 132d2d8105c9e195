//! SQLite pool settings for file and in-memory databases.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::str::FromStr;
use std::time::Duration;

use super::DbPool;

/// Where the form data lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    File,
    /// Lost when the last connection closes.
    Memory,
}

impl Storage {
    pub fn of(path: &str) -> Self {
        if path == ":memory:" || path.contains("mode=memory") {
            Storage::Memory
        } else {
            Storage::File
        }
    }
}

/// Connection settings for one storage kind.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub storage: Storage,
    pub max_connections: u32,
    /// How long a writer waits for the database lock.
    pub busy_timeout: Duration,
}

impl PoolSettings {
    pub fn for_storage(storage: Storage) -> Self {
        match storage {
            Storage::File => Self {
                storage,
                max_connections: 8,
                busy_timeout: Duration::from_secs(15),
            },
            // One pinned connection, or every query would see an empty database.
            Storage::Memory => Self {
                storage,
                max_connections: 1,
                busy_timeout: Duration::from_secs(5),
            },
        }
    }

    fn connect_options(&self, path: &str) -> Result<SqliteConnectOptions> {
        let journal = match self.storage {
            Storage::File => SqliteJournalMode::Wal,
            Storage::Memory => SqliteJournalMode::Memory,
        };
        Ok(SqliteConnectOptions::from_str(path)?
            .create_if_missing(true)
            .journal_mode(journal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(self.busy_timeout)
            .foreign_keys(true))
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        let options = SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(10));

        match self.storage {
            Storage::File => options.idle_timeout(Some(Duration::from_secs(600))),
            Storage::Memory => options
                .idle_timeout(None)
                .max_lifetime(None)
                .test_before_acquire(false),
        }
    }

    /// Open the pool.
    pub async fn connect(&self, path: &str) -> Result<DbPool> {
        let options = self.connect_options(path)?;
        Ok(self.pool_options().connect_with(options).await?)
    }
}

/// Health check for the database connection.
pub async fn health_check(pool: &DbPool) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
