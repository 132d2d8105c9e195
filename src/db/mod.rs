//! Database layer for filmqa.
//!
//! Provides SQLite connection pooling and query modules
//! for every stored form type.

mod control_datapoints;
mod film_inspection;
mod fire_extinguishers;
mod gallery;
mod goods_received;
mod inline_inspection;
mod job_postings;
mod job_requisitions;
mod pool;
mod quality_alerts;
mod users;

pub use control_datapoints::*;
pub use film_inspection::*;
pub use fire_extinguishers::*;
pub use gallery::*;
pub use goods_received::*;
pub use inline_inspection::*;
pub use job_postings::*;
pub use job_requisitions::*;
pub use pool::{health_check, PoolSettings, Storage};
pub use quality_alerts::*;
pub use users::*;

use crate::Result;
use std::path::Path;
use tracing::info;

/// Type alias for the SQLite connection pool.
pub type DbPool = sqlx::SqlitePool;

/// Initialize the database connection pool.
///
/// Creates parent directories if needed. An in-memory database is pinned
/// to a single connection so every query sees the same data.
pub async fn init_pool(path: &str) -> Result<DbPool> {
    let storage = Storage::of(path);
    if storage == Storage::File {
        // Create parent directories if they don't exist
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
    }

    let pool = PoolSettings::for_storage(storage).connect(path).await?;

    info!("Database pool initialized: {}", path);

    Ok(pool)
}

/// Initialize the database schema.
///
/// Applies the complete schema from schema.sql. Uses IF NOT EXISTS
/// clauses so it's safe to run multiple times.
pub async fn initialize_schema(pool: &DbPool) -> Result<()> {
    let schema = include_str!("../../schema.sql");

    info!("Initializing database schema");

    for statement in schema.split(';') {
        // Strip comment lines, keeping only actual SQL
        let clean_stmt: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let clean_stmt = clean_stmt.trim();
        if clean_stmt.is_empty() {
            continue;
        }
        sqlx::query(clean_stmt).execute(pool).await?;
    }

    info!("Database schema initialized successfully");

    Ok(())
}

/// Parse a JSON text column, falling back to `Value::Null` on malformed data.
pub(crate) fn parse_json_column(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        tracing::warn!("Malformed JSON column ignored: {}", e);
        serde_json::Value::Null
    })
}
