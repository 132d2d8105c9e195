//! Application state for filmqa.
//!
//! Contains the shared state that is passed to all handlers.

use std::sync::Arc;

use crate::db::DbPool;
use crate::services::Templates;
use crate::{config, Result};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: DbPool,
    /// Spreadsheet template loader.
    pub templates: Arc<Templates>,
}

impl AppState {
    /// Create the application state from the global configuration.
    pub async fn new() -> Result<Self> {
        let config = config::config();

        // Initialize database
        let db = crate::db::init_pool(&config.database.path).await?;

        // Initialize database schema
        crate::db::initialize_schema(&db).await?;

        let templates = Templates::new(&config.export);

        Ok(Self::from_parts(db, templates))
    }

    /// Assemble state from an existing pool and template loader.
    pub fn from_parts(db: DbPool, templates: Templates) -> Self {
        Self {
            db,
            templates: Arc::new(templates),
        }
    }
}
