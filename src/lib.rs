//! filmqa - quality management portal backend for a film plant.
//!
//! Stores inspection, maintenance and safety forms in SQLite and renders
//! them onto fixed-layout xlsx templates for download.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod services;
pub mod state;

pub use config::config;
pub use error::{Error, Result};
pub use state::AppState;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the application router with tracing and CORS layers.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(api::routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
