//! API Routes for filmqa
//!
//! This module combines all API routes into a single router.
//! Routes are organized by domain.

mod control_datapoints;
pub mod exports;
mod film_forms;
mod fire_extinguishers;
mod gallery;
mod goods_received;
mod inline_lots;
mod job_postings;
mod job_requisitions;
mod quality_alerts;
pub mod status;
mod users;

use axum::Router;

use crate::AppState;

/// Build the complete API router.
///
/// Route structure:
/// - /health, /ping, /health/ready - Health checks
/// - /export*, /api/download-*, /api/export-* - Spreadsheet downloads
/// - /api/* - Form storage (JSON)
pub fn routes(_state: AppState) -> Router<AppState> {
    Router::new()
        .merge(status::routes())
        .merge(exports::routes())
        .nest("/api", form_routes())
}

/// JSON CRUD routes for the stored forms.
fn form_routes() -> Router<AppState> {
    Router::new()
        .nest("/users", users::routes())
        .nest("/film-inspection-forms", film_forms::routes())
        .nest("/inline-inspection-lots", inline_lots::routes())
        .nest("/quality-alerts", quality_alerts::routes())
        .nest("/fire-extinguishers", fire_extinguishers::routes())
        .nest("/job-postings", job_postings::routes())
        .nest("/gallery", gallery::routes())
        .nest("/goods-received-notes", goods_received::routes())
        .nest("/job-requisitions", job_requisitions::routes())
        .nest("/control-datapoints", control_datapoints::routes())
}
