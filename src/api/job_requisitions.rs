//! Maintenance job requisition endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::{
    db::{self, JobRequisition, SaveJobRequisition},
    error::Result,
    AppState,
};

use super::exports::HistoryCardQuery;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_requisitions).post(create_requisition))
        .route("/:id", get(get_requisition).delete(delete_requisition))
}

/// Accepts the same filters as the history card export.
async fn list_requisitions(
    State(state): State<AppState>,
    Query(query): Query<HistoryCardQuery>,
) -> Result<Json<Vec<JobRequisition>>> {
    let filter = query.into_filter();
    Ok(Json(db::list_requisitions(&state.db, &filter).await?))
}

async fn create_requisition(
    State(state): State<AppState>,
    Json(request): Json<SaveJobRequisition>,
) -> Result<impl IntoResponse> {
    let requisition = db::create_requisition(&state.db, request).await?;
    Ok((StatusCode::CREATED, Json(requisition)))
}

async fn get_requisition(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobRequisition>> {
    Ok(Json(db::get_requisition(&state.db, &id).await?))
}

async fn delete_requisition(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    db::delete_requisition(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
