//! Goods received note (GRN) endpoints.
//!
//! A GRN is saved as a draft and submitted once. Submitted notes are
//! read-only.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::{
    db::{self, GoodsReceivedNote, GrnStatus, GrnWithItems, SaveGoodsReceivedNote},
    error::Result,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notes).post(create_note))
        .route("/:id", get(get_note).put(update_note).delete(delete_note))
        .route("/:id/submit", post(submit_note))
}

#[derive(Debug, Deserialize, Default)]
pub struct ListNotesQuery {
    pub status: Option<GrnStatus>,
}

async fn list_notes(
    State(state): State<AppState>,
    Query(query): Query<ListNotesQuery>,
) -> Result<Json<Vec<GoodsReceivedNote>>> {
    Ok(Json(db::list_grns(&state.db, query.status).await?))
}

async fn create_note(
    State(state): State<AppState>,
    Json(request): Json<SaveGoodsReceivedNote>,
) -> Result<impl IntoResponse> {
    let note = db::create_grn(&state.db, request).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

async fn get_note(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<GrnWithItems>> {
    Ok(Json(db::get_grn(&state.db, &id).await?))
}

async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SaveGoodsReceivedNote>,
) -> Result<Json<GrnWithItems>> {
    Ok(Json(db::update_grn(&state.db, &id, request).await?))
}

async fn submit_note(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<GrnWithItems>> {
    let note = db::submit_grn(&state.db, &id).await?;
    tracing::info!(grn_id = %id, "GRN submitted");
    Ok(Json(note))
}

async fn delete_note(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode> {
    db::delete_grn(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
