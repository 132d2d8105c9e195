//! Inline inspection lot endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::{
    db::{self, InlineInspectionLot, LotFilter, SaveInlineInspectionLot},
    error::Result,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_lots).post(create_lot))
        .route("/:id", get(get_lot).put(update_lot).delete(delete_lot))
}

#[derive(Debug, Deserialize, Default)]
pub struct ListLotsQuery {
    pub traceability_code: Option<String>,
    pub lot_letter: Option<String>,
}

async fn list_lots(
    State(state): State<AppState>,
    Query(query): Query<ListLotsQuery>,
) -> Result<Json<Vec<InlineInspectionLot>>> {
    let filter = LotFilter {
        traceability_code: query.traceability_code,
        lot_letter: query.lot_letter,
        ..Default::default()
    };
    Ok(Json(db::list_lots(&state.db, &filter).await?))
}

async fn create_lot(
    State(state): State<AppState>,
    Json(request): Json<SaveInlineInspectionLot>,
) -> Result<impl IntoResponse> {
    let lot = db::create_lot(&state.db, request).await?;
    tracing::info!(
        traceability_code = %lot.traceability_code,
        lot_letter = %lot.lot_letter,
        "Inline inspection lot saved"
    );
    Ok((StatusCode::CREATED, Json(lot)))
}

async fn get_lot(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<InlineInspectionLot>> {
    Ok(Json(db::get_lot(&state.db, &id).await?))
}

async fn update_lot(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SaveInlineInspectionLot>,
) -> Result<Json<InlineInspectionLot>> {
    Ok(Json(db::update_lot(&state.db, &id, request).await?))
}

async fn delete_lot(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode> {
    db::delete_lot(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
