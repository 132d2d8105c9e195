//! Quality alert endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::{
    db::{self, CreateQualityAlert, QualityAlert},
    error::Result,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_alerts).post(create_alert))
        .route("/:id", get(get_alert).delete(delete_alert))
}

async fn list_alerts(State(state): State<AppState>) -> Result<Json<Vec<QualityAlert>>> {
    Ok(Json(db::list_alerts(&state.db).await?))
}

async fn create_alert(
    State(state): State<AppState>,
    Json(request): Json<CreateQualityAlert>,
) -> Result<impl IntoResponse> {
    let alert = db::create_alert(&state.db, request).await?;
    tracing::info!(alert_id = alert.id, "Quality alert raised");
    Ok((StatusCode::CREATED, Json(alert)))
}

async fn get_alert(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<QualityAlert>> {
    Ok(Json(db::get_alert(&state.db, id).await?))
}

async fn delete_alert(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode> {
    db::delete_alert(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
