//! Fire extinguisher register endpoints.
//!
//! Routes:
//! - GET/POST /api/fire-extinguishers
//! - GET/PUT/DELETE /api/fire-extinguishers/:id
//! - POST /api/fire-extinguishers/inspections - Record an inspection (find-or-create)
//! - DELETE /api/fire-extinguishers/:id/inspections/:inspection_id

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Local;

use crate::{
    db::{self, FireExtinguisher, RecordInspection, SaveFireExtinguisher},
    error::Result,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_extinguishers).post(create_extinguisher))
        .route("/inspections", post(record_inspection))
        .route(
            "/:id",
            get(get_extinguisher)
                .put(update_extinguisher)
                .delete(delete_extinguisher),
        )
        .route("/:id/inspections/:inspection_id", delete(delete_inspection))
}

async fn list_extinguishers(State(state): State<AppState>) -> Result<Json<Vec<FireExtinguisher>>> {
    Ok(Json(db::list_extinguishers(&state.db).await?))
}

async fn create_extinguisher(
    State(state): State<AppState>,
    Json(request): Json<SaveFireExtinguisher>,
) -> Result<impl IntoResponse> {
    let extinguisher = db::create_extinguisher(&state.db, request).await?;
    Ok((StatusCode::CREATED, Json(extinguisher)))
}

async fn get_extinguisher(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FireExtinguisher>> {
    Ok(Json(db::get_extinguisher(&state.db, &id).await?))
}

async fn update_extinguisher(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SaveFireExtinguisher>,
) -> Result<Json<FireExtinguisher>> {
    Ok(Json(db::update_extinguisher(&state.db, &id, request).await?))
}

async fn delete_extinguisher(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    db::delete_extinguisher(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn record_inspection(
    State(state): State<AppState>,
    Json(request): Json<RecordInspection>,
) -> Result<impl IntoResponse> {
    let today = Local::now().date_naive();
    let extinguisher = db::record_inspection(&state.db, request, today).await?;
    Ok((StatusCode::CREATED, Json(extinguisher)))
}

async fn delete_inspection(
    State(state): State<AppState>,
    Path((id, inspection_id)): Path<(String, String)>,
) -> Result<Json<FireExtinguisher>> {
    Ok(Json(
        db::delete_inspection(&state.db, &id, &inspection_id).await?,
    ))
}
