//! Control datapoint endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::{
    db::{self, ControlDatapoint, CreateControlDatapoint},
    error::Result,
    AppState,
};

use super::exports::DatapointQuery;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_datapoints).post(create_datapoint))
        .route("/:id", get(get_datapoint).delete(delete_datapoint))
}

async fn list_datapoints(
    State(state): State<AppState>,
    Query(query): Query<DatapointQuery>,
) -> Result<Json<Vec<ControlDatapoint>>> {
    Ok(Json(db::list_datapoints(&state.db, &query.into_filter()).await?))
}

async fn create_datapoint(
    State(state): State<AppState>,
    Json(request): Json<CreateControlDatapoint>,
) -> Result<impl IntoResponse> {
    let point = db::create_datapoint(&state.db, request).await?;
    Ok((StatusCode::CREATED, Json(point)))
}

async fn get_datapoint(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ControlDatapoint>> {
    Ok(Json(db::get_datapoint(&state.db, id).await?))
}

async fn delete_datapoint(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode> {
    db::delete_datapoint(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
