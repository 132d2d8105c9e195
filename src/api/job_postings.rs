//! Careers page job posting endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::{
    db::{self, JobPosting, SaveJobPosting},
    error::Result,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_postings).post(create_posting))
        .route(
            "/:id",
            get(get_posting).put(update_posting).delete(delete_posting),
        )
}

#[derive(Debug, Deserialize, Default)]
pub struct ListPostingsQuery {
    pub status: Option<String>,
}

async fn list_postings(
    State(state): State<AppState>,
    Query(query): Query<ListPostingsQuery>,
) -> Result<Json<Vec<JobPosting>>> {
    let postings = db::list_job_postings(&state.db, query.status.as_deref()).await?;
    Ok(Json(postings))
}

async fn create_posting(
    State(state): State<AppState>,
    Json(request): Json<SaveJobPosting>,
) -> Result<impl IntoResponse> {
    let posting = db::create_job_posting(&state.db, request).await?;
    Ok((StatusCode::CREATED, Json(posting)))
}

async fn get_posting(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<JobPosting>> {
    Ok(Json(db::get_job_posting(&state.db, &id).await?))
}

async fn update_posting(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SaveJobPosting>,
) -> Result<Json<JobPosting>> {
    Ok(Json(db::update_job_posting(&state.db, &id, request).await?))
}

async fn delete_posting(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode> {
    db::delete_job_posting(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
