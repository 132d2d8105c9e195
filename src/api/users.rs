//! User directory endpoints.
//!
//! Users are referenced by quality alerts for the reporter name and
//! department.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::{
    db::{self, CreateUser, User},
    error::Result,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user))
}

async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>> {
    Ok(Json(db::list_users(&state.db).await?))
}

async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUser>,
) -> Result<impl IntoResponse> {
    let user = db::create_user(&state.db, request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<User>> {
    Ok(Json(db::get_user(&state.db, &id).await?))
}
