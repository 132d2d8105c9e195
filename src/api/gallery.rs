//! Gallery album and image endpoints.
//!
//! Routes:
//! - GET/POST /api/gallery/albums
//! - GET/PUT/DELETE /api/gallery/albums/:id
//! - GET/POST /api/gallery/albums/:id/images
//! - DELETE /api/gallery/images/:image_id

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;

use crate::{
    db::{self, AddGalleryImage, GalleryAlbum, GalleryImage, SaveGalleryAlbum},
    error::Result,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/albums", get(list_albums).post(create_album))
        .route(
            "/albums/:id",
            get(get_album).put(update_album).delete(delete_album),
        )
        .route("/albums/:id/images", get(list_images).post(add_image))
        .route("/images/:image_id", delete(delete_image))
}

#[derive(Debug, Deserialize, Default)]
pub struct ListAlbumsQuery {
    pub category: Option<String>,
}

async fn list_albums(
    State(state): State<AppState>,
    Query(query): Query<ListAlbumsQuery>,
) -> Result<Json<Vec<GalleryAlbum>>> {
    Ok(Json(db::list_albums(&state.db, query.category.as_deref()).await?))
}

async fn create_album(
    State(state): State<AppState>,
    Json(request): Json<SaveGalleryAlbum>,
) -> Result<impl IntoResponse> {
    let album = db::create_album(&state.db, request).await?;
    Ok((StatusCode::CREATED, Json(album)))
}

async fn get_album(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<GalleryAlbum>> {
    Ok(Json(db::get_album(&state.db, &id).await?))
}

async fn update_album(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SaveGalleryAlbum>,
) -> Result<Json<GalleryAlbum>> {
    Ok(Json(db::update_album(&state.db, &id, request).await?))
}

async fn delete_album(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode> {
    db::delete_album(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_images(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<GalleryImage>>> {
    db::get_album(&state.db, &id).await?;
    Ok(Json(db::list_images(&state.db, &id).await?))
}

async fn add_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AddGalleryImage>,
) -> Result<impl IntoResponse> {
    let image = db::add_image(&state.db, &id, request).await?;
    Ok((StatusCode::CREATED, Json(image)))
}

async fn delete_image(
    State(state): State<AppState>,
    Path(image_id): Path<String>,
) -> Result<StatusCode> {
    db::delete_image(&state.db, &image_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
