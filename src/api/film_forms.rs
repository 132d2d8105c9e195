//! Film inspection form endpoints.
//!
//! Routes:
//! - GET /api/film-inspection-forms?variant= - List forms
//! - POST /api/film-inspection-forms - Create a form
//! - GET/PUT/DELETE /api/film-inspection-forms/:form_id

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::{
    db::{self, FilmInspectionForm, SaveFilmInspectionForm},
    error::{Error, Result},
    services::exports::find_variant,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_forms).post(create_form))
        .route(
            "/:form_id",
            get(get_form).put(update_form).delete(delete_form),
        )
}

#[derive(Debug, Deserialize, Default)]
pub struct ListFormsQuery {
    pub variant: Option<String>,
}

/// Reject slugs that have no export template.
fn check_variant(input: &SaveFilmInspectionForm) -> Result<()> {
    match find_variant(&input.variant) {
        Some(_) => Ok(()),
        None => Err(Error::Validation(format!(
            "Unknown film inspection variant: {}",
            input.variant
        ))),
    }
}

async fn list_forms(
    State(state): State<AppState>,
    Query(query): Query<ListFormsQuery>,
) -> Result<Json<Vec<FilmInspectionForm>>> {
    let forms = db::list_film_forms(&state.db, query.variant.as_deref()).await?;
    Ok(Json(forms))
}

async fn create_form(
    State(state): State<AppState>,
    Json(request): Json<SaveFilmInspectionForm>,
) -> Result<impl IntoResponse> {
    check_variant(&request)?;
    let form = db::create_film_form(&state.db, request).await?;
    tracing::info!(form_id = %form.form_id, variant = %form.variant, "Film inspection form created");
    Ok((StatusCode::CREATED, Json(form)))
}

async fn get_form(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
) -> Result<Json<FilmInspectionForm>> {
    Ok(Json(db::get_film_form(&state.db, &form_id).await?))
}

async fn update_form(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
    Json(request): Json<SaveFilmInspectionForm>,
) -> Result<Json<FilmInspectionForm>> {
    check_variant(&request)?;
    Ok(Json(db::update_film_form(&state.db, &form_id, request).await?))
}

async fn delete_form(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
) -> Result<StatusCode> {
    db::delete_film_form(&state.db, &form_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
