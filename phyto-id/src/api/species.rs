//! Species read and enrichment endpoints

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::db::{Observation, Species};
use crate::enrichment::ImageRef;
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct SpeciesResponse {
    pub species: Species,
    pub observation_count: i64,
}

#[derive(Debug, Serialize)]
pub struct ObservationsResponse {
    pub scientific_name: String,
    pub observations: Vec<Observation>,
}

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub scientific_name: String,
    pub image_url: ImageRef,
}

#[derive(Debug, Serialize)]
pub struct ImagesResponse {
    pub scientific_name: String,
    pub images: Vec<ImageRef>,
}

async fn stored_species(state: &AppState, scientific_name: &str) -> ApiResult<Species> {
    state
        .store
        .find_species_by_scientific_name(scientific_name)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("species '{}'", scientific_name)))
}

fn require_name(name: String) -> ApiResult<String> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::BadRequest("scientific name is empty".to_string()));
    }
    Ok(name)
}

/// GET /api/species/:name
pub async fn get_species(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<SpeciesResponse>> {
    let species = stored_species(&state, &require_name(name)?).await?;
    let observation_count = state.store.count_observations(species.id).await?;

    Ok(Json(SpeciesResponse {
        species,
        observation_count,
    }))
}

/// GET /api/species/:name/observations
pub async fn get_observations(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<ObservationsResponse>> {
    let species = stored_species(&state, &require_name(name)?).await?;
    let observations = state.store.list_observations(species.id).await?;

    Ok(Json(ObservationsResponse {
        scientific_name: species.scientific_name,
        observations,
    }))
}

/// GET /api/species/:name/image
///
/// Works for any name, stored or not; falls back to the placeholder.
pub async fn get_representative_image(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<ImageResponse>> {
    let scientific_name = require_name(name)?;
    let image_url = state
        .enrichment
        .resolve_representative_image(&scientific_name)
        .await;

    Ok(Json(ImageResponse {
        scientific_name,
        image_url,
    }))
}

/// GET /api/species/:name/images
pub async fn get_diverse_images(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<ImagesResponse>> {
    let scientific_name = require_name(name)?;
    let images = state.enrichment.resolve_diverse_images(&scientific_name).await;

    Ok(Json(ImagesResponse {
        scientific_name,
        images,
    }))
}

/// Build species routes
pub fn species_routes() -> Router<AppState> {
    Router::new()
        .route("/api/species/:name", get(get_species))
        .route("/api/species/:name/observations", get(get_observations))
        .route("/api/species/:name/image", get(get_representative_image))
        .route("/api/species/:name/images", get(get_diverse_images))
}
