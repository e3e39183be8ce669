//! Identification endpoints
//!
//! - `POST /api/identify`: photo → provider → species resolution
//! - `POST /api/resolve`: caller-supplied identification result → species resolution

use axum::{extract::State, routing::post, Json, Router};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use tracing::info;

use crate::identification::{
    CaptureMetadata, IdentificationError, IdentificationRequest, IdentificationResult,
};
use crate::services::ResolvedIdentity;
use crate::{ApiError, ApiResult, AppState};

/// POST /api/identify request body
#[derive(Debug, Deserialize)]
pub struct IdentifyRequest {
    /// Photo bytes, base64 (a `data:image/...;base64,` prefix is accepted)
    pub image_base64: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub photo_ref: Option<String>,
}

/// POST /api/resolve request body
#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub result: IdentificationResult,
    #[serde(default)]
    pub metadata: CaptureMetadata,
}

/// POST /api/identify
pub async fn identify(
    State(state): State<AppState>,
    Json(request): Json<IdentifyRequest>,
) -> ApiResult<Json<ResolvedIdentity>> {
    let outcome = identify_and_resolve(&state, request).await;
    if let Err(e) = &outcome {
        state.record_error(e).await;
    }
    outcome.map(Json)
}

async fn identify_and_resolve(
    state: &AppState,
    request: IdentifyRequest,
) -> ApiResult<ResolvedIdentity> {
    let image = decode_image(&request.image_base64)?;
    let provider = state
        .identifier
        .as_ref()
        .ok_or(ApiError::Identification(IdentificationError::NotConfigured))?;

    let result = provider
        .identify(&IdentificationRequest {
            image,
            latitude: request.latitude,
            longitude: request.longitude,
        })
        .await?;
    info!(
        "Identification returned {} candidates",
        result.candidates.len()
    );

    let metadata = CaptureMetadata {
        latitude: request.latitude,
        longitude: request.longitude,
        address: request.address,
        photo_ref: request.photo_ref,
    };
    Ok(state.resolver.resolve(&result, &metadata).await?)
}

/// POST /api/resolve
pub async fn resolve(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> ApiResult<Json<ResolvedIdentity>> {
    let outcome = state
        .resolver
        .resolve(&request.result, &request.metadata)
        .await
        .map_err(ApiError::from);
    if let Err(e) = &outcome {
        state.record_error(e).await;
    }
    outcome.map(Json)
}

/// Decode the uploaded photo, tolerating a data-URL prefix
fn decode_image(encoded: &str) -> ApiResult<Vec<u8>> {
    let payload = match encoded.split_once("base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => encoded,
    };
    let image = BASE64
        .decode(payload.trim())
        .map_err(|e| ApiError::BadRequest(format!("image_base64 is not valid base64: {}", e)))?;
    if image.is_empty() {
        return Err(ApiError::BadRequest("image_base64 is empty".to_string()));
    }
    Ok(image)
}

/// Build identification routes
pub fn identify_routes() -> Router<AppState> {
    Router::new()
        .route("/api/identify", post(identify))
        .route("/api/resolve", post(resolve))
}
