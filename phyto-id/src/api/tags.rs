//! Tag canonicalization endpoint

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::tags::TagSet;
use crate::{ApiError, ApiResult, AppState};

/// Upper bound on tags per request
const MAX_TAGS_PER_REQUEST: usize = 500;

#[derive(Debug, Deserialize)]
pub struct CanonicalizeRequest {
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CanonicalizeResponse {
    pub tags: TagSet,
    pub vocabulary_version: String,
    /// Physiological category of each canonical tag; fallback tags are absent
    pub categories: BTreeMap<String, String>,
}

/// POST /api/tags/canonicalize
pub async fn canonicalize(
    State(state): State<AppState>,
    Json(request): Json<CanonicalizeRequest>,
) -> ApiResult<Json<CanonicalizeResponse>> {
    if request.tags.len() > MAX_TAGS_PER_REQUEST {
        return Err(ApiError::BadRequest(format!(
            "at most {} tags per request",
            MAX_TAGS_PER_REQUEST
        )));
    }

    let canonicalizer = &state.canonicalizer;
    let tags = canonicalizer.canonicalize(&request.tags);
    let vocabulary = canonicalizer.vocabulary();

    let categories = tags
        .iter()
        .filter_map(|tag| {
            vocabulary
                .category_of(tag)
                .map(|category| (tag.clone(), category.to_string()))
        })
        .collect();

    Ok(Json(CanonicalizeResponse {
        tags,
        vocabulary_version: vocabulary.version().to_string(),
        categories,
    }))
}

/// Build tag routes
pub fn tag_routes() -> Router<AppState> {
    Router::new().route("/api/tags/canonicalize", post(canonicalize))
}
