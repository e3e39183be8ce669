//! `GET /health`
//!
//! `degraded` means the service answers but cannot identify photos itself:
//! no identification API key was configured, so only `/api/resolve` works.

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Ok,
    Degraded,
}

#[derive(Debug, Serialize)]
pub struct VocabularyInfo {
    pub version: String,
    pub tags: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: ServiceStatus,
    pub module: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub identification_configured: bool,
    pub vocabulary: VocabularyInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let identification_configured = state.identifier.is_some();
    let vocabulary = state.canonicalizer.vocabulary();

    Json(HealthResponse {
        status: if identification_configured {
            ServiceStatus::Ok
        } else {
            ServiceStatus::Degraded
        },
        module: "phyto-id",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: (Utc::now() - state.startup_time).num_seconds().max(0) as u64,
        identification_configured,
        vocabulary: VocabularyInfo {
            version: vocabulary.version().to_string(),
            tags: vocabulary.len(),
        },
        last_error: state.last_error.read().await.clone(),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
