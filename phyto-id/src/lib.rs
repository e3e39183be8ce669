//! phyto-id library interface
//!
//! Photo → species identity → canonical property tags and imagery, with every
//! repeat sighting accumulated under one species record.

pub mod api;
pub mod config;
pub mod db;
pub mod enrichment;
pub mod error;
pub mod identification;
pub mod services;
pub mod tags;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use enrichment::ImageEnrichmentResolver;
use identification::IdentificationProvider;
use services::SpeciesResolver;
use std::sync::Arc;
use tags::TagCanonicalizer;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn db::SpeciesStore>,
    pub canonicalizer: Arc<TagCanonicalizer>,
    pub enrichment: Arc<ImageEnrichmentResolver>,
    pub resolver: Arc<SpeciesResolver>,
    /// Absent when no API key is configured
    pub identifier: Option<Arc<dyn IdentificationProvider>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn db::SpeciesStore>,
        canonicalizer: Arc<TagCanonicalizer>,
        enrichment: Arc<ImageEnrichmentResolver>,
        identifier: Option<Arc<dyn IdentificationProvider>>,
    ) -> Self {
        let resolver = Arc::new(SpeciesResolver::new(
            Arc::clone(&store),
            Arc::clone(&canonicalizer),
            enrichment.clone(),
        ));

        Self {
            store,
            canonicalizer,
            enrichment,
            resolver,
            identifier,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Remember a server-side failure for `/health`; client errors are not service faults
    pub async fn record_error(&self, error: &ApiError) {
        if error.status_code().is_server_error() {
            *self.last_error.write().await = Some(error.to_string());
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::identify_routes())
        .merge(api::species_routes())
        .merge(api::tag_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
