//! Image enrichment from external catalogs
//!
//! Every catalog is an [`ImageSource`]. A source reports failures through
//! [`ImageSource::lookup`], but callers go through [`ImageSource::fetch`],
//! which logs the failure and yields `None`, so no source error ever
//! escapes its own boundary.
//!
//! # Sources
//! 1. **wikipedia** - encyclopedia summary thumbnail, page-image fallback
//! 2. **inaturalist** - citizen-science taxon default photo
//! 3. **photo_search** - keyword photo search with existence probe
//!
//! [`resolver::ImageEnrichmentResolver`] combines them into the representative
//! image chain and the diverse image fan-out.

pub mod inaturalist;
pub mod photo_search;
pub mod resolver;
pub mod wikipedia;

pub use resolver::{ImageEnrichmentResolver, RepresentativeImage};

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Reference to a displayable image (absolute URL)
pub type ImageRef = String;

/// Failure of a single enrichment source
///
/// Always recovered locally by moving on to the next source.
#[derive(Debug, Error)]
pub enum EnrichmentSourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status: {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Scientific name plus the components query builders need
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageQuery {
    pub scientific_name: String,
    pub genus: Option<String>,
    pub epithet: Option<String>,
}

impl ImageQuery {
    /// Split a binomial (or trinomial) name into genus and specific epithet
    ///
    /// Hybrid markers (`×`, `x`) between genus and epithet are skipped.
    pub fn new(scientific_name: &str) -> Self {
        let scientific_name = scientific_name.split_whitespace().collect::<Vec<_>>().join(" ");
        let mut tokens = scientific_name
            .split(' ')
            .filter(|t| !t.is_empty() && *t != "×" && *t != "x");

        let genus = tokens.next().map(str::to_string);
        let epithet = tokens.next().map(str::to_string);

        Self {
            scientific_name,
            genus,
            epithet,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.scientific_name.is_empty()
    }
}

/// One external image catalog
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Source identifier for logs
    fn name(&self) -> &'static str;

    /// Query the catalog
    ///
    /// `Ok(None)` means the catalog answered but has no image.
    async fn lookup(&self, query: &ImageQuery) -> Result<Option<ImageRef>, EnrichmentSourceError>;

    /// Query the catalog, swallowing failures
    async fn fetch(&self, query: &ImageQuery) -> Option<ImageRef> {
        match self.lookup(query).await {
            Ok(Some(url)) if !url.trim().is_empty() => {
                debug!(
                    source = self.name(),
                    scientific_name = %query.scientific_name,
                    url = %url,
                    "Image source returned image"
                );
                Some(url)
            }
            Ok(_) => {
                debug!(
                    source = self.name(),
                    scientific_name = %query.scientific_name,
                    "Image source has no image"
                );
                None
            }
            Err(e) => {
                warn!(
                    source = self.name(),
                    scientific_name = %query.scientific_name,
                    error = %e,
                    "Image source failed (falling back)"
                );
                None
            }
        }
    }
}

/// Fetch from one source, giving up after `limit`
pub async fn fetch_bounded(
    source: &dyn ImageSource,
    query: &ImageQuery,
    limit: Duration,
) -> Option<ImageRef> {
    match tokio::time::timeout(limit, source.fetch(query)).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                source = source.name(),
                scientific_name = %query.scientific_name,
                error = %EnrichmentSourceError::Timeout(limit),
                "Image source failed (falling back)"
            );
            None
        }
    }
}

/// Walk an ordered source list; the first source yielding an image wins
pub async fn first_available(
    sources: &[Arc<dyn ImageSource>],
    query: &ImageQuery,
    limit: Duration,
) -> Option<(&'static str, ImageRef)> {
    for source in sources {
        if let Some(url) = fetch_bounded(source.as_ref(), query, limit).await {
            return Some((source.name(), url));
        }
    }
    None
}

/// Token-bucket limiter for one outbound API
pub(crate) type DirectRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

pub(crate) fn per_second_limiter(requests: u32) -> DirectRateLimiter {
    let quota = Quota::per_second(NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN));
    RateLimiter::direct(quota)
}

/// Fail on non-2xx, otherwise decode the JSON body
pub(crate) async fn json_body(
    response: reqwest::Response,
) -> Result<serde_json::Value, EnrichmentSourceError> {
    let status = response.status();
    if !status.is_success() {
        return Err(EnrichmentSourceError::Status(status));
    }
    response
        .json()
        .await
        .map_err(|e| EnrichmentSourceError::Malformed(e.to_string()))
}
