// iNaturalist taxon photo source
//
// Fuzzy name search restricted to active, species-rank taxa; the best (first)
// taxon's default photo is used, medium rendition preferred over square crop.
//
// API Documentation: https://api.inaturalist.org/v1/docs/

use super::{
    json_body, per_second_limiter, DirectRateLimiter, EnrichmentSourceError, ImageQuery, ImageRef,
    ImageSource,
};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://api.inaturalist.org/v1";

#[derive(Debug, Deserialize)]
struct TaxaResponse {
    #[serde(default)]
    results: Vec<Taxon>,
}

#[derive(Debug, Deserialize)]
struct Taxon {
    id: u64,
    name: String,
    default_photo: Option<TaxonPhoto>,
}

#[derive(Debug, Deserialize)]
struct TaxonPhoto {
    medium_url: Option<String>,
    square_url: Option<String>,
}

pub struct INaturalistSource {
    client: Client,
    api_url: String,
    /// iNaturalist asks for at most ~1 request/second
    rate_limiter: DirectRateLimiter,
}

impl INaturalistSource {
    pub fn new(client: Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            rate_limiter: per_second_limiter(1),
        }
    }
}

#[async_trait]
impl ImageSource for INaturalistSource {
    fn name(&self) -> &'static str {
        "iNaturalist"
    }

    async fn lookup(&self, query: &ImageQuery) -> Result<Option<ImageRef>, EnrichmentSourceError> {
        let url = Url::parse_with_params(
            &format!("{}/taxa", self.api_url.trim_end_matches('/')),
            [
                ("q", query.scientific_name.as_str()),
                ("rank", "species"),
                ("is_active", "true"),
                ("per_page", "1"),
            ],
        )
        .map_err(|e| EnrichmentSourceError::Malformed(format!("taxa URL: {}", e)))?;

        self.rate_limiter.until_ready().await;
        debug!("Querying iNaturalist taxa: {}", query.scientific_name);

        let response = self.client.get(url).send().await?;
        let body = json_body(response).await?;
        parse_taxon_photo(body)
    }
}

/// Photo URL of the best taxon match
fn parse_taxon_photo(body: serde_json::Value) -> Result<Option<ImageRef>, EnrichmentSourceError> {
    let taxa: TaxaResponse = serde_json::from_value(body)
        .map_err(|e| EnrichmentSourceError::Malformed(e.to_string()))?;

    let Some(taxon) = taxa.results.into_iter().next() else {
        return Ok(None);
    };
    debug!("iNaturalist match: {} (taxon {})", taxon.name, taxon.id);

    Ok(taxon.default_photo.and_then(|photo| {
        photo
            .medium_url
            .filter(|u| !u.is_empty())
            .or(photo.square_url.filter(|u| !u.is_empty()))
    }))
}
