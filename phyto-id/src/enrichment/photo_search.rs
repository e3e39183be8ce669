// Keyword photo search source (Openverse-compatible API)
//
// Each query variant is searched in priority order; the candidate image URL is
// accepted only after a HEAD probe confirms it exists. The probe's final URL
// (after redirects) is what gets stored.
//
// API Documentation: https://api.openverse.org/v1/

use super::{json_body, EnrichmentSourceError, ImageQuery, ImageRef, ImageSource};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::debug;

pub const DEFAULT_SEARCH_URL: &str = "https://api.openverse.org/v1/images/";

/// Keyword framings added to the diverse image fan-out
pub const DIVERSITY_FRAMINGS: &[(&str, &str)] = &[
    ("PhotoSearch:leaf", "leaf"),
    ("PhotoSearch:habitat", "habitat"),
    ("PhotoSearch:guide", "identification guide"),
];

/// How a source turns a scientific name into search keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryFraming {
    /// Name-derived variants, most specific first
    Identity,
    /// A single "<name> <suffix>" query
    Framed(&'static str),
}

impl QueryFraming {
    pub fn queries(&self, query: &ImageQuery) -> Vec<String> {
        match self {
            QueryFraming::Identity => identity_variants(query),
            QueryFraming::Framed(suffix) => {
                vec![format!("{} {}", query.scientific_name, suffix)]
            }
        }
    }
}

/// Query variants derived from the name and its genus/epithet, in priority order
pub fn identity_variants(query: &ImageQuery) -> Vec<String> {
    let mut variants = vec![format!("{} plant", query.scientific_name)];
    if let (Some(genus), Some(epithet)) = (&query.genus, &query.epithet) {
        variants.push(format!("{} {}", genus, epithet));
    }
    if let Some(genus) = &query.genus {
        variants.push(format!("{} plant", genus));
    }
    variants.push(query.scientific_name.clone());

    // "Genus epithet" equals the full name for plain binomials
    let mut seen = std::collections::HashSet::new();
    variants.retain(|v| seen.insert(v.clone()));
    variants
}

pub struct PhotoSearchSource {
    name: &'static str,
    client: Client,
    search_url: String,
    framing: QueryFraming,
}

impl PhotoSearchSource {
    pub fn new(
        name: &'static str,
        client: Client,
        search_url: impl Into<String>,
        framing: QueryFraming,
    ) -> Self {
        Self {
            name,
            client,
            search_url: search_url.into(),
            framing,
        }
    }

    /// Candidate image URL for one keyword query
    async fn search(&self, keywords: &str) -> Result<Option<String>, EnrichmentSourceError> {
        let url = Url::parse_with_params(
            &self.search_url,
            [("q", keywords), ("page_size", "1"), ("mature", "false")],
        )
        .map_err(|e| EnrichmentSourceError::Malformed(format!("search URL: {}", e)))?;

        debug!("Photo search query: '{}'", keywords);
        let response = self.client.get(url).send().await?;
        let body = json_body(response).await?;
        Ok(parse_first_result(&body))
    }

    /// HEAD the candidate; `Some(final_url)` when it exists
    async fn probe(&self, candidate: &str) -> Result<Option<String>, EnrichmentSourceError> {
        let response = self.client.head(candidate).send().await?;
        if response.status().is_success() {
            Ok(Some(response.url().to_string()))
        } else {
            debug!(
                "Photo candidate rejected ({}): {}",
                response.status(),
                candidate
            );
            Ok(None)
        }
    }
}

#[async_trait]
impl ImageSource for PhotoSearchSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn lookup(&self, query: &ImageQuery) -> Result<Option<ImageRef>, EnrichmentSourceError> {
        let mut last_error = None;

        for keywords in self.framing.queries(query) {
            let attempt = match self.search(&keywords).await {
                Ok(Some(candidate)) => self.probe(&candidate).await,
                other => other,
            };
            match attempt {
                Ok(Some(url)) => return Ok(Some(url)),
                Ok(None) => {}
                Err(e) => {
                    debug!("Photo search variant '{}' failed: {}", keywords, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }
}

/// `results[0].url`, falling back to `results[0].thumbnail`
pub fn parse_first_result(body: &Value) -> Option<String> {
    let first = body.get("results")?.as_array()?.first()?;
    ["url", "thumbnail"]
        .iter()
        .filter_map(|key| first.get(*key)?.as_str())
        .find(|s| !s.is_empty())
        .map(str::to_string)
}
