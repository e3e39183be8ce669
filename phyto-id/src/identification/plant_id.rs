// Plant.id identification client (v3 API)
//
// POST <base>/identification with base64 images; suggestions are read from
// result.classification.suggestions, best first.
//
// API Documentation: https://plant.id/docs

use super::{
    Candidate, IdentificationError, IdentificationProvider, IdentificationRequest,
    IdentificationResult,
};
use crate::enrichment::{per_second_limiter, DirectRateLimiter};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_API_URL: &str = "https://plant.id/api/v3";

/// Details requested for each suggestion
const SUGGESTION_DETAILS: &str = "common_names,description,image";

/// Identification is slow (model inference plus similar-image search)
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct PlantIdResponse {
    result: Option<PlantIdResult>,
}

#[derive(Debug, Deserialize)]
struct PlantIdResult {
    classification: Option<Classification>,
}

#[derive(Debug, Deserialize)]
struct Classification {
    #[serde(default)]
    suggestions: Vec<Suggestion>,
}

#[derive(Debug, Deserialize)]
struct Suggestion {
    name: String,
    probability: Option<f64>,
    details: Option<SuggestionDetails>,
    #[serde(default)]
    similar_images: Vec<SimilarImage>,
}

#[derive(Debug, Deserialize)]
struct SuggestionDetails {
    common_names: Option<Vec<String>>,
    description: Option<Description>,
    image: Option<DetailImage>,
}

#[derive(Debug, Deserialize)]
struct Description {
    value: Option<String>,
    citation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailImage {
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SimilarImage {
    url: String,
}

pub struct PlantIdClient {
    http_client: Client,
    api_url: String,
    api_key: String,
    rate_limiter: DirectRateLimiter,
}

impl PlantIdClient {
    pub fn new(api_key: String, api_url: impl Into<String>) -> Result<Self, IdentificationError> {
        let http_client = Client::builder()
            .user_agent(phyto_common::config::get_user_agent())
            .connect_timeout(Duration::from_secs(5))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http_client,
            api_url: api_url.into(),
            api_key,
            rate_limiter: per_second_limiter(5),
        })
    }
}

#[async_trait]
impl IdentificationProvider for PlantIdClient {
    async fn identify(
        &self,
        request: &IdentificationRequest,
    ) -> Result<IdentificationResult, IdentificationError> {
        let url = Url::parse_with_params(
            &format!("{}/identification", self.api_url.trim_end_matches('/')),
            [("details", SUGGESTION_DETAILS)],
        )
        .map_err(|e| IdentificationError::Malformed(format!("identification URL: {}", e)))?;

        let mut body = json!({
            "images": [BASE64.encode(&request.image)],
            "similar_images": true,
        });
        if let (Some(lat), Some(lon)) = (request.latitude, request.longitude) {
            body["latitude"] = json!(lat);
            body["longitude"] = json!(lon);
        }

        self.rate_limiter.until_ready().await;
        debug!("Submitting {} byte image for identification", request.image.len());

        let response = self
            .http_client
            .post(url)
            .header("Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Identification provider returned {}; treating as no match", status);
            return Ok(IdentificationResult::default());
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| IdentificationError::Malformed(e.to_string()))?;
        parse_identification(payload)
    }
}

/// Map the provider payload onto ranked candidates
fn parse_identification(
    payload: serde_json::Value,
) -> Result<IdentificationResult, IdentificationError> {
    let response: PlantIdResponse = serde_json::from_value(payload)
        .map_err(|e| IdentificationError::Malformed(e.to_string()))?;

    let suggestions = response
        .result
        .and_then(|r| r.classification)
        .map(|c| c.suggestions)
        .unwrap_or_default();

    let candidates = suggestions
        .into_iter()
        .map(|s| {
            let details = s.details;
            let description = details.as_ref().and_then(|d| d.description.as_ref());
            Candidate {
                scientific_name: s.name,
                common_names: details.as_ref().and_then(|d| d.common_names.clone()),
                description: description.and_then(|d| d.value.clone()),
                citation: description.and_then(|d| d.citation.clone()),
                image_url: details
                    .as_ref()
                    .and_then(|d| d.image.as_ref())
                    .and_then(|i| i.value.clone()),
                similar_images: s.similar_images.into_iter().map(|i| i.url).collect(),
                probability: s.probability,
            }
        })
        .collect::<Vec<_>>();

    debug!("Identification returned {} candidates", candidates.len());
    Ok(IdentificationResult { candidates })
}
