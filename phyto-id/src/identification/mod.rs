//! Plant identification provider boundary
//!
//! The provider turns a photo into ranked species candidates. The species
//! resolver only ever sees [`IdentificationResult`], so any provider (or a
//! test fake) can sit behind [`IdentificationProvider`].

pub mod plant_id;

pub use plant_id::PlantIdClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ranked candidates, best first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentificationResult {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl IdentificationResult {
    pub fn top_candidate(&self) -> Option<&Candidate> {
        self.candidates.first()
    }
}

/// One species suggestion from the provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub scientific_name: String,
    #[serde(default)]
    pub common_names: Option<Vec<String>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub citation: Option<String>,
    /// Provider-supplied reference image, preferred over catalog enrichment
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub similar_images: Vec<String>,
    #[serde(default)]
    pub probability: Option<f64>,
}

/// Context captured alongside the photo; passed through to the Observation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptureMetadata {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub photo_ref: Option<String>,
}

/// Photo submitted for identification
#[derive(Debug, Clone)]
pub struct IdentificationRequest {
    /// Encoded image bytes (JPEG/PNG)
    pub image: Vec<u8>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Error)]
pub enum IdentificationError {
    #[error("Identification request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Identification response malformed: {0}")]
    Malformed(String),

    #[error("Identification provider not configured")]
    NotConfigured,
}

/// External species identification service
#[async_trait]
pub trait IdentificationProvider: Send + Sync {
    async fn identify(
        &self,
        request: &IdentificationRequest,
    ) -> Result<IdentificationResult, IdentificationError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_deserializes_with_missing_fields() {
        let result: IdentificationResult = serde_json::from_value(json!({
            "candidates": [
                { "scientific_name": "Salvia officinalis", "probability": 0.93 },
                { "scientific_name": "Salvia lavandulifolia" }
            ]
        }))
        .unwrap();

        let top = result.top_candidate().unwrap();
        assert_eq!(top.scientific_name, "Salvia officinalis");
        assert_eq!(top.common_names, None);
        assert!(top.similar_images.is_empty());
    }

    #[test]
    fn test_empty_result_has_no_top_candidate() {
        let result: IdentificationResult = serde_json::from_value(json!({})).unwrap();
        assert!(result.top_candidate().is_none());
    }
}
