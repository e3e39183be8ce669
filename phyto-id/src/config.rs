//! Configuration resolution for phyto-id
//!
//! Provides ENV → TOML resolution for the identification API key and the
//! enrichment settings derived from the `[enrichment]` TOML section.

use crate::enrichment::{inaturalist, photo_search, wikipedia};
use crate::tags::TagVocabulary;
use phyto_common::config::{EnrichmentToml, TomlConfig};
use phyto_common::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5731;

/// Environment variable carrying the identification API key
pub const PLANT_ID_API_KEY_ENV: &str = "PHYTO_PLANT_ID_API_KEY";

/// Image shown when no catalog has a picture of the species
pub const DEFAULT_PLACEHOLDER_IMAGE_URL: &str =
    "https://upload.wikimedia.org/wikipedia/commons/thumb/6/65/No-Image-Placeholder.svg/800px-No-Image-Placeholder.svg.png";

/// Upper bound on the diverse image set
pub const MAX_DIVERSE_IMAGES: usize = 6;

/// Per-task bound for enrichment lookups
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(10);

/// Endpoints and limits for image enrichment
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentSettings {
    pub wikipedia_rest_url: String,
    pub wikipedia_action_url: String,
    pub inaturalist_url: String,
    pub photo_search_url: String,
    pub placeholder_image_url: String,
    pub source_timeout: Duration,
    pub max_diverse_images: usize,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            wikipedia_rest_url: wikipedia::DEFAULT_REST_URL.to_string(),
            wikipedia_action_url: wikipedia::DEFAULT_ACTION_URL.to_string(),
            inaturalist_url: inaturalist::DEFAULT_API_URL.to_string(),
            photo_search_url: photo_search::DEFAULT_SEARCH_URL.to_string(),
            placeholder_image_url: DEFAULT_PLACEHOLDER_IMAGE_URL.to_string(),
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
            max_diverse_images: MAX_DIVERSE_IMAGES,
        }
    }
}

impl EnrichmentSettings {
    /// Overlay the TOML `[enrichment]` section on the defaults
    pub fn from_toml(toml: &EnrichmentToml) -> Self {
        let defaults = Self::default();
        let pick = |value: &Option<String>, default: String| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .unwrap_or(default)
        };

        Self {
            wikipedia_rest_url: pick(&toml.wikipedia_rest_url, defaults.wikipedia_rest_url),
            wikipedia_action_url: pick(&toml.wikipedia_action_url, defaults.wikipedia_action_url),
            inaturalist_url: pick(&toml.inaturalist_url, defaults.inaturalist_url),
            photo_search_url: pick(&toml.photo_search_url, defaults.photo_search_url),
            placeholder_image_url: pick(&toml.placeholder_image_url, defaults.placeholder_image_url),
            source_timeout: toml
                .source_timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.source_timeout),
            max_diverse_images: defaults.max_diverse_images,
        }
    }
}

/// Resolve the identification API key
///
/// **Priority:** ENV → TOML
///
/// A missing key is not fatal at startup; `/api/identify` reports it per request.
pub fn resolve_plant_id_api_key(toml_config: &TomlConfig) -> Option<String> {
    let env_key = std::env::var(PLANT_ID_API_KEY_ENV)
        .ok()
        .filter(|k| is_valid_key(k));
    let toml_key = toml_config
        .plant_id_api_key
        .clone()
        .filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "Plant identification API key found in environment and TOML. Using environment (highest priority)."
        );
    }

    if let Some(key) = env_key {
        info!("Plant identification API key loaded from environment variable");
        return Some(key);
    }
    if let Some(key) = toml_key {
        info!("Plant identification API key loaded from TOML config");
        return Some(key);
    }

    warn!(
        "Plant identification API key not configured; /api/identify is disabled. Configure using one of:\n\
         1. Environment: {}=your-key-here\n\
         2. TOML config: plant_id_api_key = \"your-key\"",
        PLANT_ID_API_KEY_ENV
    );
    None
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Load the vocabulary override file, or the builtin vocabulary when none is configured
pub fn load_vocabulary(toml_config: &TomlConfig) -> Result<Arc<TagVocabulary>> {
    match &toml_config.vocabulary_file {
        Some(path) => Ok(Arc::new(TagVocabulary::from_file(path)?)),
        None => {
            let vocabulary = TagVocabulary::builtin();
            info!(
                "Using builtin tag vocabulary {} ({} tags)",
                vocabulary.version(),
                vocabulary.len()
            );
            Ok(vocabulary)
        }
    }
}
