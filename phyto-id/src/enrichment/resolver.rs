//! Image Enrichment Resolver
//!
//! Two operations over the configured catalogs:
//!
//! - **Representative image**: sources are tried one after another and the first
//!   image wins. Total failure yields the placeholder, never an error.
//! - **Diverse images**: every source (plus framed photo searches) runs
//!   concurrently. All tasks are awaited, results are kept in issue order,
//!   deduplicated and capped.

use super::inaturalist::INaturalistSource;
use super::photo_search::{PhotoSearchSource, QueryFraming, DIVERSITY_FRAMINGS};
use super::wikipedia::WikipediaSource;
use super::{fetch_bounded, first_available, ImageQuery, ImageRef, ImageSource};
use crate::config::{EnrichmentSettings, MAX_DIVERSE_IMAGES};
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Anything able to pick a single image for a species
#[async_trait]
pub trait RepresentativeImage: Send + Sync {
    /// Always yields a displayable reference (placeholder at worst)
    async fn representative_image(&self, scientific_name: &str) -> ImageRef;
}

pub struct ImageEnrichmentResolver {
    /// Ordered fallback chain for the representative image
    representative: Vec<Arc<dyn ImageSource>>,
    /// Extra fan-out tasks for the diverse set (after the representative sources)
    diversity: Vec<Arc<dyn ImageSource>>,
    placeholder: ImageRef,
    task_timeout: Duration,
    max_images: usize,
}

impl ImageEnrichmentResolver {
    pub fn new(
        representative: Vec<Arc<dyn ImageSource>>,
        diversity: Vec<Arc<dyn ImageSource>>,
        placeholder: impl Into<ImageRef>,
    ) -> Self {
        Self {
            representative,
            diversity,
            placeholder: placeholder.into(),
            task_timeout: crate::config::DEFAULT_SOURCE_TIMEOUT,
            max_images: MAX_DIVERSE_IMAGES,
        }
    }

    pub fn with_task_timeout(mut self, task_timeout: Duration) -> Self {
        self.task_timeout = task_timeout;
        self
    }

    /// Build the production source chain: Wikipedia → iNaturalist → photo search,
    /// plus the framed photo searches for the diverse set.
    pub fn from_settings(settings: &EnrichmentSettings) -> phyto_common::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(phyto_common::config::get_user_agent())
            .connect_timeout(Duration::from_secs(5))
            .timeout(settings.source_timeout)
            .build()
            .map_err(|e| phyto_common::Error::HttpClient(e.to_string()))?;

        let representative: Vec<Arc<dyn ImageSource>> = vec![
            Arc::new(WikipediaSource::new(
                client.clone(),
                settings.wikipedia_rest_url.clone(),
                settings.wikipedia_action_url.clone(),
            )),
            Arc::new(INaturalistSource::new(
                client.clone(),
                settings.inaturalist_url.clone(),
            )),
            Arc::new(PhotoSearchSource::new(
                "PhotoSearch",
                client.clone(),
                settings.photo_search_url.clone(),
                QueryFraming::Identity,
            )),
        ];

        let diversity: Vec<Arc<dyn ImageSource>> = DIVERSITY_FRAMINGS
            .iter()
            .map(|&(name, suffix)| {
                Arc::new(PhotoSearchSource::new(
                    name,
                    client.clone(),
                    settings.photo_search_url.clone(),
                    QueryFraming::Framed(suffix),
                )) as Arc<dyn ImageSource>
            })
            .collect();

        let mut resolver = Self::new(
            representative,
            diversity,
            settings.placeholder_image_url.clone(),
        )
        .with_task_timeout(settings.source_timeout);
        resolver.max_images = settings.max_diverse_images;
        Ok(resolver)
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// First image from the ordered source chain, placeholder when all are exhausted
    pub async fn resolve_representative_image(&self, scientific_name: &str) -> ImageRef {
        let query = ImageQuery::new(scientific_name);
        if query.is_empty() {
            return self.placeholder.clone();
        }

        match first_available(&self.representative, &query, self.task_timeout).await {
            Some((source, url)) => {
                info!(
                    scientific_name = %query.scientific_name,
                    source,
                    "Representative image resolved"
                );
                url
            }
            None => {
                info!(
                    scientific_name = %query.scientific_name,
                    "No image source succeeded, using placeholder"
                );
                self.placeholder.clone()
            }
        }
    }

    /// Up to `max_images` distinct images gathered from every source at once
    ///
    /// Empty only when every task failed; no placeholder is substituted.
    pub async fn resolve_diverse_images(&self, scientific_name: &str) -> Vec<ImageRef> {
        let query = ImageQuery::new(scientific_name);
        if query.is_empty() {
            return Vec::new();
        }

        let tasks = self
            .representative
            .iter()
            .chain(self.diversity.iter())
            .map(|source| fetch_bounded(source.as_ref(), &query, self.task_timeout));

        // join_all keeps issue order regardless of completion order
        let settled = join_all(tasks).await;
        let attempted = settled.len();

        let mut seen = HashSet::new();
        let images: Vec<ImageRef> = settled
            .into_iter()
            .flatten()
            .filter(|url| seen.insert(url.clone()))
            .take(self.max_images)
            .collect();

        debug!(
            scientific_name = %query.scientific_name,
            attempted,
            collected = images.len(),
            "Diverse image fan-out settled"
        );
        images
    }
}

#[async_trait]
impl RepresentativeImage for ImageEnrichmentResolver {
    async fn representative_image(&self, scientific_name: &str) -> ImageRef {
        self.resolve_representative_image(scientific_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::mock::{Script, ScriptedSource};
    use super::*;

    const PLACEHOLDER: &str = "https://img.example/placeholder.png";

    fn sources(scripts: &[(&'static str, Script)]) -> Vec<Arc<dyn ImageSource>> {
        scripts
            .iter()
            .map(|(name, script)| ScriptedSource::new(*name, script.clone()) as Arc<dyn ImageSource>)
            .collect()
    }

    #[tokio::test]
    async fn test_placeholder_on_total_failure() {
        let resolver = ImageEnrichmentResolver::new(
            sources(&[("a", Script::Fail), ("b", Script::Empty), ("c", Script::Fail)]),
            Vec::new(),
            PLACEHOLDER,
        );
        assert_eq!(
            resolver.resolve_representative_image("Salvia officinalis").await,
            PLACEHOLDER
        );
    }

    #[tokio::test]
    async fn test_blank_name_yields_placeholder_without_queries() {
        let probe = ScriptedSource::new("a", Script::Image("https://img.example/a.jpg"));
        let resolver =
            ImageEnrichmentResolver::new(vec![probe.clone() as Arc<dyn ImageSource>], Vec::new(), PLACEHOLDER);

        assert_eq!(resolver.resolve_representative_image("  ").await, PLACEHOLDER);
        assert!(resolver.resolve_diverse_images("").await.is_empty());
        assert_eq!(probe.calls(), 0);
    }

    #[tokio::test]
    async fn test_representative_falls_through_to_later_source() {
        let resolver = ImageEnrichmentResolver::new(
            sources(&[
                ("a", Script::Empty),
                ("b", Script::Fail),
                ("c", Script::Image("https://img.example/c.jpg")),
            ]),
            Vec::new(),
            PLACEHOLDER,
        );
        assert_eq!(
            resolver.resolve_representative_image("Salvia officinalis").await,
            "https://img.example/c.jpg"
        );
    }

    #[tokio::test]
    async fn test_diverse_images_capped_and_distinct() {
        let resolver = ImageEnrichmentResolver::new(
            sources(&[
                ("a", Script::Image("https://img.example/1.jpg")),
                ("b", Script::Image("https://img.example/2.jpg")),
                ("c", Script::Image("https://img.example/1.jpg")),
            ]),
            sources(&[
                ("d", Script::Image("https://img.example/3.jpg")),
                ("e", Script::Image("https://img.example/4.jpg")),
                ("f", Script::Image("https://img.example/5.jpg")),
                ("g", Script::Image("https://img.example/6.jpg")),
                ("h", Script::Image("https://img.example/7.jpg")),
            ]),
            PLACEHOLDER,
        );

        let images = resolver.resolve_diverse_images("Salvia officinalis").await;
        assert_eq!(
            images,
            vec![
                "https://img.example/1.jpg",
                "https://img.example/2.jpg",
                "https://img.example/3.jpg",
                "https://img.example/4.jpg",
                "https://img.example/5.jpg",
                "https://img.example/6.jpg",
            ]
        );
    }

    #[tokio::test]
    async fn test_diverse_images_empty_without_placeholder() {
        let resolver = ImageEnrichmentResolver::new(
            sources(&[("a", Script::Fail), ("b", Script::Empty)]),
            sources(&[("c", Script::Fail)]),
            PLACEHOLDER,
        );
        assert!(resolver
            .resolve_diverse_images("Salvia officinalis")
            .await
            .is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_source_does_not_block_fan_out() {
        let resolver = ImageEnrichmentResolver::new(
            sources(&[
                ("slow", Script::Hang),
                ("b", Script::Image("https://img.example/b.jpg")),
            ]),
            sources(&[("c", Script::Image("https://img.example/c.jpg"))]),
            PLACEHOLDER,
        )
        .with_task_timeout(Duration::from_secs(5));

        let images = resolver.resolve_diverse_images("Salvia officinalis").await;
        assert_eq!(
            images,
            vec!["https://img.example/b.jpg", "https://img.example/c.jpg"]
        );
    }
}
