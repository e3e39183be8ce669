//! Species Identity Resolver
//!
//! Turns an identification result into a stored species identity:
//!
//! 1. Take the top-ranked candidate (none → [`ResolveError::NoMatch`], nothing written)
//! 2. Derive canonical tags from the candidate description
//! 3. Find the species by exact scientific name, creating it on first sighting
//!    (image: provider-supplied, else representative image resolution)
//! 4. Append an observation for this sighting
//!
//! The species write and the observation write are separate statements, not one
//! transaction. A failed observation insert leaves a species with no sightings.

use crate::db::{Observation, Species, SpeciesStore, StoreError};
use crate::enrichment::RepresentativeImage;
use crate::identification::{CaptureMetadata, IdentificationResult};
use crate::tags::{extract_property_mentions, TagCanonicalizer, TagSet};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// No usable candidate; the user should retake the photo
    #[error("No plant match found")]
    NoMatch,

    #[error("Persistence failed: {0}")]
    Persistence(#[from] StoreError),
}

/// Outcome of a successful resolution
///
/// For a species seen before, names and tags are the stored ones, not the
/// ones carried by this identification result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedIdentity {
    pub species_id: Uuid,
    pub scientific_name: String,
    pub common_names: Vec<String>,
    pub tags: TagSet,
    pub image_url: Option<String>,
    pub observation_id: Uuid,
    pub is_new_species: bool,
}

pub struct SpeciesResolver {
    store: Arc<dyn SpeciesStore>,
    canonicalizer: Arc<TagCanonicalizer>,
    images: Arc<dyn RepresentativeImage>,
}

impl SpeciesResolver {
    pub fn new(
        store: Arc<dyn SpeciesStore>,
        canonicalizer: Arc<TagCanonicalizer>,
        images: Arc<dyn RepresentativeImage>,
    ) -> Self {
        Self {
            store,
            canonicalizer,
            images,
        }
    }

    pub async fn resolve(
        &self,
        result: &IdentificationResult,
        metadata: &CaptureMetadata,
    ) -> Result<ResolvedIdentity, ResolveError> {
        let candidate = result
            .top_candidate()
            .filter(|c| !c.scientific_name.trim().is_empty())
            .ok_or(ResolveError::NoMatch)?;
        let scientific_name = candidate.scientific_name.trim();

        let (species, is_new_species) =
            match self.store.find_species_by_scientific_name(scientific_name).await? {
                Some(existing) => {
                    debug!("Reusing species {} ({})", existing.scientific_name, existing.id);
                    (existing, false)
                }
                None => {
                    let raw_tags = candidate
                        .description
                        .as_deref()
                        .map(extract_property_mentions)
                        .unwrap_or_default();
                    let tags = self.canonicalizer.canonicalize(&raw_tags);

                    let image_url = match candidate
                        .image_url
                        .as_deref()
                        .map(str::trim)
                        .filter(|u| !u.is_empty())
                    {
                        Some(url) => url.to_string(),
                        None => self.images.representative_image(scientific_name).await,
                    };

                    let fresh = Species::new(
                        scientific_name.to_string(),
                        candidate.common_names.clone().unwrap_or_default(),
                        tags,
                        Some(image_url),
                    );
                    let stored = self.store.insert_species(&fresh).await?;
                    let created = stored.id == fresh.id;
                    if created {
                        info!(
                            species_id = %stored.id,
                            tags = stored.tags.len(),
                            "Created species {}",
                            stored.scientific_name
                        );
                    } else {
                        debug!(
                            "Species {} was created concurrently, using stored row",
                            stored.scientific_name
                        );
                    }
                    (stored, created)
                }
            };

        let observation = Observation::new(species.id, metadata);
        self.store.insert_observation(&observation).await?;
        info!(
            species_id = %species.id,
            observation_id = %observation.id,
            "Recorded observation of {}",
            species.scientific_name
        );

        Ok(ResolvedIdentity {
            species_id: species.id,
            scientific_name: species.scientific_name,
            common_names: species.common_names,
            tags: species.tags,
            image_url: species.image_url,
            observation_id: observation.id,
            is_new_species,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::ImageRef;
    use crate::identification::Candidate;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        species: Mutex<Vec<Species>>,
        observations: Mutex<Vec<Observation>>,
        fail_observations: bool,
    }

    impl MemoryStore {
        fn species_count(&self) -> usize {
            self.species.lock().unwrap().len()
        }

        fn observation_count(&self) -> usize {
            self.observations.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl SpeciesStore for MemoryStore {
        async fn find_species_by_scientific_name(
            &self,
            scientific_name: &str,
        ) -> Result<Option<Species>, StoreError> {
            Ok(self
                .species
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.scientific_name == scientific_name)
                .cloned())
        }

        async fn insert_species(&self, candidate: &Species) -> Result<Species, StoreError> {
            let mut species = self.species.lock().unwrap();
            if let Some(existing) = species
                .iter()
                .find(|s| s.scientific_name == candidate.scientific_name)
            {
                return Ok(existing.clone());
            }
            species.push(candidate.clone());
            Ok(candidate.clone())
        }

        async fn insert_observation(&self, observation: &Observation) -> Result<(), StoreError> {
            if self.fail_observations {
                return Err(StoreError::Corrupt("disk full".to_string()));
            }
            self.observations.lock().unwrap().push(observation.clone());
            Ok(())
        }

        async fn count_observations(&self, species_id: Uuid) -> Result<i64, StoreError> {
            Ok(self
                .observations
                .lock()
                .unwrap()
                .iter()
                .filter(|o| o.species_id == species_id)
                .count() as i64)
        }

        async fn list_observations(
            &self,
            species_id: Uuid,
        ) -> Result<Vec<Observation>, StoreError> {
            Ok(self
                .observations
                .lock()
                .unwrap()
                .iter()
                .filter(|o| o.species_id == species_id)
                .cloned()
                .collect())
        }
    }

    #[derive(Default)]
    struct CountingImages {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RepresentativeImage for CountingImages {
        async fn representative_image(&self, _scientific_name: &str) -> ImageRef {
            self.calls.fetch_add(1, Ordering::SeqCst);
            "https://img.example/resolved.jpg".to_string()
        }
    }

    fn resolver(store: Arc<MemoryStore>, images: Arc<CountingImages>) -> SpeciesResolver {
        SpeciesResolver::new(store, Arc::new(TagCanonicalizer::default()), images)
    }

    fn identification(name: &str, description: Option<&str>) -> IdentificationResult {
        IdentificationResult {
            candidates: vec![Candidate {
                scientific_name: name.to_string(),
                common_names: Some(vec!["Sage".to_string()]),
                description: description.map(str::to_string),
                ..Default::default()
            }],
        }
    }

    #[tokio::test]
    async fn test_creates_species_with_canonical_tags() {
        let store = Arc::new(MemoryStore::default());
        let images = Arc::new(CountingImages::default());
        let resolver = resolver(store.clone(), images.clone());

        let resolved = resolver
            .resolve(
                &identification(
                    "Salvia officinalis",
                    Some("Used as an anti-inflammatory and anti bacterial gargle."),
                ),
                &CaptureMetadata::default(),
            )
            .await
            .unwrap();

        assert!(resolved.is_new_species);
        assert_eq!(resolved.common_names, vec!["Sage"]);
        assert!(resolved.tags.contains("anti-inflammatory"));
        assert!(resolved.tags.contains("antibacterial"));
        assert_eq!(resolved.image_url.as_deref(), Some("https://img.example/resolved.jpg"));
        assert_eq!(images.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.species_count(), 1);
        assert_eq!(store.observation_count(), 1);
    }

    #[tokio::test]
    async fn test_candidate_image_skips_enrichment() {
        let store = Arc::new(MemoryStore::default());
        let images = Arc::new(CountingImages::default());
        let resolver = resolver(store, images.clone());

        let mut result = identification("Salvia officinalis", None);
        result.candidates[0].image_url = Some("https://plant.id/media/sage.jpg".to_string());

        let resolved = resolver
            .resolve(&result, &CaptureMetadata::default())
            .await
            .unwrap();
        assert_eq!(resolved.image_url.as_deref(), Some("https://plant.id/media/sage.jpg"));
        assert!(resolved.tags.is_empty());
        assert_eq!(images.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_repeat_sighting_reuses_stored_species() {
        let store = Arc::new(MemoryStore::default());
        let images = Arc::new(CountingImages::default());
        let resolver = resolver(store.clone(), images.clone());

        let first = resolver
            .resolve(
                &identification("Salvia officinalis", Some("An anti-inflammatory herb.")),
                &CaptureMetadata::default(),
            )
            .await
            .unwrap();

        let mut later = identification("Salvia officinalis", Some("Strongly anti-fungal."));
        later.candidates[0].common_names = Some(vec!["Garden sage".to_string()]);
        let second = resolver
            .resolve(
                &later,
                &CaptureMetadata {
                    address: Some("Kew Gardens".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(!second.is_new_species);
        assert_eq!(second.species_id, first.species_id);
        assert_eq!(second.tags, first.tags, "stored tags are returned");
        assert_eq!(second.common_names, vec!["Sage"]);
        assert_ne!(second.observation_id, first.observation_id);
        assert_eq!(store.species_count(), 1);
        assert_eq!(store.observation_count(), 2);
        assert_eq!(images.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_candidates_is_no_match_without_writes() {
        let store = Arc::new(MemoryStore::default());
        let resolver = resolver(store.clone(), Arc::new(CountingImages::default()));

        let err = resolver
            .resolve(&IdentificationResult::default(), &CaptureMetadata::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NoMatch));
        assert_eq!(err.to_string(), "No plant match found");

        let blank = resolver
            .resolve(&identification("   ", None), &CaptureMetadata::default())
            .await
            .unwrap_err();
        assert!(matches!(blank, ResolveError::NoMatch));

        assert_eq!(store.species_count(), 0);
        assert_eq!(store.observation_count(), 0);
    }

    #[tokio::test]
    async fn test_observation_failure_propagates() {
        let store = Arc::new(MemoryStore {
            fail_observations: true,
            ..Default::default()
        });
        let resolver = resolver(store.clone(), Arc::new(CountingImages::default()));

        let err = resolver
            .resolve(
                &identification("Salvia officinalis", None),
                &CaptureMetadata::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Persistence(_)));
        // Not atomic: the species row stays behind
        assert_eq!(store.species_count(), 1);
    }
}
