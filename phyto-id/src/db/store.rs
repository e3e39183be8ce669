//! Persistence boundary used by the species resolver and the read API

use super::observations::{self, Observation};
use super::species::{self, Species};
use async_trait::async_trait;
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored JSON column invalid: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Stored row invalid: {0}")]
    Corrupt(String),
}

/// Species and observation storage
#[async_trait]
pub trait SpeciesStore: Send + Sync {
    async fn find_species_by_scientific_name(
        &self,
        scientific_name: &str,
    ) -> Result<Option<Species>, StoreError>;

    /// Insert a new species; when the name already exists the stored row wins
    /// and is returned instead.
    async fn insert_species(&self, species: &Species) -> Result<Species, StoreError>;

    async fn insert_observation(&self, observation: &Observation) -> Result<(), StoreError>;

    async fn count_observations(&self, species_id: Uuid) -> Result<i64, StoreError>;

    /// Newest first
    async fn list_observations(&self, species_id: Uuid) -> Result<Vec<Observation>, StoreError>;
}

/// [`SpeciesStore`] backed by the service's SQLite database
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl SpeciesStore for SqliteStore {
    async fn find_species_by_scientific_name(
        &self,
        scientific_name: &str,
    ) -> Result<Option<Species>, StoreError> {
        species::load_species_by_scientific_name(&self.pool, scientific_name).await
    }

    async fn insert_species(&self, candidate: &Species) -> Result<Species, StoreError> {
        species::insert_species(&self.pool, candidate).await
    }

    async fn insert_observation(&self, observation: &Observation) -> Result<(), StoreError> {
        observations::save_observation(&self.pool, observation).await
    }

    async fn count_observations(&self, species_id: Uuid) -> Result<i64, StoreError> {
        observations::count_observations_for_species(&self.pool, species_id).await
    }

    async fn list_observations(&self, species_id: Uuid) -> Result<Vec<Observation>, StoreError> {
        observations::list_observations_for_species(&self.pool, species_id).await
    }
}
