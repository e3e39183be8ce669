//! Observation database operations

use super::StoreError;
use crate::identification::CaptureMetadata;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// One sighting of a species
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub id: Uuid,
    pub species_id: Uuid,
    pub observed_at: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub photo_ref: Option<String>,
}

impl Observation {
    /// New sighting at the current time, location passed through unchanged
    pub fn new(species_id: Uuid, metadata: &CaptureMetadata) -> Self {
        Self {
            id: Uuid::new_v4(),
            species_id,
            observed_at: Utc::now(),
            latitude: metadata.latitude,
            longitude: metadata.longitude,
            address: metadata.address.clone(),
            photo_ref: metadata.photo_ref.clone(),
        }
    }
}

pub async fn save_observation(
    pool: &SqlitePool,
    observation: &Observation,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO observations (id, species_id, observed_at, latitude, longitude, address, photo_ref)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(observation.id.to_string())
    .bind(observation.species_id.to_string())
    .bind(observation.observed_at.to_rfc3339_opts(SecondsFormat::Micros, true))
    .bind(observation.latitude)
    .bind(observation.longitude)
    .bind(&observation.address)
    .bind(&observation.photo_ref)
    .execute(pool)
    .await?;

    Ok(())
}

/// Observations of one species, newest first
pub async fn list_observations_for_species(
    pool: &SqlitePool,
    species_id: Uuid,
) -> Result<Vec<Observation>, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT id, species_id, observed_at, latitude, longitude, address, photo_ref
        FROM observations
        WHERE species_id = ?
        ORDER BY observed_at DESC
        "#,
    )
    .bind(species_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(observation_from_row).collect()
}

pub async fn count_observations_for_species(
    pool: &SqlitePool,
    species_id: Uuid,
) -> Result<i64, StoreError> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM observations WHERE species_id = ?")
        .bind(species_id.to_string())
        .fetch_one(pool)
        .await?;
    Ok(count)
}

fn observation_from_row(row: &SqliteRow) -> Result<Observation, StoreError> {
    let parse_id = |column: &str| -> Result<Uuid, StoreError> {
        let value: String = row.get(column);
        Uuid::parse_str(&value)
            .map_err(|e| StoreError::Corrupt(format!("observation {} '{}': {}", column, value, e)))
    };
    let observed_at: String = row.get("observed_at");

    Ok(Observation {
        id: parse_id("id")?,
        species_id: parse_id("species_id")?,
        observed_at: DateTime::parse_from_rfc3339(&observed_at)
            .map_err(|e| StoreError::Corrupt(format!("observed_at '{}': {}", observed_at, e)))?
            .with_timezone(&Utc),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
        address: row.get("address"),
        photo_ref: row.get("photo_ref"),
    })
}
