//! Database access for phyto-id
//!
//! SQLite holds one row per distinct species and one row per sighting.

pub mod observations;
pub mod species;
pub mod store;

pub use observations::Observation;
pub use species::Species;
pub use store::{SpeciesStore, SqliteStore, StoreError};

use phyto_common::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
///
/// Creates the database file (and parent directory) on first start.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc: read, write, create
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the species and observations tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    // Scientific name is the identity key; the UNIQUE constraint is what keeps
    // concurrent first sightings from creating two rows.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS species (
            id TEXT PRIMARY KEY,
            scientific_name TEXT NOT NULL UNIQUE,
            common_names TEXT NOT NULL DEFAULT '[]',
            tags TEXT NOT NULL DEFAULT '[]',
            image_url TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS observations (
            id TEXT PRIMARY KEY,
            species_id TEXT NOT NULL REFERENCES species(id) ON DELETE CASCADE,
            observed_at TEXT NOT NULL,
            latitude REAL,
            longitude REAL,
            address TEXT,
            photo_ref TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_observations_species ON observations(species_id, observed_at)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (species, observations)");

    Ok(())
}

#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    // One connection: every "sqlite::memory:" connection is its own database
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    init_tables(&pool).await.expect("Failed to create tables");
    pool
}
