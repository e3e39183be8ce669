//! Species database operations

use super::StoreError;
use crate::tags::TagSet;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// One distinct species, keyed by scientific name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Species {
    pub id: Uuid,
    pub scientific_name: String,
    /// Order as supplied by the identification provider
    pub common_names: Vec<String>,
    pub tags: TagSet,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Species {
    pub fn new(
        scientific_name: String,
        common_names: Vec<String>,
        tags: TagSet,
        image_url: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            scientific_name,
            common_names,
            tags,
            image_url,
            created_at: Utc::now(),
        }
    }
}

/// Insert unless the scientific name is already taken
///
/// Returns the row that owns the name afterwards, which is the existing one
/// when another writer got there first.
pub async fn insert_species(pool: &SqlitePool, species: &Species) -> Result<Species, StoreError> {
    let result = sqlx::query(
        r#"
        INSERT INTO species (id, scientific_name, common_names, tags, image_url, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(scientific_name) DO NOTHING
        "#,
    )
    .bind(species.id.to_string())
    .bind(&species.scientific_name)
    .bind(serde_json::to_string(&species.common_names)?)
    .bind(serde_json::to_string(&species.tags)?)
    .bind(&species.image_url)
    .bind(species.created_at.to_rfc3339_opts(SecondsFormat::Micros, true))
    .execute(pool)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(species.clone());
    }

    tracing::debug!(
        "Species {} already present, keeping existing row",
        species.scientific_name
    );
    load_species_by_scientific_name(pool, &species.scientific_name)
        .await?
        .ok_or_else(|| {
            StoreError::Corrupt(format!(
                "species '{}' conflicted but is not present",
                species.scientific_name
            ))
        })
}

/// Load species by exact (case-sensitive) scientific name
pub async fn load_species_by_scientific_name(
    pool: &SqlitePool,
    scientific_name: &str,
) -> Result<Option<Species>, StoreError> {
    let row = sqlx::query(
        r#"
        SELECT id, scientific_name, common_names, tags, image_url, created_at
        FROM species
        WHERE scientific_name = ?
        "#,
    )
    .bind(scientific_name)
    .fetch_optional(pool)
    .await?;

    row.map(|row| species_from_row(&row)).transpose()
}

fn species_from_row(row: &SqliteRow) -> Result<Species, StoreError> {
    let id_str: String = row.get("id");
    let common_names: String = row.get("common_names");
    let tags: String = row.get("tags");
    let created_at: String = row.get("created_at");

    Ok(Species {
        id: Uuid::parse_str(&id_str)
            .map_err(|e| StoreError::Corrupt(format!("species id '{}': {}", id_str, e)))?,
        scientific_name: row.get("scientific_name"),
        common_names: serde_json::from_str(&common_names)?,
        tags: serde_json::from_str(&tags)?,
        image_url: row.get("image_url"),
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| StoreError::Corrupt(format!("created_at '{}': {}", created_at, e)))?
            .with_timezone(&Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;

    fn sage() -> Species {
        Species::new(
            "Salvia officinalis".to_string(),
            vec!["Sage".to_string(), "Common sage".to_string()],
            ["antiseptic", "anti-inflammatory"].iter().map(|t| t.to_string()).collect(),
            Some("https://img.example/sage.jpg".to_string()),
        )
    }

    #[tokio::test]
    async fn test_insert_and_load_species() {
        let pool = memory_pool().await;
        let species = sage();

        let stored = insert_species(&pool, &species).await.unwrap();
        assert_eq!(stored.id, species.id);

        let loaded = load_species_by_scientific_name(&pool, "Salvia officinalis")
            .await
            .unwrap()
            .expect("Species not found");
        assert_eq!(loaded.id, species.id);
        assert_eq!(loaded.common_names, vec!["Sage", "Common sage"]);
        assert_eq!(loaded.tags, species.tags);
        assert_eq!(loaded.image_url.as_deref(), Some("https://img.example/sage.jpg"));
    }

    #[tokio::test]
    async fn test_insert_conflict_returns_existing_row() {
        let pool = memory_pool().await;
        let first = insert_species(&pool, &sage()).await.unwrap();

        let rival = Species::new(
            "Salvia officinalis".to_string(),
            Vec::new(),
            TagSet::new(),
            None,
        );
        let stored = insert_species(&pool, &rival).await.unwrap();

        assert_eq!(stored.id, first.id);
        assert_eq!(stored.common_names, first.common_names);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM species")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_lookup_is_case_sensitive() {
        let pool = memory_pool().await;
        insert_species(&pool, &sage()).await.unwrap();

        let other_case = load_species_by_scientific_name(&pool, "salvia officinalis")
            .await
            .unwrap();
        assert!(other_case.is_none());
    }
}
