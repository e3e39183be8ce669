//! Shared fixtures for phyto-id integration tests
//!
//! In-memory SQLite store, scripted image sources and a scripted
//! identification provider.

#![allow(dead_code)]

use async_trait::async_trait;
use phyto_id::db::{init_tables, SqliteStore};
use phyto_id::enrichment::{EnrichmentSourceError, ImageEnrichmentResolver, ImageQuery, ImageRef, ImageSource};
use phyto_id::identification::{
    Candidate, IdentificationError, IdentificationProvider, IdentificationRequest,
    IdentificationResult,
};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const PLACEHOLDER: &str = "https://img.example/placeholder.png";

/// Single-connection in-memory database with the service schema
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    init_tables(&pool).await.expect("Failed to create tables");
    pool
}

pub async fn memory_store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::new(memory_pool().await))
}

pub async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Image source answering every query the same way
pub struct FixedSource {
    pub name: &'static str,
    pub answer: Option<&'static str>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl FixedSource {
    pub fn image(name: &'static str, url: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            answer: Some(url),
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn empty(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            answer: None,
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            answer: None,
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageSource for FixedSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn lookup(&self, _query: &ImageQuery) -> Result<Option<ImageRef>, EnrichmentSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(EnrichmentSourceError::Malformed("scripted failure".to_string()));
        }
        Ok(self.answer.map(str::to_string))
    }
}

pub fn as_sources(sources: &[Arc<FixedSource>]) -> Vec<Arc<dyn ImageSource>> {
    sources
        .iter()
        .map(|s| Arc::clone(s) as Arc<dyn ImageSource>)
        .collect()
}

/// Resolver whose representative chain always ends at the placeholder
pub fn offline_enrichment() -> Arc<ImageEnrichmentResolver> {
    Arc::new(ImageEnrichmentResolver::new(
        as_sources(&[FixedSource::failing("offline")]),
        Vec::new(),
        PLACEHOLDER,
    ))
}

/// Identification provider returning a fixed result
pub struct ScriptedProvider {
    pub result: Option<IdentificationResult>,
    pub calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn returning(result: IdentificationResult) -> Arc<Self> {
        Arc::new(Self {
            result: Some(result),
            calls: AtomicUsize::new(0),
        })
    }

    /// Provider that fails like an unreachable service
    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            result: None,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl IdentificationProvider for ScriptedProvider {
    async fn identify(
        &self,
        _request: &IdentificationRequest,
    ) -> Result<IdentificationResult, IdentificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result
            .clone()
            .ok_or_else(|| IdentificationError::Malformed("connection reset".to_string()))
    }
}

pub fn sage_result() -> IdentificationResult {
    IdentificationResult {
        candidates: vec![
            Candidate {
                scientific_name: "Salvia officinalis".to_string(),
                common_names: Some(vec!["Sage".to_string(), "Common sage".to_string()]),
                description: Some(
                    "Sage is used as an anti-inflammatory and anti bacterial gargle.".to_string(),
                ),
                citation: Some("https://en.wikipedia.org/wiki/Salvia_officinalis".to_string()),
                probability: Some(0.93),
                ..Default::default()
            },
            Candidate {
                scientific_name: "Salvia fruticosa".to_string(),
                probability: Some(0.03),
                ..Default::default()
            },
        ],
    }
}
