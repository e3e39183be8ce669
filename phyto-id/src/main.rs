//! phyto-id - Plant Identification Microservice
//!
//! **Module Identity:**
//! - Name: phyto-id (Species Identity)
//! - Port: 5731 (default)
//!
//! Resolves plant photos to species identities, enriches them with canonical
//! property tags and catalog imagery, and records every sighting.

use anyhow::{Context, Result};
use clap::Parser;
use phyto_common::config::{
    ensure_root_folder, load_toml_config, resolve_config_path, resolve_root_folder, LoggingConfig,
};
use phyto_id::config::{load_vocabulary, resolve_plant_id_api_key, EnrichmentSettings, DEFAULT_PORT};
use phyto_id::db::{init_database_pool, SqliteStore};
use phyto_id::enrichment::ImageEnrichmentResolver;
use phyto_id::identification::{plant_id, IdentificationProvider, PlantIdClient};
use phyto_id::tags::TagCanonicalizer;
use phyto_id::{build_router, AppState};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "phyto-id", version, about = "Plant species identification service")]
struct Args {
    /// Root folder holding phyto.db (overrides PHYTO_ROOT_FOLDER and TOML)
    #[arg(long)]
    root_folder: Option<PathBuf>,

    /// HTTP port (overrides TOML)
    #[arg(long)]
    port: Option<u16>,

    /// Config file (overrides PHYTO_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,
}

/// Install the global subscriber; `RUST_LOG` wins over the configured level
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before logging exists; its location is logged below
    let config_path = resolve_config_path(args.config.as_deref());
    let toml_config = load_toml_config(&config_path)?;

    init_tracing(&toml_config.logging)?;

    // Log build identification immediately after tracing init
    info!(
        "Starting phyto-id v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Config file: {}", config_path.display());

    // Step 1: Resolve root folder and open or create the database
    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &toml_config);
    let db_path = ensure_root_folder(&root_folder)
        .with_context(|| format!("Failed to initialize root folder {}", root_folder.display()))?;
    info!("Database: {}", db_path.display());

    let db_pool = init_database_pool(&db_path).await?;
    info!("Database connection established");

    // Step 2: Vocabulary and enrichment sources
    let vocabulary = load_vocabulary(&toml_config)?;
    let canonicalizer = Arc::new(TagCanonicalizer::new(vocabulary));

    let enrichment_settings = EnrichmentSettings::from_toml(&toml_config.enrichment);
    let enrichment = Arc::new(ImageEnrichmentResolver::from_settings(&enrichment_settings)?);
    info!(
        "Image enrichment ready (per-source timeout {:?}, up to {} diverse images)",
        enrichment_settings.source_timeout, enrichment_settings.max_diverse_images
    );

    // Step 3: Identification provider (optional)
    let identifier: Option<Arc<dyn IdentificationProvider>> =
        match resolve_plant_id_api_key(&toml_config) {
            Some(key) => {
                let client = PlantIdClient::new(key, plant_id::DEFAULT_API_URL)?;
                Some(Arc::new(client) as Arc<dyn IdentificationProvider>)
            }
            None => {
                warn!("Running without identification provider; only /api/resolve accepts results");
                None
            }
        };

    let state = AppState::new(
        Arc::new(SqliteStore::new(db_pool)),
        canonicalizer,
        enrichment,
        identifier,
    );
    let app = build_router(state);

    let port = args.port.or(toml_config.port).unwrap_or(DEFAULT_PORT);
    let addr = format!("{}:{}", args.bind, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
