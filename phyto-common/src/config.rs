//! Configuration loading and root folder resolution
//!
//! Bootstrap settings come from a TOML file. A missing file is not fatal:
//! the service logs a warning and starts with built-in defaults.
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`PHYTO_ROOT_FOLDER`)
//! 3. TOML config file (`root_folder`)
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "PHYTO_ROOT_FOLDER";

/// Environment variable overriding the config file location
pub const CONFIG_FILE_ENV: &str = "PHYTO_CONFIG";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "phyto.db";

/// Bootstrap configuration loaded from TOML file
///
/// Cannot change while the service is running.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// HTTP server port (optional, service default applies)
    #[serde(default)]
    pub port: Option<u16>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Plant identification API key
    #[serde(default)]
    pub plant_id_api_key: Option<String>,

    /// Tag vocabulary override file (optional, builtin vocabulary otherwise)
    #[serde(default)]
    pub vocabulary_file: Option<PathBuf>,

    /// External image catalog overrides
    #[serde(default)]
    pub enrichment: EnrichmentToml,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `[enrichment]` section; every field falls back to the service default
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichmentToml {
    pub wikipedia_rest_url: Option<String>,
    pub wikipedia_action_url: Option<String>,
    pub inaturalist_url: Option<String>,
    pub photo_search_url: Option<String>,
    pub placeholder_image_url: Option<String>,
    pub source_timeout_secs: Option<u64>,
}

/// Load bootstrap configuration from a TOML file
///
/// A missing file yields defaults (with a warning). A file that exists but
/// does not parse is a configuration error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            "Config file not found: {} (using built-in defaults)",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Resolve the config file location: CLI argument, then `PHYTO_CONFIG`, then the
/// per-user config directory.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    default_config_path()
}

/// Per-user config file path (`~/.config/phyto/phyto-id.toml` on Linux)
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("phyto").join("phyto-id.toml"))
        .unwrap_or_else(|| PathBuf::from("phyto-id.toml"))
}

/// Resolve root folder following the priority order above
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/phyto (or /var/lib/phyto for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("phyto"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/phyto"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("phyto"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/phyto"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("phyto"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\phyto"))
    } else {
        PathBuf::from("./phyto_data")
    }
}

/// Create the root folder if missing and return the database path inside it
pub fn ensure_root_folder(root_folder: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(root_folder)?;
    Ok(root_folder.join(DATABASE_FILE_NAME))
}

/// User-agent string sent with every outbound HTTP request
///
/// Wikimedia and iNaturalist both ask clients to identify themselves.
pub fn get_user_agent() -> String {
    format!(
        "Phyto/{} (https://github.com/phyto-project/phyto)",
        env!("CARGO_PKG_VERSION")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.file.is_none());
        assert!(config.port.is_none());
    }

    #[test]
    fn test_user_agent_names_service() {
        let ua = get_user_agent();
        assert!(ua.starts_with("Phyto/"));
        assert!(ua.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_cli_arg_wins() {
        let toml = TomlConfig {
            root_folder: Some(PathBuf::from("/from/toml")),
            ..Default::default()
        };
        let resolved = resolve_root_folder(Some(Path::new("/from/cli")), &toml);
        assert_eq!(resolved, PathBuf::from("/from/cli"));
    }
}
