//! Configuration loading and root folder resolution tests
//!
//! Tests touching PHYTO_ROOT_FOLDER / PHYTO_CONFIG are marked #[serial]
//! so they never run alongside each other.

use phyto_common::config::{
    ensure_root_folder, load_toml_config, resolve_config_path, resolve_root_folder, TomlConfig,
    CONFIG_FILE_ENV, DATABASE_FILE_NAME, ROOT_FOLDER_ENV,
};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};

#[test]
fn test_missing_config_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_toml_config(&dir.path().join("absent.toml")).unwrap();

    assert!(config.root_folder.is_none());
    assert!(config.plant_id_api_key.is_none());
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_full_config_file_parses() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
root_folder = "/srv/phyto"
port = 6000
plant_id_api_key = "secret-key"
vocabulary_file = "/etc/phyto/vocabulary.toml"

[logging]
level = "debug"

[enrichment]
placeholder_image_url = "https://example.org/leaf.png"
source_timeout_secs = 4
"#
    )
    .unwrap();

    let config = load_toml_config(file.path()).unwrap();
    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/phyto")));
    assert_eq!(config.port, Some(6000));
    assert_eq!(config.plant_id_api_key.as_deref(), Some("secret-key"));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(
        config.enrichment.placeholder_image_url.as_deref(),
        Some("https://example.org/leaf.png")
    );
    assert_eq!(config.enrichment.source_timeout_secs, Some(4));
    assert!(config.enrichment.inaturalist_url.is_none());
}

#[test]
fn test_malformed_config_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "port = \"not a number\"").unwrap();

    let err = load_toml_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("Parse TOML failed"));
}

#[test]
#[serial]
fn test_env_var_beats_toml_root_folder() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/phyto-env-root");
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/phyto-toml-root")),
        ..Default::default()
    };

    let resolved = resolve_root_folder(None, &toml);
    env::remove_var(ROOT_FOLDER_ENV);

    assert_eq!(resolved, PathBuf::from("/tmp/phyto-env-root"));
}

#[test]
#[serial]
fn test_toml_root_folder_used_without_env() {
    env::remove_var(ROOT_FOLDER_ENV);
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/phyto-toml-root")),
        ..Default::default()
    };

    assert_eq!(
        resolve_root_folder(None, &toml),
        PathBuf::from("/tmp/phyto-toml-root")
    );
}

#[test]
#[serial]
fn test_config_path_from_env() {
    env::set_var(CONFIG_FILE_ENV, "/tmp/phyto-custom.toml");
    let resolved = resolve_config_path(None);
    env::remove_var(CONFIG_FILE_ENV);

    assert_eq!(resolved, PathBuf::from("/tmp/phyto-custom.toml"));
    assert_eq!(
        resolve_config_path(Some(Path::new("/cli/config.toml"))),
        PathBuf::from("/cli/config.toml")
    );
}

#[test]
fn test_ensure_root_folder_creates_directory() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("nested").join("phyto");

    let db_path = ensure_root_folder(&root).unwrap();

    assert!(root.is_dir());
    assert_eq!(db_path, root.join(DATABASE_FILE_NAME));
}
