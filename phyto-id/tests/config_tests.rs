//! Configuration resolution tests
//!
//! Tests that touch PHYTO_PLANT_ID_API_KEY are #[serial] so they never race.

use phyto_common::config::{EnrichmentToml, TomlConfig};
use phyto_id::config::{
    load_vocabulary, resolve_plant_id_api_key, EnrichmentSettings, PLANT_ID_API_KEY_ENV,
};
use serial_test::serial;
use std::io::Write;
use std::time::Duration;

fn toml_with_key(key: Option<&str>) -> TomlConfig {
    TomlConfig {
        plant_id_api_key: key.map(str::to_string),
        ..Default::default()
    }
}

#[test]
#[serial]
fn test_env_overrides_toml_key() {
    std::env::set_var(PLANT_ID_API_KEY_ENV, "env-key");
    let key = resolve_plant_id_api_key(&toml_with_key(Some("toml-key")));
    std::env::remove_var(PLANT_ID_API_KEY_ENV);

    assert_eq!(key.as_deref(), Some("env-key"));
}

#[test]
#[serial]
fn test_toml_key_when_env_blank() {
    std::env::set_var(PLANT_ID_API_KEY_ENV, "   ");
    let key = resolve_plant_id_api_key(&toml_with_key(Some("toml-key")));
    std::env::remove_var(PLANT_ID_API_KEY_ENV);

    assert_eq!(key.as_deref(), Some("toml-key"));
}

#[test]
#[serial]
fn test_missing_key_is_none() {
    std::env::remove_var(PLANT_ID_API_KEY_ENV);
    assert_eq!(resolve_plant_id_api_key(&toml_with_key(None)), None);
    assert_eq!(resolve_plant_id_api_key(&toml_with_key(Some(""))), None);
}

#[test]
fn test_enrichment_section_parsed_from_toml() {
    let config: TomlConfig = toml::from_str(
        r#"
        port = 6000

        [enrichment]
        photo_search_url = "http://localhost:8080/v1/images/"
        source_timeout_secs = 4
        "#,
    )
    .unwrap();

    let settings = EnrichmentSettings::from_toml(&config.enrichment);
    assert_eq!(settings.photo_search_url, "http://localhost:8080/v1/images/");
    assert_eq!(settings.source_timeout, Duration::from_secs(4));
    assert_eq!(
        settings.wikipedia_rest_url,
        EnrichmentSettings::from_toml(&EnrichmentToml::default()).wikipedia_rest_url
    );
}

#[test]
fn test_vocabulary_override_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
        version = "test-1"

        [categories]
        digestive = ["carminative", "digestive"]

        [rules]
        "settles the stomach" = "digestive"

        [[keywords]]
        keyword = "gas"
        tag = "carminative"
        "#
    )
    .unwrap();

    let config = TomlConfig {
        vocabulary_file: Some(file.path().to_path_buf()),
        ..Default::default()
    };
    let vocabulary = load_vocabulary(&config).unwrap();
    assert_eq!(vocabulary.version(), "test-1");
    assert_eq!(vocabulary.len(), 2);
    assert_eq!(vocabulary.normalize("settles the stomach"), Some("digestive"));
}

#[test]
fn test_invalid_vocabulary_file_fails() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
        version = "bad"

        [categories]
        digestive = ["digestive"]

        [rules]
        "tummy" = "not-a-tag"
        "#
    )
    .unwrap();

    let config = TomlConfig {
        vocabulary_file: Some(file.path().to_path_buf()),
        ..Default::default()
    };
    assert!(load_vocabulary(&config).is_err());
}
