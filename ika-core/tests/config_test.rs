//! Tests for engine configuration

use ika_core::config::{IkaConfig, StoreKind};
use ika_core::{Error, ErrorClass};
use std::io::Write;

#[test]
fn test_config_default() {
    let config = IkaConfig::default();
    assert_eq!(config.lexicon.max_suggestions, 10);
    assert_eq!(config.catalog.default_pattern, "simple");
    assert!(config.catalog.disallowed_fields.contains(&"example_language".to_string()));
    assert_eq!(config.audio.store, StoreKind::Filesystem);
    assert!(config.synthesis.api_key.is_none());
}

#[test]
fn test_config_validation_suggestions() {
    let mut config = IkaConfig::default();
    config.lexicon.max_suggestions = 0;
    assert!(config.validate().is_err());

    config.lexicon.max_suggestions = 101;
    assert!(config.validate().is_err());

    config.lexicon.max_suggestions = 5;
    assert!(config.validate().is_ok());

    config.lexicon.candidate_pool = 4; // smaller than max_suggestions
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_cache_prefix() {
    let mut config = IkaConfig::default();
    config.audio.cache_prefix = "../escape".to_string();
    assert!(config.validate().is_err());

    config.audio.cache_prefix = "/abs".to_string();
    assert!(config.validate().is_err());

    config.audio.cache_prefix = "tts".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_validation_endpoint_and_voices() {
    let mut config = IkaConfig::default();
    config.synthesis.endpoint = "ftp://example.com".to_string();
    assert!(config.validate().is_err());

    config.synthesis.endpoint = "https://example.com".to_string();
    config.synthesis.voices.remove("default");
    assert!(config.validate().is_err());
}

#[test]
fn test_config_from_json() {
    let config = IkaConfig::from_str(r#"{"lexicon": {"max_suggestions": 3}, "audio": {"store": "memory"}}"#)
        .unwrap();
    assert_eq!(config.lexicon.max_suggestions, 3);
    assert_eq!(config.audio.store, StoreKind::Memory);
    // untouched sections keep their defaults
    assert_eq!(config.lexicon.max_phrase_words, 3);
}

#[test]
fn test_config_from_toml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "data_dir = \"/srv/ika\"\n\n[catalog]\nbanned_tokens = [\"foo\"]\ndefault_pattern = \"plain\"\n"
    )
    .unwrap();

    let config = IkaConfig::from_file(file.path()).unwrap();
    assert_eq!(config.data_dir, std::path::PathBuf::from("/srv/ika"));
    assert_eq!(config.catalog.banned_tokens, vec!["foo".to_string()]);
    assert_eq!(config.catalog.default_pattern, "plain");
}

#[test]
fn test_config_from_yaml() {
    let config = IkaConfig::from_str("lexicon:\n  max_edit_distance: 1\n").unwrap();
    assert_eq!(config.lexicon.max_edit_distance, 1);
}

#[test]
fn test_config_unparseable() {
    assert!(IkaConfig::from_str("{{{ not a config").is_err());
}

#[test]
fn test_missing_config_file_is_configuration_error() {
    let err: Error = IkaConfig::from_file("/definitely/not/here.toml").unwrap_err().into();
    assert_eq!(err.class(), ErrorClass::Configuration);
}

#[test]
fn test_data_path_resolution() {
    let mut config = IkaConfig::default();
    config.data_dir = "/srv/ika".into();
    assert_eq!(
        config.data_path(std::path::Path::new("lexicon.json")),
        std::path::PathBuf::from("/srv/ika/lexicon.json")
    );
    assert_eq!(
        config.data_path(std::path::Path::new("/etc/lex.json")),
        std::path::PathBuf::from("/etc/lex.json")
    );
}

#[test]
fn test_error_classes() {
    assert_eq!(Error::Validation("x".into()).class(), ErrorClass::Validation);
    assert_eq!(Error::LookupUnavailable("x".into()).class(), ErrorClass::TryAgain);
    assert_eq!(
        Error::SynthesisDenied { provider: "p".into(), detail: "403".into() }.class(),
        ErrorClass::FixCredentials
    );
    assert_eq!(Error::Unavailable("x".into()).class(), ErrorClass::Unavailable);
    assert!(Error::SynthesisTimeout(100).is_retryable());
    assert!(!Error::Configuration("x".into()).is_retryable());
}
