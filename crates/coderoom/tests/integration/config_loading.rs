use std::path::PathBuf;

use coderoom::config::{Config, SourceNaming};

use super::FIXTURES_PATH;

fn config_path(name: &str) -> String {
    format!("{FIXTURES_PATH}/configs/{name}")
}

#[test]
fn test_load_valid_full_config() {
    let config = Config::from_file(config_path("valid_full.toml")).expect("Failed to load config");

    assert_eq!(config.temp_dir, PathBuf::from("/tmp/coderoom-fixture"));
    assert_eq!(config.shell, PathBuf::from("/bin/bash"));
    assert_eq!(config.default_limits.run_time_limit, Some(2.0));
    assert_eq!(config.default_limits.max_output, Some(64));

    let (id, cpp) = config.find_language("CXX").expect("alias not resolved");
    assert_eq!(id, "cpp");
    let limits = config.effective_limits(cpp);
    assert_eq!(limits.compile_time_limit, Some(20.0));
    assert_eq!(limits.run_time_limit, Some(1.0));

    let java = config.get_language("java").unwrap();
    assert_eq!(java.source_name, SourceNaming::PublicClass);

    let latex = config.get_language("latex").unwrap();
    let document = latex.document.as_ref().unwrap();
    assert_eq!(document.passes, 3);
    assert_eq!(document.error_markers, vec!["!".to_owned()]);
    assert_eq!(document.log_extension.as_str(), "log");
}

#[test]
fn test_load_minimal_config() {
    let config =
        Config::from_file(config_path("valid_minimal.toml")).expect("Failed to load config");

    assert!(config.languages.contains_key("test"));
    assert_eq!(config.shell, PathBuf::from("/bin/sh"));
    assert_eq!(config.get_language("test").unwrap().kind(), "interpreted");
}

#[test]
fn test_load_missing_file() {
    assert!(Config::from_file(config_path("does_not_exist.toml")).is_err());
}

#[test]
fn test_load_invalid_configs() {
    for name in [
        "invalid_empty_name.toml",
        "invalid_empty_extension.toml",
        "invalid_extension_with_dot.toml",
        "invalid_empty_run_command.toml",
        "invalid_no_pipeline.toml",
        "invalid_document_and_compile.toml",
        "invalid_zero_passes.toml",
        "invalid_alias_collision.toml",
        "invalid_negative_time_limit.toml",
    ] {
        let result = Config::from_file(config_path(name));
        assert!(result.is_err(), "{name} should be rejected");
    }
}

#[test]
fn test_load_negative_time_limit_names_the_key() {
    let err = Config::from_file(config_path("invalid_negative_time_limit.toml")).unwrap_err();
    assert!(err.to_string().contains("default_limits.run_time_limit"));
}

#[test]
fn test_example_config_round_trips_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("coderoom.toml");
    std::fs::write(&path, coderoom::EXAMPLE_CONFIG).unwrap();

    let config = Config::from_file(&path).expect("Failed to load example config");
    assert_eq!(config.languages.len(), Config::default().languages.len());
}
