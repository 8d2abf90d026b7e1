use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

pub use crate::config::language::{
    CompileConfig, DocumentConfig, FileExtension, Language, Pipeline, Placeholders, RunConfig,
    SourceNaming, shell_quote,
};
use crate::types::Limits;

pub mod language;
mod loader;

/// Example configuration embedded at compile time.
///
/// Describes every supported language; also used as the default configuration.
pub const EXAMPLE_CONFIG: &str = include_str!("../../coderoom.example.toml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid characters in file extension")]
    InvalidFileExtChars,

    #[error("failed to parse config: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("language '{0}' not found in configuration")]
    LanguageNotFound(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Config for the execution service
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Shared root under which every request workspace is created
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Shell used to interpret command templates
    #[serde(default = "default_shell")]
    pub shell: PathBuf,

    /// Default limits applied to every language.
    /// Unset fields fall back to the built-in defaults.
    #[serde(default)]
    pub default_limits: Limits,

    /// Language configurations keyed by language ID
    #[serde(default)]
    pub languages: HashMap<String, Language>,
}

impl Config {
    /// Create a new config with embedded default languages
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty config with no languages
    pub fn empty() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            shell: default_shell(),
            default_limits: Limits::default(),
            languages: HashMap::new(),
        }
    }

    /// Get a language by ID or alias, ignoring case
    pub fn get_language(&self, id: &str) -> Result<&Language, ConfigError> {
        self.find_language(id)
            .map(|(_, language)| language)
            .ok_or_else(|| ConfigError::LanguageNotFound(id.to_string()))
    }

    /// Get a language together with its canonical ID
    pub fn find_language(&self, id: &str) -> Option<(&str, &Language)> {
        let wanted = id.trim().to_lowercase();
        if let Some((key, language)) = self.languages.get_key_value(&wanted) {
            return Some((key.as_str(), language));
        }
        self.languages
            .iter()
            .find(|(key, language)| key.eq_ignore_ascii_case(&wanted) || language.has_alias(&wanted))
            .map(|(key, language)| (key.as_str(), language))
    }

    /// Limits for a language: built-in defaults, then config defaults, then
    /// the language's own step limits
    pub fn effective_limits(&self, language: &Language) -> Limits {
        Limits::default()
            .with_overrides(&self.default_limits)
            .with_overrides(&language.limits())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::parse_toml(EXAMPLE_CONFIG).expect("embedded default config should be valid")
    }
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("coderoom")
}

fn default_shell() -> PathBuf {
    PathBuf::from("/bin/sh")
}
