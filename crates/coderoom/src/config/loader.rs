//! Configuration file loading
//!
//! Handles loading and parsing configuration files using the config crate.

use std::collections::HashMap;
use std::path::Path;

use config::{Config as ConfigBuilder, File, FileFormat};

use crate::config::{Config, ConfigError};

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = ConfigBuilder::builder()
            .add_source(File::from(path))
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config = ConfigBuilder::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError> {
        if self.shell.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("shell must not be empty".to_owned()));
        }

        check_time_limit(
            "default_limits.compile_time_limit",
            self.default_limits.compile_time_limit,
        )?;
        check_time_limit(
            "default_limits.run_time_limit",
            self.default_limits.run_time_limit,
        )?;

        // Every id and alias must resolve to exactly one language
        let mut names: HashMap<String, &str> = HashMap::new();
        for id in self.languages.keys() {
            if let Some(other) = names.insert(id.to_lowercase(), id) {
                return Err(ConfigError::Invalid(format!(
                    "language '{id}' collides with '{other}' (ids are case-insensitive)"
                )));
            }
        }

        for (id, lang) in &self.languages {
            if lang.name.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "language '{id}' has empty name"
                )));
            }
            if lang.extension.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "language '{id}' has empty extension"
                )));
            }
            if lang.pipeline().is_none() {
                return Err(ConfigError::Invalid(format!(
                    "language '{id}' must define either a run step (optionally with a compile \
                     step) or a document step"
                )));
            }
            if let Some(ref run) = lang.run
                && run.command.trim().is_empty()
            {
                return Err(ConfigError::Invalid(format!(
                    "language '{id}' has empty run command"
                )));
            }
            if let Some(ref compile) = lang.compile
                && compile.command.trim().is_empty()
            {
                return Err(ConfigError::Invalid(format!(
                    "language '{id}' has empty compile command"
                )));
            }
            let step_limits = [
                ("compile", lang.compile.as_ref().and_then(|c| c.time_limit)),
                ("run", lang.run.as_ref().and_then(|r| r.time_limit)),
                ("document", lang.document.as_ref().and_then(|d| d.time_limit)),
            ];
            for (step, limit) in step_limits {
                check_time_limit(&format!("languages.{id}.{step}.time_limit"), limit)?;
            }
            if let Some(ref document) = lang.document {
                if document.command.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "language '{id}' has empty document command"
                    )));
                }
                if document.passes == 0 {
                    return Err(ConfigError::Invalid(format!(
                        "language '{id}' must run the document command at least once"
                    )));
                }
            }
            for alias in &lang.aliases {
                let alias = alias.to_lowercase();
                if let Some(other) = names.insert(alias.clone(), id) {
                    return Err(ConfigError::Invalid(format!(
                        "alias '{alias}' of language '{id}' collides with '{other}'"
                    )));
                }
            }
        }

        Ok(())
    }
}

/// A time limit, when set, must be a positive number of seconds
fn check_time_limit(key: &str, seconds: Option<f64>) -> Result<(), ConfigError> {
    match seconds {
        Some(seconds) if !seconds.is_finite() || seconds <= 0.0 => Err(ConfigError::Invalid(
            format!("{key} must be a positive number of seconds, got {seconds}"),
        )),
        _ => Ok(()),
    }
}
