#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for portpatch
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/portpatch/config.toml)
//! - Environment variables
//! - CLI flags (applied by the binary)

pub mod constants;
pub mod core;
pub mod patch;
pub mod sources;

pub use self::core::{GeneralConfig, NetworkConfig};
pub use patch::PatchConfig;
pub use sources::{expand_template, SourcesConfig};

use constants::{
    ENV_COLOR, ENV_GITHUB_TOKEN, ENV_LOCAL_PATCH_DIR, ENV_PATCH_DIR, ENV_REFERENCE, ENV_SOURCES,
    ENV_TIMEOUT,
};
use portpatch_errors::{ConfigError, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub sources: SourcesConfig,

    #[serde(default)]
    pub patch: PatchConfig,

    #[serde(default)]
    pub network: NetworkConfig,
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("portpatch").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        let config: Self = toml::from_str(&contents).map_err(ConfigError::from)?;
        debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        match Self::default_path() {
            Ok(config_path) if config_path.exists() => Self::load_from_file(&config_path).await,
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        if let Ok(reference) = std::env::var(ENV_REFERENCE) {
            if reference.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: ENV_REFERENCE.to_string(),
                    value: reference,
                }
                .into());
            }
            self.sources.reference = reference;
        }

        if let Ok(sources) = std::env::var(ENV_SOURCES) {
            let names = parse_source_list(&sources);
            if names.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: ENV_SOURCES.to_string(),
                    value: sources,
                }
                .into());
            }
            self.sources.names = names;
        }

        if let Ok(dir) = std::env::var(ENV_PATCH_DIR) {
            self.patch.patch_dir = PathBuf::from(dir);
        }

        if let Ok(dir) = std::env::var(ENV_LOCAL_PATCH_DIR) {
            self.patch.local_dir = PathBuf::from(dir);
        }

        if let Ok(token) = std::env::var(ENV_GITHUB_TOKEN) {
            if !token.is_empty() {
                self.sources.api_token = Some(token);
            }
        }

        if let Ok(color) = std::env::var(ENV_COLOR) {
            self.general.color = color.parse().map_err(|_| ConfigError::InvalidValue {
                field: ENV_COLOR.to_string(),
                value: color,
            })?;
        }

        if let Ok(timeout) = std::env::var(ENV_TIMEOUT) {
            self.network.timeout = timeout.parse().map_err(|_| ConfigError::InvalidValue {
                field: ENV_TIMEOUT.to_string(),
                value: timeout,
            })?;
        }

        Ok(())
    }

    /// Validate cross-field invariants after all layers are merged
    ///
    /// # Errors
    ///
    /// Returns an error if no source is configured, a URL template is
    /// malformed, or downloads would land in the local patch directory.
    pub fn validate(&self) -> Result<(), Error> {
        if self.sources.names.is_empty() {
            return Err(ConfigError::MissingField {
                field: "sources".to_string(),
            }
            .into());
        }
        if same_dir(&self.patch.patch_dir, &self.patch.local_dir) {
            return Err(ConfigError::InvalidValue {
                field: "patch.patch_dir".to_string(),
                value: format!(
                    "{} (same as patch.local_dir)",
                    self.patch.patch_dir.display()
                ),
            }
            .into());
        }
        self.sources.validate()
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (std::path::absolute(a), std::path::absolute(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Split a comma separated source list, dropping empty entries
#[must_use]
pub fn parse_source_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}
