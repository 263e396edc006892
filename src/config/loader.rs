//! Configuration file loader.

use std::path::{Path, PathBuf};

use super::{AppConfig, SecretKey};

/// Environment variables read for each deployment input, in priority order.
///
/// `INPUT_*` names follow the GitHub Actions convention for action inputs.
pub const SECRET_KEY_ENV: &[&str] = &["DEPLOY_TAIL_SECRET_KEY", "INPUT_SECRETKEY"];
pub const APP_NAME_ENV: &[&str] = &["DEPLOY_TAIL_APP_NAME", "INPUT_APPNAME"];
pub const URL_ENV: &[&str] = &["DEPLOY_TAIL_URL", "INPUT_URL"];

/// Configuration loader that searches multiple locations.
#[derive(Debug)]
pub struct ConfigLoader {
    /// Search paths in order of priority.
    search_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default search paths.
    #[must_use]
    pub fn new() -> Self {
        let mut search_paths = Vec::new();

        // 1. Current directory: .deploy-tail.toml
        search_paths.push(PathBuf::from(".deploy-tail.toml"));

        // 2. User config directory: ~/.config/deploy-tail/config.toml
        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(config_dir.join("deploy-tail").join("config.toml"));
        }

        Self { search_paths }
    }

    /// Create a config loader with a specific config file path.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            search_paths: vec![path],
        }
    }

    /// Load configuration from the first available file, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        for path in &self.search_paths {
            if path.exists() {
                tracing::debug!(path = %path.display(), "Loading config file");
                return Self::load_from_path(path);
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(AppConfig::default())
    }

    /// Load configuration from a specific path.
    fn load_from_path(path: &Path) -> Result<AppConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the search paths for debugging.
    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Overlay deployment inputs from the process environment.
pub fn apply_env(config: &mut AppConfig) {
    apply_env_with(config, |name| std::env::var(name).ok());
}

/// Overlay deployment inputs using `lookup` to read variables.
///
/// Empty variables are ignored, so an unset action input does not erase a
/// value from the config file.
pub fn apply_env_with<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let first = |names: &[&str]| {
        names
            .iter()
            .filter_map(|&name| lookup(name))
            .find(|value| !value.trim().is_empty())
    };

    if let Some(key) = first(SECRET_KEY_ENV) {
        config.deploy.secret_key = Some(SecretKey::new(key));
    }
    if let Some(app_name) = first(APP_NAME_ENV) {
        config.deploy.app_name = Some(app_name);
    }
    if let Some(url) = first(URL_ENV) {
        config.deploy.url = Some(url);
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Input required and not supplied: {0}")]
    Missing(&'static str),

    #[error("Invalid deployment URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}
