//! Runtime configuration.
//!
//! Layers, later wins:
//!
//! 1. built-in defaults,
//! 2. a TOML file (`--config` or `LOR_FEDERATION_CONFIG`),
//! 3. `LOR_*` environment overrides.
//!
//! ```toml
//! request_timeout_secs = 10
//! search_path = "/resources"
//! duf_provider_name = "DUF"
//!
//! [[sources]]
//! id = "1"
//! name = "Cornelsen"
//! search_url = "https://lor.example.com/api"
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AggregatorError, Result};

/// Env var naming the config file when `--config` is not given.
pub const CONFIG_PATH_ENV: &str = "LOR_FEDERATION_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Per-call timeout for every upstream request.
    pub request_timeout_secs: u64,
    /// Appended to a source's search base URL for search calls.
    pub search_path: String,
    /// Appended to a source's details base URL, followed by `/{itemId}`.
    pub details_path: String,
    /// Appended to a source's search base URL for the subject list.
    pub subject_path: String,
    /// Display name of the source that speaks the DUF filter dialect.
    pub duf_provider_name: Option<String>,
    pub sources: Vec<SourceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            search_path: "/resources".into(),
            details_path: "/resources".into(),
            subject_path: "/subjects".into(),
            duf_provider_name: None,
            sources: Vec::new(),
        }
    }
}

/// One `[[sources]]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub id: String,
    pub name: String,
    pub search_url: String,
    #[serde(default)]
    pub details_url: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Config {
    /// Load defaults, the optional file and env overrides, then validate.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from));

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config file");
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AggregatorError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply `LOR_*` overrides through `lookup` (the process environment in
    /// production).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(raw) = lookup("LOR_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = raw.trim().parse().map_err(|_| {
                AggregatorError::Config(format!("LOR_REQUEST_TIMEOUT_SECS is not a number: {raw}"))
            })?;
        }
        if let Some(path) = lookup("LOR_SEARCH_PATH") {
            self.search_path = path;
        }
        if let Some(path) = lookup("LOR_DETAILS_PATH") {
            self.details_path = path;
        }
        if let Some(path) = lookup("LOR_SUBJECT_PATH") {
            self.subject_path = path;
        }
        if let Some(name) = lookup("LOR_DUF_PROVIDER_NAME") {
            self.duf_provider_name = Some(name).filter(|n| !n.trim().is_empty());
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            return Err(AggregatorError::Config(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }

        let mut ids = HashSet::new();
        for source in &self.sources {
            if !ids.insert(source.id.as_str()) {
                return Err(AggregatorError::Config(format!(
                    "duplicate source id: {}",
                    source.id
                )));
            }
            if source.search_url.trim().is_empty() {
                return Err(AggregatorError::Config(format!(
                    "source {} has no search_url",
                    source.id
                )));
            }
            if source.details_url.as_deref().is_some_and(|u| u.trim().is_empty()) {
                return Err(AggregatorError::Config(format!(
                    "source {} has a blank details_url",
                    source.id
                )));
            }
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
