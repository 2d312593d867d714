use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::http_client::DEFAULT_TIMEOUT;

/// Vienna. Used for searches and key validation when no zip code is stored.
pub const DEFAULT_ZIP_CODE: &str = "1010";

pub const SITE_ORIGIN: &str = "https://www.marktguru.at";
pub const API_BASE: &str = "https://api.marktguru.at/api/v1";

const CONFIG_DIR: &str = ".marktguru";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine the home directory")]
    NoHomeDir,

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode config: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persisted CLI settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    /// Where this config was loaded from. Never written to disk.
    #[serde(skip)]
    pub config_path: PathBuf,
}

impl Config {
    /// Stored key, treating an empty string as unset.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }

    /// Stored zip code, treating an empty string as unset.
    pub fn zip_code(&self) -> Option<&str> {
        self.zip_code.as_deref().filter(|z| !z.is_empty())
    }

    pub fn zip_code_or_default(&self) -> &str {
        self.zip_code().unwrap_or(DEFAULT_ZIP_CODE)
    }

    /// Zip code for a search: explicit value, then stored, then the default.
    pub fn resolve_zip_code<'a>(&'a self, explicit: Option<&'a str>) -> &'a str {
        explicit
            .filter(|z| !z.is_empty())
            .unwrap_or_else(|| self.zip_code_or_default())
    }
}

/// Partial update merged over the stored values by [`ConfigStore::save`].
#[derive(Debug, Clone, Default)]
pub struct ConfigUpdate {
    pub api_key: Option<String>,
    pub zip_code: Option<String>,
}

impl ConfigUpdate {
    pub fn api_key(key: impl Into<String>) -> Self {
        Self { api_key: Some(key.into()), ..Default::default() }
    }

    pub fn zip_code(code: impl Into<String>) -> Self {
        Self { zip_code: Some(code.into()), ..Default::default() }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// `~/.marktguru/config.json`
    pub fn default_location() -> Result<Self, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(Self::at(home.join(CONFIG_DIR).join(CONFIG_FILE)))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or unreadable file yields an empty config.
    pub fn load(&self) -> Config {
        let stored = fs::read_to_string(&self.path)
            .ok()
            .and_then(|data| match serde_json::from_str::<Config>(&data) {
                Ok(cfg) => Some(cfg),
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "ignoring malformed config"
                    );
                    None
                }
            })
            .unwrap_or_default();
        Config { config_path: self.path.clone(), ..stored }
    }

    pub fn save(&self, update: ConfigUpdate) -> Result<Config, ConfigError> {
        let write_err = |source| ConfigError::Write { path: self.path.clone(), source };
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(write_err)?;
        }
        let mut merged = self.load();
        if let Some(key) = update.api_key {
            merged.api_key = Some(key);
        }
        if let Some(zip) = update.zip_code {
            merged.zip_code = Some(zip);
        }
        let body = serde_json::to_string_pretty(&merged)?;
        fs::write(&self.path, body).map_err(write_err)?;
        tracing::debug!(path = %self.path.display(), "config saved");
        Ok(merged)
    }
}

/// Shape of base64-looking tokens the opaque-token heuristic keeps.
///
/// Runs of `scan_min..=scan_max` base64 characters (plus up to two `=`) are
/// matched; a run is kept when its full length lies in `keep_min..=keep_max`
/// and, if `require_padding` is set, it contains `=`. The defaults are tuned
/// against the current marktguru bundles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenShape {
    pub scan_min: usize,
    pub scan_max: usize,
    pub keep_min: usize,
    pub keep_max: usize,
    pub require_padding: bool,
}

impl Default for TokenShape {
    fn default() -> Self {
        Self { scan_min: 40, scan_max: 80, keep_min: 40, keep_max: 60, require_padding: true }
    }
}

/// Everything the key discovery run needs to know about the target site.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub origin: String,
    pub api_base: String,
    pub entry_paths: Vec<String>,
    pub max_scripts: usize,
    pub timeout: Duration,
    pub validation_zip_code: String,
    pub token_shape: TokenShape,
}

impl DiscoveryConfig {
    pub fn entry_urls(&self) -> Vec<String> {
        self.entry_paths
            .iter()
            .map(|path| format!("{}{}", self.origin, path))
            .collect()
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            origin: SITE_ORIGIN.to_string(),
            api_base: API_BASE.to_string(),
            entry_paths: ["/", "/search", "/search?q=test", "/suche", "/suche?q=test"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_scripts: 20,
            timeout: DEFAULT_TIMEOUT,
            validation_zip_code: DEFAULT_ZIP_CODE.to_string(),
            token_shape: TokenShape::default(),
        }
    }
}
