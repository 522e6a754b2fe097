//! Bootstrap configuration loading
//!
//! The TOML file is optional. Resolution order for the file location:
//! 1. Command-line argument (highest priority)
//! 2. `DELTAT_CONFIG` environment variable
//! 3. `<user config dir>/deltat/deltat-sync.toml`
//! 4. `/etc/deltat/deltat-sync.toml`
//!
//! A file named explicitly (1 or 2) must exist. When nothing is found in the
//! discovered locations (3 or 4), built-in defaults are used.

use crate::time::DEFAULT_INTERVAL_SECONDS;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "DELTAT_CONFIG";

/// Config file name searched for in the platform config directories
pub const CONFIG_FILE_NAME: &str = "deltat-sync.toml";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Shared credential for every owner identity (optional, see `DELTAT_PASSWORD`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Remote service location
    pub server: ServerConfig,

    /// Owner identities to visit
    pub owners: OwnersConfig,

    /// What to synchronise and how
    pub sync: SyncConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Remote service location
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `https` or `http`
    pub scheme: String,
    /// Per-request timeout; no timeout when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "outreach.openmicroscopy.org".to_string(),
            port: 4064,
            scheme: "https".to_string(),
            request_timeout_secs: None,
        }
    }
}

/// Owner identities `<prefix><first>` through `<prefix><last>` inclusive
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OwnersConfig {
    pub prefix: String,
    pub first: u32,
    pub last: u32,
}

impl Default for OwnersConfig {
    fn default() -> Self {
        Self {
            prefix: "user-".to_string(),
            first: 2,
            last: 40,
        }
    }
}

impl OwnersConfig {
    /// Expand the range into owner names
    pub fn identities(&self) -> Vec<String> {
        (self.first..=self.last)
            .map(|n| format!("{}{}", self.prefix, n))
            .collect()
    }
}

/// Dataset and interval settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    pub dataset_name: String,
    pub interval_seconds: f64,
    pub dry_run: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            dataset_name: "Condensation".to_string(),
            interval_seconds: DEFAULT_INTERVAL_SECONDS,
            dry_run: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Where the loaded configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

/// Find the config file to load, if any
///
/// Returns `Ok(None)` when no explicit path was given and no file exists in
/// the discovered locations.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Result<Option<PathBuf>> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return explicit_path(path.to_path_buf(), "command line");
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return explicit_path(PathBuf::from(path), CONFIG_ENV_VAR);
        }
    }

    // Priority 3 and 4: platform locations
    Ok(default_locations().into_iter().find(|p| p.exists()))
}

fn explicit_path(path: PathBuf, origin: &str) -> Result<Option<PathBuf>> {
    if path.exists() {
        Ok(Some(path))
    } else {
        Err(Error::Config(format!(
            "Config file from {} not found: {}",
            origin,
            path.display()
        )))
    }
}

/// Platform config file locations, most specific first
pub fn default_locations() -> Vec<PathBuf> {
    let mut locations = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        locations.push(dir.join("deltat").join(CONFIG_FILE_NAME));
    }
    if cfg!(unix) {
        locations.push(PathBuf::from("/etc/deltat").join(CONFIG_FILE_NAME));
    }
    locations
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Resolve and load the bootstrap configuration
///
/// Missing discovered files degrade to built-in defaults. Loading happens
/// before logging is configured, so the caller reports the source.
pub fn load_config(cli_arg: Option<&Path>) -> Result<(TomlConfig, ConfigSource)> {
    match resolve_config_path(cli_arg)? {
        Some(path) => {
            let config = load_toml_config(&path)?;
            Ok((config, ConfigSource::File(path)))
        }
        None => Ok((TomlConfig::default(), ConfigSource::Defaults)),
    }
}

/// Write a config file (used to generate a starting template)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize config failed: {}", e)))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}
