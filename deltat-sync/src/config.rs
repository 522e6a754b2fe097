//! Effective run configuration
//!
//! **Priority:** CLI → ENV → TOML → built-in defaults
//!
//! The credential is never taken from the command line.

use crate::batch::BatchOptions;
use deltat_common::config::{ServerConfig, TomlConfig};
use deltat_common::{Error, Interval, Result};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable holding the shared owner credential
pub const PASSWORD_ENV_VAR: &str = "DELTAT_PASSWORD";

/// Values given on the command line (or their `env` fallbacks)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dataset: Option<String>,
    pub interval: Option<f64>,
    pub first: Option<u32>,
    pub last: Option<u32>,
    pub dry_run: bool,
}

/// Everything a run needs, validated
#[derive(Clone)]
pub struct RunConfig {
    pub server: ServerConfig,
    pub owners: Vec<String>,
    pub options: BatchOptions,
    pub password: String,
}

impl RunConfig {
    pub fn base_url(&self) -> String {
        crate::remote::gateway::base_url(&self.server.scheme, &self.server.host, self.server.port)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.server.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Resolve the shared credential
///
/// **Priority:** ENV → TOML
pub fn resolve_password(toml_config: &TomlConfig) -> Result<String> {
    let env_password = std::env::var(PASSWORD_ENV_VAR)
        .ok()
        .filter(|p| is_valid_password(p));
    let toml_password = toml_config
        .password
        .as_ref()
        .filter(|p| is_valid_password(p));

    if env_password.is_some() && toml_password.is_some() {
        warn!(
            "Password found in multiple sources: environment, TOML. Using environment (highest priority)."
        );
    }

    if let Some(password) = env_password {
        info!("Password loaded from environment variable");
        return Ok(password);
    }

    if let Some(password) = toml_password {
        info!("Password loaded from TOML config");
        return Ok(password.clone());
    }

    Err(Error::Config(format!(
        "Password not configured. Please configure using one of:\n\
         1. Environment: {}=your-password\n\
         2. TOML config: password = \"your-password\"",
        PASSWORD_ENV_VAR
    )))
}

/// Non-empty, non-whitespace
pub fn is_valid_password(password: &str) -> bool {
    !password.trim().is_empty()
}

/// Merge CLI overrides into the TOML config and validate the result
pub fn build_run_config(mut toml_config: TomlConfig, cli: &CliOverrides) -> Result<RunConfig> {
    if let Some(host) = &cli.host {
        toml_config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        toml_config.server.port = port;
    }
    if let Some(dataset) = &cli.dataset {
        toml_config.sync.dataset_name = dataset.clone();
    }
    if let Some(interval) = cli.interval {
        toml_config.sync.interval_seconds = interval;
    }
    if let Some(first) = cli.first {
        toml_config.owners.first = first;
    }
    if let Some(last) = cli.last {
        toml_config.owners.last = last;
    }
    if cli.dry_run {
        toml_config.sync.dry_run = true;
    }

    validate(&toml_config)?;

    let interval = Interval::from_seconds(toml_config.sync.interval_seconds)?;
    let password = resolve_password(&toml_config)?;

    Ok(RunConfig {
        owners: toml_config.owners.identities(),
        options: BatchOptions {
            dataset_name: toml_config.sync.dataset_name,
            interval,
            dry_run: toml_config.sync.dry_run,
        },
        server: toml_config.server,
        password,
    })
}

fn validate(config: &TomlConfig) -> Result<()> {
    if config.server.host.trim().is_empty() {
        return Err(Error::Config("server.host must not be empty".to_string()));
    }
    if config.server.scheme != "http" && config.server.scheme != "https" {
        return Err(Error::Config(format!(
            "server.scheme must be http or https, got '{}'",
            config.server.scheme
        )));
    }
    if config.sync.dataset_name.trim().is_empty() {
        return Err(Error::Config("sync.dataset_name must not be empty".to_string()));
    }
    if config.owners.first > config.owners.last {
        return Err(Error::Config(format!(
            "owners.first ({}) must not exceed owners.last ({})",
            config.owners.first, config.owners.last
        )));
    }
    Ok(())
}
