//! deltat-sync - PlaneInfo deltaT batch synchronisation
//!
//! For every configured owner identity, finds the named dataset, and for each
//! image creates or rewrites the z=0/c=0 PlaneInfo records so that timepoint
//! `t` carries `t * interval` seconds.

use anyhow::{Context, Result};
use clap::Parser;
use deltat_common::config::{load_config, write_toml_config, ConfigSource, TomlConfig};
use deltat_sync::config::{build_run_config, CliOverrides};
use deltat_sync::remote::GatewayConnector;
use deltat_sync::BatchSynchronizer;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

/// Command-line arguments for deltat-sync
#[derive(Parser, Debug)]
#[command(name = "deltat-sync")]
#[command(about = "Create or rewrite per-timepoint PlaneInfo deltaT for a dataset of every owner")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long, env = "DELTAT_CONFIG")]
    config: Option<PathBuf>,

    /// Metadata service host
    #[arg(long, env = "DELTAT_HOST")]
    host: Option<String>,

    /// Metadata service port
    #[arg(long, env = "DELTAT_PORT")]
    port: Option<u16>,

    /// Dataset name to look up for each owner
    #[arg(short, long, env = "DELTAT_DATASET")]
    dataset: Option<String>,

    /// Seconds between consecutive timepoints
    #[arg(short, long, env = "DELTAT_INTERVAL")]
    interval: Option<f64>,

    /// First owner number (inclusive)
    #[arg(long, env = "DELTAT_FIRST")]
    first: Option<u32>,

    /// Last owner number (inclusive)
    #[arg(long, env = "DELTAT_LAST")]
    last: Option<u32>,

    /// Read and reconcile without saving
    #[arg(long, env = "DELTAT_DRY_RUN")]
    dry_run: bool,

    /// Write a config template with the built-in defaults to PATH and exit
    #[arg(long, value_name = "PATH")]
    init_config: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            host: self.host.clone(),
            port: self.port,
            dataset: self.dataset.clone(),
            interval: self.interval,
            first: self.first,
            last: self.last,
            dry_run: self.dry_run,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    if let Some(path) = &args.init_config {
        write_toml_config(&TomlConfig::default(), path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Wrote {}", path.display());
        return Ok(ExitCode::SUCCESS);
    }

    let (toml_config, source) =
        load_config(args.config.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing; RUST_LOG wins over the configured level
    let default_filter = format!(
        "deltat_sync={0},deltat_common={0}",
        toml_config.logging.level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    info!("Starting deltat-sync v{}", env!("CARGO_PKG_VERSION"));
    match &source {
        ConfigSource::File(path) => info!("Loaded configuration from {}", path.display()),
        ConfigSource::Defaults => warn!("No config file found, using built-in defaults"),
    }

    let run_config =
        build_run_config(toml_config, &args.overrides()).context("Invalid configuration")?;

    let base_url = run_config.base_url();
    info!("Metadata service: {}", base_url);

    let connector = GatewayConnector::new(base_url, run_config.request_timeout())
        .context("Failed to create metadata service client")?;

    let synchronizer =
        BatchSynchronizer::new(connector, run_config.password, run_config.options);
    let summary = synchronizer.run(&run_config.owners).await;

    if summary.has_failures() {
        for failure in &summary.failures {
            error!(
                kind = failure.kind,
                owner = %failure.owner,
                dataset_id = ?failure.dataset_id,
                image_id = ?failure.image_id,
                "{}",
                failure.message
            );
        }
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}
