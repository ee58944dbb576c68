//! Luminosity Viewer
//!
//! Run with: cargo run -- [--config PATH]
//!
//! # Configuration
//!
//! Settings come from `--config`, or the first config file found in the
//! default locations, then `LUMINOSITY_*` environment overrides.
//! `RUST_LOG` takes precedence over the configured log level.

use anyhow::Context;
use clap::{Parser, Subcommand};
use luminosity_viewer::api::{serve, AppState};
use luminosity_viewer::config::{generate_default_config, Config, LoggingConfig};
use luminosity_viewer::poller::{Poller, PollerSettings};
use luminosity_viewer::series::{SeriesStore, TimeNormalizer};
use luminosity_viewer::sth::SthClient;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Update channel capacity; slow pages re-render from the latest state
const UPDATE_CHANNEL_CAPACITY: usize = 64;

#[derive(Parser)]
#[command(name = "luminosity-viewer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Live luminosity chart fed by FIWARE STH history")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll STH and serve the dashboard (default)
    Run,
    /// Print a default config file
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Config) = cli.command {
        print!("{}", generate_default_config());
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load_default().context("loading config from default locations")?,
    };

    init_tracing(&config.logging);
    config.validate().context("invalid configuration")?;

    tracing::info!("Starting Luminosity Viewer v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        sth = %config.sth.base_url,
        entity = %config.sth.entity_id,
        attribute = %config.sth.attribute,
        "Polling STH history"
    );

    let tz = config.poller.tz()?;
    let store = Arc::new(RwLock::new(SeriesStore::new(
        config.poller.overlap,
        config.poller.max_points,
    )));
    let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);

    let client = SthClient::new(config.sth.clone()).context("creating STH client")?;
    let interval = Duration::from_secs(config.poller.interval_secs);

    let poller = Arc::new(Poller::new(
        Arc::new(client),
        TimeNormalizer::new(tz),
        Arc::clone(&store),
        updates.clone(),
        PollerSettings {
            last_n: config.sth.last_n,
            interval,
        },
    ));

    let state = AppState::new(
        store,
        updates,
        poller.status_handle(),
        config.dashboard.clone(),
        interval,
    );

    let poll_handle = Arc::clone(&poller).start();

    serve(state, &config.dashboard).await?;

    poll_handle.abort();
    tracing::info!("Luminosity Viewer stopped");

    Ok(())
}

/// Initialize tracing from the logging config, letting `RUST_LOG` win
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "luminosity_viewer={level},tower_http={level}",
            level = logging.level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
