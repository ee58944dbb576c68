//! # Luminosity Viewer
//!
//! Polls a FIWARE STH-Comet server for a lamp's luminosity history and serves
//! a live chart of every reading seen since startup, with a dashed line at
//! their mean.
//!
//! ## Modules
//!
//! - [`sth`]: History fetcher for the STH REST API
//! - [`series`]: Timestamp normalization and the series store
//! - [`poller`]: Timer-driven fetch-and-append loop
//! - [`chart`]: Figure rendering
//! - [`api`]: Dashboard server with Axum
//! - [`websocket`]: Figure pushes to open pages
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use luminosity_viewer::config::Config;
//! use luminosity_viewer::poller::{Poller, PollerSettings};
//! use luminosity_viewer::series::{SeriesStore, TimeNormalizer};
//! use luminosity_viewer::sth::SthClient;
//! use std::sync::Arc;
//! use tokio::sync::{broadcast, RwLock};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let store = Arc::new(RwLock::new(SeriesStore::default()));
//!     let (updates, _) = broadcast::channel(16);
//!
//!     let poller = Poller::new(
//!         Arc::new(SthClient::new(config.sth.clone())?),
//!         TimeNormalizer::new(config.poller.tz()?),
//!         Arc::clone(&store),
//!         updates,
//!         PollerSettings::default(),
//!     );
//!
//!     let outcome = poller.tick().await;
//!     println!("Stored {} of {} fetched samples", outcome.appended, outcome.fetched);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod chart;
pub mod config;
pub mod poller;
pub mod series;
pub mod sth;
pub mod websocket;

// Re-export top-level types for convenience
pub use api::{build_router, serve, ApiError, AppState};
pub use chart::{render, Figure};
pub use config::{
    Config, ConfigError, DashboardConfig, LoggingConfig, PollerConfig, SthConfig,
};
pub use poller::{
    Poller, PollerSettings, PollerStatus, SampleSource, SharedStore, StoreUpdate, TickOutcome,
};
pub use series::{OverlapPolicy, Sample, SeriesStore, TimeError, TimeNormalizer};
pub use sth::{AttrValue, SthClient, SthError};
pub use websocket::{websocket_handler, ClientMessage, ServerMessage};
