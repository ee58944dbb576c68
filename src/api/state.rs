//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, RwLock};

use crate::config::DashboardConfig;
use crate::poller::{PollerStatus, SharedStore, StoreUpdate};

/// Shared application state for all handlers
pub struct AppState {
    /// Accumulated luminosity series, written by the poller
    pub store: SharedStore,
    /// Store change notifications, one per tick that stored samples
    pub updates: broadcast::Sender<StoreUpdate>,
    /// Poller counters for health reporting
    pub poller_status: Arc<RwLock<PollerStatus>>,
    /// Dashboard configuration
    pub config: Arc<DashboardConfig>,
    /// How often the page falls back to re-fetching the figure
    pub refresh_interval: Duration,
    /// Server start time for uptime tracking
    pub start_time: Instant,
    /// Open WebSocket connections
    pub ws_connections: AtomicUsize,
}

impl AppState {
    pub fn new(
        store: SharedStore,
        updates: broadcast::Sender<StoreUpdate>,
        poller_status: Arc<RwLock<PollerStatus>>,
        config: DashboardConfig,
        refresh_interval: Duration,
    ) -> Self {
        Self {
            store,
            updates,
            poller_status,
            config: Arc::new(config),
            refresh_interval,
            start_time: Instant::now(),
            ws_connections: AtomicUsize::new(0),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Get WebSocket connection count
    pub fn ws_connection_count(&self) -> usize {
        self.ws_connections.load(std::sync::atomic::Ordering::Relaxed)
    }
}

/// Empty store, default dashboard config, 10 second refresh
#[cfg(test)]
pub(crate) fn test_state() -> Arc<AppState> {
    use crate::series::SeriesStore;

    let (updates, _) = broadcast::channel(16);
    Arc::new(AppState::new(
        Arc::new(RwLock::new(SeriesStore::default())),
        updates,
        Arc::new(RwLock::new(PollerStatus::default())),
        DashboardConfig::default(),
        Duration::from_secs(10),
    ))
}
