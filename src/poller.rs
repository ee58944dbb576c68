//! Poller
//!
//! Drives the fetch-and-append cycle: on every tick, read the latest window
//! from a [`SampleSource`], normalize timestamps and append the samples to the
//! shared [`SeriesStore`]. Each change to the store is published as a
//! [`StoreUpdate`] so pages can re-render.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};

use crate::series::{Sample, SeriesStore, TimeNormalizer};
use crate::sth::AttrValue;

/// Shared handle to the series store
pub type SharedStore = Arc<RwLock<SeriesStore>>;

/// Anything that can return the most recent attribute values.
///
/// Implementations swallow their own failures and return an empty list.
#[async_trait]
pub trait SampleSource: Send + Sync {
    async fn latest(&self, last_n: usize) -> Vec<AttrValue>;
}

/// Published after every tick that changed the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreUpdate {
    pub version: u64,
    pub len: usize,
}

/// Result of one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickOutcome {
    /// Records returned by the source
    pub fetched: usize,
    /// Samples stored
    pub appended: usize,
    /// Records dropped for an unusable value or timestamp
    pub skipped: usize,
}

/// Running counters for health reporting
#[derive(Debug, Clone, Default, Serialize)]
pub struct PollerStatus {
    pub ticks: u64,
    pub last_tick_at: Option<DateTime<Utc>>,
    pub last_fetched: usize,
    pub last_appended: usize,
    /// Ticks in a row that stored nothing
    pub consecutive_empty: u32,
}

/// Poll loop configuration
#[derive(Debug, Clone)]
pub struct PollerSettings {
    pub last_n: usize,
    pub interval: Duration,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            last_n: 10,
            interval: Duration::from_secs(10),
        }
    }
}

/// Timer-driven accumulator
pub struct Poller {
    source: Arc<dyn SampleSource>,
    normalizer: TimeNormalizer,
    store: SharedStore,
    updates: broadcast::Sender<StoreUpdate>,
    status: Arc<RwLock<PollerStatus>>,
    settings: PollerSettings,
}

impl Poller {
    pub fn new(
        source: Arc<dyn SampleSource>,
        normalizer: TimeNormalizer,
        store: SharedStore,
        updates: broadcast::Sender<StoreUpdate>,
        settings: PollerSettings,
    ) -> Self {
        Self {
            source,
            normalizer,
            store,
            updates,
            status: Arc::new(RwLock::new(PollerStatus::default())),
            settings,
        }
    }

    /// Shared status handle, for the health endpoint
    pub fn status_handle(&self) -> Arc<RwLock<PollerStatus>> {
        Arc::clone(&self.status)
    }

    /// Convert fetched records into samples, dropping unusable ones
    fn to_samples(&self, records: &[AttrValue]) -> (Vec<Sample>, usize) {
        let mut samples = Vec::with_capacity(records.len());
        let mut skipped = 0;

        for record in records {
            let Some(value) = record.value() else {
                tracing::warn!(attr_value = %record.attr_value, "Skipping non-numeric value");
                skipped += 1;
                continue;
            };

            match self.normalizer.normalize(&record.recv_time) {
                Ok(timestamp) => samples.push(Sample::new(timestamp, value)),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping sample with bad timestamp");
                    skipped += 1;
                }
            }
        }

        (samples, skipped)
    }

    /// Run one fetch-normalize-append cycle
    pub async fn tick(&self) -> TickOutcome {
        let records = self.source.latest(self.settings.last_n).await;
        let (samples, skipped) = self.to_samples(&records);

        let (appended, update) = if samples.is_empty() {
            (0, None)
        } else {
            let mut store = self.store.write().await;
            let appended = store.append(samples);
            let update = (appended > 0).then(|| StoreUpdate {
                version: store.version(),
                len: store.len(),
            });
            (appended, update)
        };

        if let Some(update) = update {
            // No receivers just means no page is open
            let _ = self.updates.send(update);
        }

        let outcome = TickOutcome {
            fetched: records.len(),
            appended,
            skipped,
        };

        {
            let mut status = self.status.write().await;
            status.ticks += 1;
            status.last_tick_at = Some(Utc::now());
            status.last_fetched = outcome.fetched;
            status.last_appended = outcome.appended;
            if outcome.appended == 0 {
                status.consecutive_empty += 1;
            } else {
                status.consecutive_empty = 0;
            }
        }

        tracing::debug!(
            fetched = outcome.fetched,
            appended = outcome.appended,
            skipped = outcome.skipped,
            "Tick complete"
        );

        outcome
    }

    /// Start the poll loop as a background task.
    ///
    /// The first tick fires immediately. Ticks run one after another in the
    /// spawned task, so they never overlap; a slow fetch delays the next tick.
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.settings.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            tracing::info!(
                interval_secs = self.settings.interval.as_secs(),
                last_n = self.settings.last_n,
                "Poller started"
            );

            loop {
                interval.tick().await;
                let outcome = self.tick().await;
                if outcome.appended > 0 {
                    tracing::info!(appended = outcome.appended, "Stored new luminosity samples");
                }
            }
        })
    }
}
