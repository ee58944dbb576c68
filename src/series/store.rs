//! Series store
//!
//! Two parallel, insertion-ordered sequences (timestamps and values). The
//! store only grows, except when a `max_points` cap evicts the oldest
//! samples.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single luminosity reading in the display timezone
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Tz>,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Tz>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// How samples re-fetched by overlapping `lastN` windows are handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    /// Keep every fetched sample, duplicates included
    #[default]
    Append,
    /// Drop samples whose timestamp is already stored
    Dedupe,
}

/// Accumulated luminosity history
#[derive(Debug, Clone)]
pub struct SeriesStore {
    timestamps: Vec<DateTime<Tz>>,
    values: Vec<f64>,
    policy: OverlapPolicy,
    max_points: Option<usize>,
    /// Stored instants, maintained only under `OverlapPolicy::Dedupe`
    seen: HashSet<DateTime<Utc>>,
    version: u64,
}

impl SeriesStore {
    pub fn new(policy: OverlapPolicy, max_points: Option<usize>) -> Self {
        Self {
            timestamps: Vec::new(),
            values: Vec::new(),
            policy,
            max_points,
            seen: HashSet::new(),
            version: 0,
        }
    }

    /// Append samples in order, returning how many were stored.
    ///
    /// The version is bumped only when at least one sample was stored.
    pub fn append(&mut self, samples: impl IntoIterator<Item = Sample>) -> usize {
        let mut appended = 0;

        for sample in samples {
            if self.policy == OverlapPolicy::Dedupe
                && !self.seen.insert(sample.timestamp.with_timezone(&Utc))
            {
                continue;
            }
            self.timestamps.push(sample.timestamp);
            self.values.push(sample.value);
            appended += 1;
        }

        if appended > 0 {
            self.evict_overflow();
            self.version += 1;
        }

        appended
    }

    fn evict_overflow(&mut self) {
        let Some(max) = self.max_points else {
            return;
        };
        if self.timestamps.len() <= max {
            return;
        }

        let excess = self.timestamps.len() - max;
        let evicted: Vec<_> = self.timestamps.drain(..excess).collect();
        self.values.drain(..excess);

        if self.policy == OverlapPolicy::Dedupe {
            for ts in evicted {
                self.seen.remove(&ts.with_timezone(&Utc));
            }
        }

        tracing::debug!(evicted = excess, retained = max, "Evicted oldest samples");
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty() || self.values.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Tz>] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Samples in insertion order
    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        self.timestamps
            .iter()
            .zip(&self.values)
            .map(|(ts, v)| Sample::new(*ts, *v))
    }

    /// Arithmetic mean of every stored value
    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Tz>> {
        self.timestamps.first().copied()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Tz>> {
        self.timestamps.last().copied()
    }

    /// Incremented on every append that stored something
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn policy(&self) -> OverlapPolicy {
        self.policy
    }
}

impl Default for SeriesStore {
    fn default() -> Self {
        Self::new(OverlapPolicy::default(), None)
    }
}
