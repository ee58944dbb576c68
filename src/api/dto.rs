//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::series::Sample;

// ============================================
// SERIES DTOs
// ============================================

/// Query parameters for GET /api/v1/series
#[derive(Debug, Default, Deserialize)]
pub struct SeriesQuery {
    /// Only return the most recent N samples
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Stored samples
#[derive(Debug, Serialize)]
pub struct SeriesResponse {
    /// Number of samples returned
    pub count: usize,
    /// Number of samples stored
    pub total: usize,
    /// Mean over every stored sample, not just the returned ones
    pub mean: Option<f64>,
    /// Samples in insertion order
    pub samples: Vec<SampleDto>,
}

/// Single sample in a series response
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SampleDto {
    /// RFC 3339 with the display timezone's offset
    pub timestamp: String,
    pub value: f64,
}

impl From<Sample> for SampleDto {
    fn from(sample: Sample) -> Self {
        Self {
            timestamp: sample.timestamp.to_rfc3339_opts(SecondsFormat::Millis, false),
            value: sample.value,
        }
    }
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health status
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy", "degraded" (recent ticks stored nothing) or "starting"
    pub status: String,
    pub samples: usize,
    pub ticks: u64,
    pub last_tick_at: Option<DateTime<Utc>>,
    pub consecutive_empty_ticks: u32,
    pub ws_connections: usize,
    pub uptime_seconds: u64,
    pub version: String,
}
