//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (first tick has run)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// Ticks in a row without new samples before reporting "degraded"
const STALE_TICKS: u32 = 3;

/// GET /health/live
///
/// Kubernetes liveness probe.
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Kubernetes readiness probe.
/// Returns 200 once the poller has completed its first tick.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.poller_status.read().await.ticks > 0 {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health
///
/// Full health status. Upstream outages show up here as "degraded"; the
/// chart itself just stops moving.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let status = state.poller_status.read().await.clone();
    let samples = state.store.read().await.len();

    let overall_status = if status.ticks == 0 {
        "starting"
    } else if status.consecutive_empty >= STALE_TICKS {
        "degraded"
    } else {
        "healthy"
    };

    Json(HealthResponse {
        status: overall_status.to_string(),
        samples,
        ticks: status.ticks,
        last_tick_at: status.last_tick_at,
        consecutive_empty_ticks: status.consecutive_empty,
        ws_connections: state.ws_connection_count(),
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_state;

    #[tokio::test]
    async fn test_liveness() {
        let status = liveness().await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_readiness_waits_for_first_tick() {
        let state = test_state();
        assert_eq!(
            readiness(State(Arc::clone(&state))).await,
            StatusCode::SERVICE_UNAVAILABLE
        );

        state.poller_status.write().await.ticks = 1;
        assert_eq!(readiness(State(state)).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_full_health_degraded_after_empty_ticks() {
        let state = test_state();
        assert_eq!(full_health(State(Arc::clone(&state))).await.status, "starting");

        {
            let mut status = state.poller_status.write().await;
            status.ticks = 5;
            status.consecutive_empty = 1;
        }
        assert_eq!(full_health(State(Arc::clone(&state))).await.status, "healthy");

        state.poller_status.write().await.consecutive_empty = STALE_TICKS;
        let health = full_health(State(state)).await;
        assert_eq!(health.status, "degraded");
        assert_eq!(health.ticks, 5);
        assert_eq!(health.samples, 0);
    }
}
