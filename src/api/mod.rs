//! Dashboard HTTP Server
//!
//! Axum server for the luminosity dashboard.
//!
//! ## Endpoints
//!
//! ### Page
//! - `GET /` - Chart page, refreshed over WebSocket with a polling fallback
//!
//! ### Series
//! - `GET /api/v1/figure` - Chart description (`{}` before the first samples)
//! - `GET /api/v1/series` - Stored samples and their mean (`?limit=N`)
//!
//! ### Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! ### WebSocket
//! - `GET /ws` - Figure pushes on every store update
//!
//! # Example
//!
//! ```rust,ignore
//! use luminosity_viewer::api::{serve, AppState};
//! use luminosity_viewer::config::DashboardConfig;
//!
//! let config = DashboardConfig::default();
//! let state = AppState::new(store, updates, poller.status_handle(), config.clone(), interval);
//! serve(state, &config).await?;
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

#[cfg(test)]
pub(crate) use state::test_state;

use axum::{http::Uri, routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::DashboardConfig;
use crate::websocket::websocket_handler;

/// Build the dashboard router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    build_router_shared(Arc::new(state))
}

fn build_router_shared(shared_state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/figure", get(routes::series::get_figure))
        .route("/series", get(routes::series::get_series));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    Router::new()
        .route("/", get(routes::dashboard::index))
        .route("/ws", get(websocket_handler))
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}

/// Start the dashboard server
pub async fn serve(state: AppState, config: &DashboardConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ApiError::Bind {
            addr: addr.clone(),
            source,
        })?;

    tracing::info!("Dashboard listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Dashboard shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{Sample, TimeNormalizer};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use chrono_tz::Europe::Lisbon;
    use tower::util::ServiceExt;

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn get(router: Router, uri: &str) -> axum::response::Response {
        router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn seed(state: &AppState, points: &[(&str, f64)]) {
        let normalizer = TimeNormalizer::new(Lisbon);
        state.store.write().await.append(
            points
                .iter()
                .map(|(ts, v)| Sample::new(normalizer.normalize(ts).unwrap(), *v)),
        );
    }

    #[tokio::test]
    async fn test_index_page() {
        let router = build_router_shared(test_state());
        let response = get(router, "/").await;
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Luminosity Data Viewer"));
        assert!(html.contains("luminosity-graph"));
    }

    #[tokio::test]
    async fn test_figure_empty_before_data() {
        let router = build_router_shared(test_state());
        let response = get(router, "/api/v1/figure").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_figure_with_data() {
        let state = test_state();
        seed(
            &state,
            &[("2024-01-01T10:00:00.000Z", 10.0), ("2024-01-01T10:00:10Z", 20.0)],
        )
        .await;

        let json = body_json(get(build_router_shared(state), "/api/v1/figure").await).await;
        assert_eq!(json["data"][0]["y"], serde_json::json!([10.0, 20.0]));
        assert_eq!(json["data"][1]["y"], serde_json::json!([15.0, 15.0]));
        assert_eq!(json["data"][1]["x"][0], "2024-01-01 10:00:00.000");
        assert_eq!(json["data"][1]["x"][1], "2024-01-01 10:00:10.000");
    }

    #[tokio::test]
    async fn test_series_endpoint() {
        let state = test_state();
        seed(
            &state,
            &[
                ("2024-01-01T10:00:00Z", 1.0),
                ("2024-01-01T10:00:10Z", 2.0),
                ("2024-01-01T10:00:20Z", 6.0),
            ],
        )
        .await;
        let router = build_router_shared(state);

        let json = body_json(get(router.clone(), "/api/v1/series").await).await;
        assert_eq!(json["count"], 3);
        assert_eq!(json["total"], 3);
        assert_eq!(json["mean"], 3.0);
        assert_eq!(json["samples"][0]["timestamp"], "2024-01-01T10:00:00.000+00:00");

        let json = body_json(get(router.clone(), "/api/v1/series?limit=2").await).await;
        assert_eq!(json["count"], 2);
        assert_eq!(json["total"], 3);
        assert_eq!(json["samples"][0]["value"], 2.0);

        let response = get(router, "/api/v1/series?limit=0").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_series_empty() {
        let json = body_json(get(build_router_shared(test_state()), "/api/v1/series").await).await;
        assert_eq!(json["count"], 0);
        assert!(json["mean"].is_null());
    }

    #[tokio::test]
    async fn test_health_routes() {
        let state = test_state();
        let router = build_router_shared(Arc::clone(&state));

        let response = get(router.clone(), "/health/live").await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = get(router.clone(), "/health/ready").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let json = body_json(get(router, "/health").await).await;
        assert_eq!(json["status"], "starting");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = get(build_router_shared(test_state()), "/api/v1/metrics").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert!(json["request_id"].is_string());
    }
}
