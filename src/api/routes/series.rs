//! Series Routes
//!
//! Read-only views of the accumulated luminosity series.
//!
//! - GET /api/v1/figure - Chart description for the current store
//! - GET /api/v1/series - Stored samples with their mean

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{SampleDto, SeriesQuery, SeriesResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::chart::{self, Figure};

/// GET /api/v1/figure
///
/// Render the store. `{}` until the first samples arrive.
pub async fn get_figure(State(state): State<Arc<AppState>>) -> Json<Figure> {
    let store = state.store.read().await;
    Json(chart::render(&store))
}

/// GET /api/v1/series
///
/// List stored samples, optionally only the most recent `limit`.
pub async fn get_series(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SeriesQuery>,
) -> ApiResult<Json<SeriesResponse>> {
    if query.limit == Some(0) {
        return Err(ApiError::Validation("limit must be at least 1".to_string()));
    }

    let store = state.store.read().await;
    let total = store.len();
    let skip = query
        .limit
        .map(|limit| total.saturating_sub(limit))
        .unwrap_or(0);

    let samples: Vec<SampleDto> = store.samples().skip(skip).map(SampleDto::from).collect();

    Ok(Json(SeriesResponse {
        count: samples.len(),
        total,
        mean: store.mean(),
        samples,
    }))
}
