//! Dashboard Page
//!
//! - GET / - The single chart page

use askama::Template;
use axum::{extract::State, response::Html};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

/// Chart page; `templates/index.html`
#[derive(Template)]
#[template(path = "index.html")]
struct DashboardPage<'a> {
    title: &'a str,
    refresh_ms: u128,
}

/// GET /
pub async fn index(State(state): State<Arc<AppState>>) -> ApiResult<Html<String>> {
    let page = DashboardPage {
        title: &state.config.title,
        refresh_ms: state.refresh_interval.as_millis(),
    };
    page.render()
        .map(Html)
        .map_err(|e| ApiError::Internal(format!("Failed to render dashboard: {}", e)))
}
