//! HTTP handlers for analytics endpoints

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use axum::Json;
use serde::Deserialize;

use crate::error::AppResult;
use crate::services::analytics::{AnalyticsService, DashboardMetrics};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub window_days: Option<i64>,
}

/// Full dashboard metrics over a trailing window
pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> AppResult<Json<DashboardMetrics>> {
    let window_days = query
        .window_days
        .unwrap_or(state.config.analytics.default_window_days);
    let service = AnalyticsService::new(state.db);
    let metrics = service
        .aggregate(window_days, state.config.analytics.top_sellers_limit)
        .await?;
    Ok(Json(metrics))
}

/// Export top sellers as CSV
pub async fn export_top_sellers_csv(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> AppResult<impl IntoResponse> {
    let window_days = query
        .window_days
        .unwrap_or(state.config.analytics.default_window_days);
    let service = AnalyticsService::new(state.db);
    let rows = service
        .top_sellers(window_days, state.config.analytics.top_sellers_limit)
        .await?;
    let csv_data = AnalyticsService::export_to_csv(&rows)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"top_sellers.csv\"",
            ),
        ],
        csv_data,
    ))
}
