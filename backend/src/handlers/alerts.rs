//! HTTP handlers for alert endpoints

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::services::alerts::{AlertRecord, AlertService};
use crate::AppState;
use shared::models::Alert;

/// List the materialized alerts
pub async fn list_alerts(State(state): State<AppState>) -> AppResult<Json<Vec<AlertRecord>>> {
    let service = AlertService::new(state.db);
    let alerts = service.list().await?;
    Ok(Json(alerts))
}

/// Compute the current alert set without persisting it
pub async fn generate_alerts(State(state): State<AppState>) -> AppResult<Json<Vec<Alert>>> {
    let service = AlertService::new(state.db);
    let alerts = service.generate().await?;
    Ok(Json(alerts))
}

/// Recompute and persist the alert set
pub async fn refresh_alerts(State(state): State<AppState>) -> AppResult<Json<Vec<Alert>>> {
    let service = AlertService::new(state.db);
    let alerts = service.refresh().await?;
    Ok(Json(alerts))
}
