//! HTTP handlers for bulk import endpoints

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::services::import::{ImportReport, ImportRow, ImportService};
use crate::AppState;

/// Reconcile structured rows (pre-parsed by the client)
pub async fn import_rows(
    State(state): State<AppState>,
    Json(rows): Json<Vec<ImportRow>>,
) -> AppResult<Json<ImportReport>> {
    let service = ImportService::new(state.db);
    let report = service.reconcile(rows).await?;
    Ok(Json(report))
}

/// Reconcile a raw CSV document
pub async fn import_csv(
    State(state): State<AppState>,
    body: String,
) -> AppResult<Json<ImportReport>> {
    let service = ImportService::new(state.db);
    let report = service.reconcile_csv(&body).await?;
    Ok(Json(report))
}
