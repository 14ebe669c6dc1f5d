//! HTTP handlers for batch ledger endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::ledger::{BatchLedgerService, ExpiringBatch, ReceiveBatchInput};
use crate::AppState;
use shared::models::Batch;

/// Receive stock into the ledger
pub async fn receive_batch(
    State(state): State<AppState>,
    Json(input): Json<ReceiveBatchInput>,
) -> AppResult<Json<Batch>> {
    let service = BatchLedgerService::new(state.db);
    let batch = service.receive(input).await?;
    Ok(Json(batch))
}

/// List batches for a medicine, FEFO-ordered
pub async fn list_medicine_batches(
    State(state): State<AppState>,
    Path(medicine_id): Path<Uuid>,
) -> AppResult<Json<Vec<Batch>>> {
    let service = BatchLedgerService::new(state.db);
    let batches = service.list_batches(medicine_id).await?;
    Ok(Json(batches))
}

/// Get a batch by id
pub async fn get_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<Batch>> {
    let service = BatchLedgerService::new(state.db);
    let batch = service.get_batch(batch_id).await?;
    Ok(Json(batch))
}

#[derive(Debug, Deserialize)]
pub struct ConsumeInput {
    pub quantity: i64,
}

/// Consume stock from a specific batch
pub async fn consume_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
    Json(input): Json<ConsumeInput>,
) -> AppResult<Json<Batch>> {
    let service = BatchLedgerService::new(state.db);
    let batch = service.consume(batch_id, input.quantity).await?;
    Ok(Json(batch))
}

/// Dispose a batch (irreversible)
pub async fn dispose_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<Batch>> {
    let service = BatchLedgerService::new(state.db);
    let batch = service.dispose(batch_id).await?;
    Ok(Json(batch))
}

/// Total on-hand stock for a medicine
pub async fn get_medicine_stock(
    State(state): State<AppState>,
    Path(medicine_id): Path<Uuid>,
) -> AppResult<Json<StockResponse>> {
    let service = BatchLedgerService::new(state.db);
    let total = service.total_stock(medicine_id).await?;
    Ok(Json(StockResponse {
        medicine_id,
        current_stock: total,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ExpiringQuery {
    pub within_days: Option<i64>,
}

/// Batches expiring within a horizon (default 90 days)
pub async fn list_expiring_batches(
    State(state): State<AppState>,
    Query(query): Query<ExpiringQuery>,
) -> AppResult<Json<Vec<ExpiringBatch>>> {
    let service = BatchLedgerService::new(state.db);
    let batches = service.expiring_batches(query.within_days.unwrap_or(90)).await?;
    Ok(Json(batches))
}

/// Response for stock totals
#[derive(Debug, serde::Serialize)]
pub struct StockResponse {
    pub medicine_id: Uuid,
    pub current_stock: i64,
}
