//! HTTP handlers for sales endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::sales::{CreateSaleInput, SaleWithItems, SalesService};
use crate::AppState;
use shared::models::Sale;

/// Record a sale
pub async fn create_sale(
    State(state): State<AppState>,
    Json(input): Json<CreateSaleInput>,
) -> AppResult<Json<SaleWithItems>> {
    let service = SalesService::new(state.db);
    let sale = service.create_sale(input).await?;
    Ok(Json(sale))
}

#[derive(Debug, Deserialize)]
pub struct ListSalesQuery {
    pub limit: Option<i64>,
}

/// List recent sales
pub async fn list_sales(
    State(state): State<AppState>,
    Query(query): Query<ListSalesQuery>,
) -> AppResult<Json<Vec<Sale>>> {
    let service = SalesService::new(state.db);
    let sales = service.list_sales(query.limit.unwrap_or(100)).await?;
    Ok(Json(sales))
}

/// Get a sale with its items
pub async fn get_sale(
    State(state): State<AppState>,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<SaleWithItems>> {
    let service = SalesService::new(state.db);
    let sale = service.get_sale(sale_id).await?;
    Ok(Json(sale))
}
