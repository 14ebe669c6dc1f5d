//! HTTP handlers for catalog endpoints (medicines, categories, suppliers)

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::catalog::{
    CatalogService, CreateCategoryInput, CreateMedicineInput, CreateSupplierInput,
    MedicineWithStock, UpdateMedicineInput,
};
use crate::AppState;
use shared::models::{Category, Medicine, Supplier};

/// Create a medicine
pub async fn create_medicine(
    State(state): State<AppState>,
    Json(input): Json<CreateMedicineInput>,
) -> AppResult<Json<Medicine>> {
    let service = CatalogService::new(state.db);
    let medicine = service.create_medicine(input).await?;
    Ok(Json(medicine))
}

/// List active medicines with current stock
pub async fn list_medicines(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<MedicineWithStock>>> {
    let service = CatalogService::new(state.db);
    let medicines = service.list_medicines().await?;
    Ok(Json(medicines))
}

/// Get a medicine by id
pub async fn get_medicine(
    State(state): State<AppState>,
    Path(medicine_id): Path<Uuid>,
) -> AppResult<Json<Medicine>> {
    let service = CatalogService::new(state.db);
    let medicine = service.get_medicine(medicine_id).await?;
    Ok(Json(medicine))
}

/// Update a medicine
pub async fn update_medicine(
    State(state): State<AppState>,
    Path(medicine_id): Path<Uuid>,
    Json(input): Json<UpdateMedicineInput>,
) -> AppResult<Json<Medicine>> {
    let service = CatalogService::new(state.db);
    let medicine = service.update_medicine(medicine_id, input).await?;
    Ok(Json(medicine))
}

/// Deactivate a medicine (soft delete)
pub async fn deactivate_medicine(
    State(state): State<AppState>,
    Path(medicine_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = CatalogService::new(state.db);
    service.deactivate_medicine(medicine_id).await?;
    Ok(Json(()))
}

/// List categories
pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<Category>>> {
    let service = CatalogService::new(state.db);
    let categories = service.list_categories().await?;
    Ok(Json(categories))
}

/// Create a category
pub async fn create_category(
    State(state): State<AppState>,
    Json(input): Json<CreateCategoryInput>,
) -> AppResult<Json<Category>> {
    let service = CatalogService::new(state.db);
    let category = service.create_category(input).await?;
    Ok(Json(category))
}

/// List suppliers
pub async fn list_suppliers(State(state): State<AppState>) -> AppResult<Json<Vec<Supplier>>> {
    let service = CatalogService::new(state.db);
    let suppliers = service.list_suppliers().await?;
    Ok(Json(suppliers))
}

/// Create a supplier
pub async fn create_supplier(
    State(state): State<AppState>,
    Json(input): Json<CreateSupplierInput>,
) -> AppResult<Json<Supplier>> {
    let service = CatalogService::new(state.db);
    let supplier = service.create_supplier(input).await?;
    Ok(Json(supplier))
}
