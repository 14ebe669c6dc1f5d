//! Route definitions for the Pharmacy Inventory Management Platform

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Catalog
        .nest("/medicines", medicine_routes())
        .route(
            "/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/suppliers",
            get(handlers::list_suppliers).post(handlers::create_supplier),
        )
        // Batch ledger
        .nest("/inventory", inventory_routes())
        // Sales
        .route("/sales", get(handlers::list_sales).post(handlers::create_sale))
        .route("/sales/:sale_id", get(handlers::get_sale))
        // Bulk imports
        .route("/imports", post(handlers::import_rows))
        .route("/imports/csv", post(handlers::import_csv))
        // Alerts
        .nest("/alerts", alert_routes())
        // Analytics
        .nest("/analytics", analytics_routes())
}

/// Medicine catalog routes
fn medicine_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_medicines).post(handlers::create_medicine),
        )
        .route(
            "/:medicine_id",
            get(handlers::get_medicine)
                .put(handlers::update_medicine)
                .delete(handlers::deactivate_medicine),
        )
        .route("/:medicine_id/stock", get(handlers::get_medicine_stock))
        .route("/:medicine_id/batches", get(handlers::list_medicine_batches))
}

/// Batch ledger routes
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/batches", post(handlers::receive_batch))
        .route("/batches/:batch_id", get(handlers::get_batch))
        .route("/batches/:batch_id/consume", post(handlers::consume_batch))
        .route("/batches/:batch_id/dispose", post(handlers::dispose_batch))
        .route("/expiring", get(handlers::list_expiring_batches))
}

/// Alert routes
fn alert_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_alerts))
        .route("/generate", get(handlers::generate_alerts))
        .route("/refresh", post(handlers::refresh_alerts))
}

/// Analytics routes
fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/top-sellers.csv", get(handlers::export_top_sellers_csv))
}
