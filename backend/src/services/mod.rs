//! Business logic services

pub mod alerts;
pub mod analytics;
pub mod catalog;
pub mod import;
pub mod ledger;
pub mod sales;

pub use alerts::AlertService;
pub use analytics::AnalyticsService;
pub use catalog::CatalogService;
pub use import::ImportService;
pub use ledger::BatchLedgerService;
pub use sales::SalesService;
