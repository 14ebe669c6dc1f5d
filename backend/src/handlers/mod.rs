//! HTTP handlers

pub mod alerts;
pub mod analytics;
pub mod catalog;
pub mod health;
pub mod imports;
pub mod inventory;
pub mod sales;

pub use alerts::*;
pub use analytics::*;
pub use catalog::*;
pub use health::*;
pub use imports::*;
pub use inventory::*;
pub use sales::*;
