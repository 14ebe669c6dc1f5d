//! Database models for the Pharmacy Inventory Management Platform
//!
//! Re-exports the domain models from the shared crate

pub use shared::models::*;
