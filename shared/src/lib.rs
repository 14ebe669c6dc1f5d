//! Shared types and models for the Pharmacy Inventory Management Platform
//!
//! This crate holds the domain model plus the pure rules of the inventory
//! engine (alert classification, FEFO ordering, tolerant date handling) so
//! the backend services and importers never disagree on them.

pub mod dates;
pub mod models;
pub mod validation;

pub use dates::*;
pub use models::*;
pub use validation::*;
