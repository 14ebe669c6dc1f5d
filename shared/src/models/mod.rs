//! Domain models for the Pharmacy Inventory Management Platform

mod alert;
mod batch;
mod medicine;
mod sale;

pub use alert::*;
pub use batch::*;
pub use medicine::*;
pub use sale::*;
