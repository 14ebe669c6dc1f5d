//! Medicine catalog models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A medicine in the catalog
///
/// Physical stock lives in [`crate::models::Batch`] rows; the medicine itself
/// carries identity and replenishment policy. Medicines referenced by batches
/// are never hard-deleted, only deactivated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medicine {
    pub id: Uuid,
    /// Unique stock keeping unit (e.g., "PCM-500-A3F2")
    pub sku: String,
    pub name: String,
    pub generic_name: Option<String>,
    pub category_id: Uuid,
    pub supplier_id: Option<Uuid>,
    /// Stock threshold below which replenishment alerts fire
    pub reorder_level: i64,
    pub requires_prescription: bool,
    pub barcode: Option<String>,
    /// Shelf/rack location in the pharmacy
    pub location: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A medicine category (e.g., "Antibiotics", "Analgesics")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    /// Display color for dashboard charts (hex)
    pub color: String,
    pub created_at: DateTime<Utc>,
}

/// A medicine supplier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
    pub id: Uuid,
    pub name: String,
    pub contact: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Name of the supplier used when an import row carries no resolvable supplier
pub const DEFAULT_SUPPLIER_NAME: &str = "General Supplier";

/// Default display color for auto-created categories
pub const DEFAULT_CATEGORY_COLOR: &str = "#6b7280";
