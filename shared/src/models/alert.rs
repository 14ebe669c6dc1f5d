//! Alert models and severity classification
//!
//! Classification is a pair of total, stateless functions. Identical inputs
//! always yield identical severities, which is what lets alerts be
//! regenerated from ledger state on demand instead of stored as a source of
//! truth.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What an alert is about
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Stock,
    Expiry,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Stock => "stock",
            AlertType::Expiry => "expiry",
        }
    }
}

/// Severity of a stock-level alert
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StockSeverity {
    OutOfStock,
    Critical,
    Warning,
}

impl StockSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockSeverity::OutOfStock => "out-of-stock",
            StockSeverity::Critical => "critical",
            StockSeverity::Warning => "warning",
        }
    }
}

/// Severity of an expiry alert
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ExpirySeverity {
    Expired,
    Critical,
    Warning,
    Info,
}

impl ExpirySeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpirySeverity::Expired => "expired",
            ExpirySeverity::Critical => "critical",
            ExpirySeverity::Warning => "warning",
            ExpirySeverity::Info => "info",
        }
    }
}

/// A computed judgment over medicine/batch state
///
/// Derived, optionally materialized for notification delivery; always
/// regenerable from the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub alert_type: AlertType,
    pub severity: String,
    pub medicine_id: Uuid,
    pub batch_id: Option<Uuid>,
    pub message: String,
}

/// Classify stock level against the reorder threshold
///
/// - `out-of-stock` at zero
/// - `critical` below half the reorder level
/// - `warning` below the reorder level
/// - no alert otherwise
///
/// The half-threshold comparison is done as `2 * current < reorder` to stay
/// in integer arithmetic.
pub fn stock_severity(current_stock: i64, reorder_level: i64) -> Option<StockSeverity> {
    if current_stock == 0 {
        return Some(StockSeverity::OutOfStock);
    }
    if current_stock < 0 {
        // Cannot happen while the ledger invariant holds; classify as the
        // worst non-zero case rather than panic.
        return Some(StockSeverity::Critical);
    }
    if 2 * current_stock < reorder_level {
        Some(StockSeverity::Critical)
    } else if current_stock < reorder_level {
        Some(StockSeverity::Warning)
    } else {
        None
    }
}

/// Classify proximity to expiry from whole days remaining
///
/// `days_until_expiry` is `floor((expiry_date - today) / 1 day)`; callers
/// must already have excluded zero-quantity batches (no value at risk).
pub fn expiry_severity(days_until_expiry: i64) -> Option<ExpirySeverity> {
    if days_until_expiry < 0 {
        Some(ExpirySeverity::Expired)
    } else if days_until_expiry <= 7 {
        Some(ExpirySeverity::Critical)
    } else if days_until_expiry <= 30 {
        Some(ExpirySeverity::Warning)
    } else if days_until_expiry <= 90 {
        Some(ExpirySeverity::Info)
    } else {
        None
    }
}
