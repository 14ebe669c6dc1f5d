//! Batch models and First-Expired-First-Out ordering

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

/// A received lot of a medicine with its own expiry and pricing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: Uuid,
    pub medicine_id: Uuid,
    /// Unique within a medicine, the idempotency key for imports
    pub batch_number: String,
    pub quantity: i64,
    pub manufacturing_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
    pub status: BatchStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle status of a batch
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Active,
    /// Destroyed stock; terminal, quantity pinned at zero
    Disposed,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Active => "active",
            BatchStatus::Disposed => "disposed",
        }
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Batch {
    /// Whole days until expiry relative to `today`; negative once expired
    pub fn days_until_expiry(&self, today: NaiveDate) -> i64 {
        (self.expiry_date - today).num_days()
    }

    /// Whether this batch may be consumed for a sale
    pub fn is_consumable(&self) -> bool {
        self.status == BatchStatus::Active && self.quantity > 0
    }
}

/// FEFO total order: earliest expiry first, insertion order breaking ties
pub fn fefo_order(a: &Batch, b: &Batch) -> Ordering {
    a.expiry_date
        .cmp(&b.expiry_date)
        .then(a.created_at.cmp(&b.created_at))
}

/// Select the next batch to consume from under FEFO
///
/// Only active batches with stock on hand are candidates; disposed and
/// depleted batches are skipped regardless of expiry.
pub fn select_fefo(batches: &[Batch]) -> Option<&Batch> {
    batches
        .iter()
        .filter(|b| b.is_consumable())
        .min_by(|a, b| fefo_order(a, b))
}

/// Plan a FEFO allocation of `quantity` units across `batches`
///
/// Returns `(batch_id, take)` pairs in consumption order, or `None` when the
/// combined consumable stock cannot cover the request.
pub fn plan_fefo_allocation(batches: &[Batch], quantity: i64) -> Option<Vec<(Uuid, i64)>> {
    if quantity <= 0 {
        return None;
    }

    let mut candidates: Vec<&Batch> = batches.iter().filter(|b| b.is_consumable()).collect();
    candidates.sort_by(|a, b| fefo_order(a, b));

    let mut remaining = quantity;
    let mut plan = Vec::new();
    for batch in candidates {
        if remaining == 0 {
            break;
        }
        let take = remaining.min(batch.quantity);
        plan.push((batch.id, take));
        remaining -= take;
    }

    if remaining == 0 {
        Some(plan)
    } else {
        None
    }
}
