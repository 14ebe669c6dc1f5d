//! Sales service: point-of-sale transactions against the batch ledger
//!
//! Consumption happens at sale time through the ledger, FEFO unless the
//! caller pins a batch, and the whole sale (stock decrements, sale row,
//! line items) commits in one transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::ledger::BatchLedgerService;
use shared::models::{PaymentMethod, Sale, SaleItem, SaleStatus};

/// Sales service
#[derive(Clone)]
pub struct SalesService {
    db: PgPool,
}

/// One requested sale line: either pinned to a batch or resolved by FEFO
#[derive(Debug, Deserialize)]
pub struct SaleLineInput {
    pub medicine_id: Option<Uuid>,
    pub batch_id: Option<Uuid>,
    pub quantity: i64,
}

/// Input for creating a sale
#[derive(Debug, Deserialize)]
pub struct CreateSaleInput {
    pub payment_method: PaymentMethod,
    pub status: Option<SaleStatus>,
    pub items: Vec<SaleLineInput>,
}

/// A sale with its line items
#[derive(Debug, serde::Serialize)]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

#[derive(Debug, FromRow)]
struct SaleRow {
    id: Uuid,
    total: Decimal,
    payment_method: String,
    status: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<SaleRow> for Sale {
    fn from(row: SaleRow) -> Self {
        let payment_method = match row.payment_method.as_str() {
            "card" => PaymentMethod::Card,
            "upi" => PaymentMethod::Upi,
            "credit" => PaymentMethod::Credit,
            _ => PaymentMethod::Cash,
        };
        // Legacy rows without a status read as completed
        let status = match row.status.as_deref() {
            Some("pending") => SaleStatus::Pending,
            Some("cancelled") => SaleStatus::Cancelled,
            _ => SaleStatus::Completed,
        };
        Sale {
            id: row.id,
            total: row.total,
            payment_method,
            status,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct SaleItemRow {
    id: Uuid,
    sale_id: Uuid,
    batch_id: Uuid,
    quantity: i64,
    unit_price: Decimal,
}

impl From<SaleItemRow> for SaleItem {
    fn from(row: SaleItemRow) -> Self {
        SaleItem {
            id: row.id,
            sale_id: row.sale_id,
            batch_id: row.batch_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
        }
    }
}

impl SalesService {
    /// Create a new SalesService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a sale, consuming stock through the ledger
    ///
    /// Unit prices are captured from each batch at this moment; catalog
    /// price edits never rewrite history. Any failure (including
    /// insufficient stock on any line) rolls the whole sale back.
    pub async fn create_sale(&self, input: CreateSaleInput) -> AppResult<SaleWithItems> {
        if input.items.is_empty() {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: "A sale needs at least one item".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        // (batch_id, quantity, unit_price) per consumed line
        let mut consumed: Vec<(Uuid, i64, Decimal)> = Vec::new();

        for line in &input.items {
            if line.quantity <= 0 {
                return Err(AppError::Validation {
                    field: "quantity".to_string(),
                    message: "Quantity must be positive".to_string(),
                });
            }

            match (line.batch_id, line.medicine_id) {
                // Caller pinned a batch; the ledger owns the decrement and
                // the not-found / disposed / insufficient distinction
                (Some(batch_id), _) => {
                    let batch =
                        BatchLedgerService::consume_in(&mut tx, batch_id, line.quantity).await?;
                    consumed.push((batch.id, line.quantity, batch.selling_price));
                }
                // Resolve by FEFO across the medicine's batches
                (None, Some(medicine_id)) => {
                    let allocations =
                        BatchLedgerService::allocate_fefo_in(&mut tx, medicine_id, line.quantity)
                            .await?;
                    for (batch, take) in allocations {
                        consumed.push((batch.id, take, batch.selling_price));
                    }
                }
                (None, None) => {
                    return Err(AppError::Validation {
                        field: "items".to_string(),
                        message: "Each item needs a medicine_id or batch_id".to_string(),
                    });
                }
            }
        }

        let total: Decimal = consumed
            .iter()
            .map(|(_, qty, price)| Decimal::from(*qty) * *price)
            .sum();
        let status = input.status.unwrap_or(SaleStatus::Completed);

        let sale_row = sqlx::query_as::<_, SaleRow>(
            r#"
            INSERT INTO sales (total, payment_method, status)
            VALUES ($1, $2, $3)
            RETURNING id, total, payment_method, status, created_at
            "#,
        )
        .bind(total)
        .bind(input.payment_method.as_str())
        .bind(status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(consumed.len());
        for (batch_id, quantity, unit_price) in &consumed {
            let item = sqlx::query_as::<_, SaleItemRow>(
                r#"
                INSERT INTO sale_items (sale_id, batch_id, quantity, unit_price)
                VALUES ($1, $2, $3, $4)
                RETURNING id, sale_id, batch_id, quantity, unit_price
                "#,
            )
            .bind(sale_row.id)
            .bind(batch_id)
            .bind(quantity)
            .bind(unit_price)
            .fetch_one(&mut *tx)
            .await?;
            items.push(item.into());
        }

        tx.commit().await?;

        Ok(SaleWithItems {
            sale: sale_row.into(),
            items,
        })
    }

    /// List recent sales, newest first
    pub async fn list_sales(&self, limit: i64) -> AppResult<Vec<Sale>> {
        let rows = sqlx::query_as::<_, SaleRow>(
            r#"
            SELECT id, total, payment_method, status, created_at
            FROM sales
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a sale with its items
    pub async fn get_sale(&self, sale_id: Uuid) -> AppResult<SaleWithItems> {
        let sale = sqlx::query_as::<_, SaleRow>(
            "SELECT id, total, payment_method, status, created_at FROM sales WHERE id = $1",
        )
        .bind(sale_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        let items = sqlx::query_as::<_, SaleItemRow>(
            r#"
            SELECT id, sale_id, batch_id, quantity, unit_price
            FROM sale_items
            WHERE sale_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.db)
        .await?;

        Ok(SaleWithItems {
            sale: sale.into(),
            items: items.into_iter().map(Into::into).collect(),
        })
    }
}
