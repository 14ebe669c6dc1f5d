//! Batch ledger service: the canonical record of physical stock
//!
//! All mutations are single-statement conditional updates so that "quantity
//! never goes negative" holds across concurrent stateless instances; the
//! database is the sole synchronization point.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{Batch, BatchStatus};
use shared::validation::validate_batch_number;

/// Ledger service for batch-level stock operations
#[derive(Clone)]
pub struct BatchLedgerService {
    db: PgPool,
}

/// Raw batch row as stored
#[derive(Debug, FromRow)]
struct BatchRow {
    id: Uuid,
    medicine_id: Uuid,
    batch_number: String,
    quantity: i64,
    manufacturing_date: NaiveDate,
    expiry_date: NaiveDate,
    cost_price: Decimal,
    selling_price: Decimal,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BatchRow> for Batch {
    fn from(row: BatchRow) -> Self {
        let status = match row.status.as_str() {
            "disposed" => BatchStatus::Disposed,
            _ => BatchStatus::Active,
        };
        Batch {
            id: row.id,
            medicine_id: row.medicine_id,
            batch_number: row.batch_number,
            quantity: row.quantity,
            manufacturing_date: row.manufacturing_date,
            expiry_date: row.expiry_date,
            cost_price: row.cost_price,
            selling_price: row.selling_price,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const BATCH_COLUMNS: &str = "id, medicine_id, batch_number, quantity, manufacturing_date, \
     expiry_date, cost_price, selling_price, status, created_at, updated_at";

/// Input for receiving stock into the ledger
#[derive(Debug, Deserialize)]
pub struct ReceiveBatchInput {
    pub medicine_id: Uuid,
    pub batch_number: String,
    pub quantity: i64,
    pub manufacturing_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
}

/// A batch approaching expiry, joined with its medicine
#[derive(Debug, serde::Serialize, FromRow)]
pub struct ExpiringBatch {
    pub batch_id: Uuid,
    pub medicine_id: Uuid,
    pub medicine_name: String,
    pub batch_number: String,
    pub quantity: i64,
    pub expiry_date: NaiveDate,
    pub days_until_expiry: i64,
}

impl BatchLedgerService {
    /// Create a new BatchLedgerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Total on-hand quantity across all active batches of a medicine
    pub async fn total_stock(&self, medicine_id: Uuid) -> AppResult<i64> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM medicines WHERE id = $1)",
        )
        .bind(medicine_id)
        .fetch_one(&self.db)
        .await?;

        if !exists {
            return Err(AppError::NotFound("Medicine".to_string()));
        }

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(quantity), 0)::bigint
            FROM batches
            WHERE medicine_id = $1 AND status = 'active'
            "#,
        )
        .bind(medicine_id)
        .fetch_one(&self.db)
        .await?;

        Ok(total)
    }

    /// Receive stock: insert a batch or increment an existing one
    ///
    /// Keyed by (medicine, batch number); receiving the same batch number
    /// again adds to its quantity. Disposed batches cannot be revived.
    pub async fn receive(&self, input: ReceiveBatchInput) -> AppResult<Batch> {
        if input.quantity <= 0 {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: "Quantity must be positive".to_string(),
            });
        }
        if let Err(msg) = validate_batch_number(&input.batch_number) {
            return Err(AppError::Validation {
                field: "batch_number".to_string(),
                message: msg.to_string(),
            });
        }
        if input.manufacturing_date >= input.expiry_date {
            return Err(AppError::Validation {
                field: "expiry_date".to_string(),
                message: "Expiry date must be after manufacturing date".to_string(),
            });
        }

        let medicine_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM medicines WHERE id = $1 AND is_active = true)",
        )
        .bind(input.medicine_id)
        .fetch_one(&self.db)
        .await?;

        if !medicine_exists {
            return Err(AppError::NotFound("Medicine".to_string()));
        }

        let row = sqlx::query_as::<_, BatchRow>(&format!(
            r#"
            INSERT INTO batches (
                medicine_id, batch_number, quantity, manufacturing_date,
                expiry_date, cost_price, selling_price
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (medicine_id, batch_number) DO UPDATE
                SET quantity = batches.quantity + EXCLUDED.quantity,
                    updated_at = NOW()
                WHERE batches.status = 'active'
            RETURNING {BATCH_COLUMNS}
            "#
        ))
        .bind(input.medicine_id)
        .bind(input.batch_number.trim())
        .bind(input.quantity)
        .bind(input.manufacturing_date)
        .bind(input.expiry_date)
        .bind(input.cost_price)
        .bind(input.selling_price)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| {
            AppError::InvalidStateTransition(
                "Cannot receive stock into a disposed batch".to_string(),
            )
        })?;

        Ok(row.into())
    }

    /// Consume stock from a specific batch
    ///
    /// The decrement is conditional on `quantity >= n`, so concurrent
    /// consumers can never drive the quantity negative; losing the race
    /// surfaces as `InsufficientStock`.
    pub async fn consume(&self, batch_id: Uuid, quantity: i64) -> AppResult<Batch> {
        let mut conn = self.db.acquire().await?;
        Self::consume_in(&mut conn, batch_id, quantity).await
    }

    /// Batch consumption against an open connection or transaction
    ///
    /// The single entry point for pinned-batch decrements; callers composing
    /// a larger transaction (sales) get the same conditional update and the
    /// same not-found / disposed / insufficient distinction as `consume`.
    pub async fn consume_in(
        conn: &mut PgConnection,
        batch_id: Uuid,
        quantity: i64,
    ) -> AppResult<Batch> {
        if quantity <= 0 {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: "Quantity must be positive".to_string(),
            });
        }

        let updated = sqlx::query_as::<_, BatchRow>(&format!(
            r#"
            UPDATE batches
            SET quantity = quantity - $2, updated_at = NOW()
            WHERE id = $1 AND status = 'active' AND quantity >= $2
            RETURNING {BATCH_COLUMNS}
            "#
        ))
        .bind(batch_id)
        .bind(quantity)
        .fetch_optional(&mut *conn)
        .await?;

        match updated {
            Some(row) => Ok(row.into()),
            None => Err(Self::explain_consume_failure(conn, batch_id, quantity).await?),
        }
    }

    /// Distinguish not-found / disposed / insufficient after a missed update
    async fn explain_consume_failure(
        conn: &mut PgConnection,
        batch_id: Uuid,
        requested: i64,
    ) -> AppResult<AppError> {
        let row = sqlx::query_as::<_, (String, i64)>(
            "SELECT status, quantity FROM batches WHERE id = $1",
        )
        .bind(batch_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(match row {
            None => AppError::NotFound("Batch".to_string()),
            Some((status, _)) if status == "disposed" => AppError::InvalidStateTransition(
                "Cannot consume from a disposed batch".to_string(),
            ),
            Some((_, available)) => AppError::InsufficientStock(format!(
                "Requested {} units but only {} on hand",
                requested, available
            )),
        })
    }

    /// Allocate `quantity` units of a medicine across batches under FEFO
    ///
    /// Runs in its own transaction; rolls back and reports
    /// `InsufficientStock` when the combined active stock cannot cover the
    /// request, so partial consumption never leaks.
    pub async fn allocate_fefo(
        &self,
        medicine_id: Uuid,
        quantity: i64,
    ) -> AppResult<Vec<(Batch, i64)>> {
        let mut tx = self.db.begin().await?;
        let allocations = Self::allocate_fefo_in(&mut tx, medicine_id, quantity).await?;
        tx.commit().await?;
        Ok(allocations)
    }

    /// FEFO allocation against an open transaction
    ///
    /// Each step locks the earliest-expiring batch with stock on hand (ties
    /// broken by insertion order), drains it as far as needed, and moves on.
    pub async fn allocate_fefo_in(
        conn: &mut PgConnection,
        medicine_id: Uuid,
        quantity: i64,
    ) -> AppResult<Vec<(Batch, i64)>> {
        if quantity <= 0 {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: "Quantity must be positive".to_string(),
            });
        }

        let mut remaining = quantity;
        let mut allocations: Vec<(Batch, i64)> = Vec::new();

        while remaining > 0 {
            let candidate = sqlx::query_as::<_, BatchRow>(&format!(
                r#"
                SELECT {BATCH_COLUMNS}
                FROM batches
                WHERE medicine_id = $1 AND status = 'active' AND quantity > 0
                ORDER BY expiry_date ASC, created_at ASC
                LIMIT 1
                FOR UPDATE
                "#
            ))
            .bind(medicine_id)
            .fetch_optional(&mut *conn)
            .await?;

            let Some(batch) = candidate else {
                return Err(AppError::InsufficientStock(format!(
                    "Requested {} units but only {} available across batches",
                    quantity,
                    quantity - remaining
                )));
            };

            let take = remaining.min(batch.quantity);
            let updated = sqlx::query_as::<_, BatchRow>(&format!(
                r#"
                UPDATE batches
                SET quantity = quantity - $2, updated_at = NOW()
                WHERE id = $1 AND quantity >= $2
                RETURNING {BATCH_COLUMNS}
                "#
            ))
            .bind(batch.id)
            .bind(take)
            .fetch_one(&mut *conn)
            .await?;

            remaining -= take;
            allocations.push((updated.into(), take));
        }

        Ok(allocations)
    }

    /// Dispose a batch: quantity to zero, status to disposed
    ///
    /// Irreversible; disposed batches drop out of FEFO candidate selection
    /// and stock totals but are retained for audit history.
    pub async fn dispose(&self, batch_id: Uuid) -> AppResult<Batch> {
        let updated = sqlx::query_as::<_, BatchRow>(&format!(
            r#"
            UPDATE batches
            SET quantity = 0, status = 'disposed', updated_at = NOW()
            WHERE id = $1 AND status = 'active'
            RETURNING {BATCH_COLUMNS}
            "#
        ))
        .bind(batch_id)
        .fetch_optional(&self.db)
        .await?;

        match updated {
            Some(row) => Ok(row.into()),
            None => {
                let exists = sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS(SELECT 1 FROM batches WHERE id = $1)",
                )
                .bind(batch_id)
                .fetch_one(&self.db)
                .await?;
                if exists {
                    Err(AppError::InvalidStateTransition(
                        "Batch is already disposed".to_string(),
                    ))
                } else {
                    Err(AppError::NotFound("Batch".to_string()))
                }
            }
        }
    }

    /// List batches of a medicine, FEFO-ordered
    pub async fn list_batches(&self, medicine_id: Uuid) -> AppResult<Vec<Batch>> {
        let rows = sqlx::query_as::<_, BatchRow>(&format!(
            r#"
            SELECT {BATCH_COLUMNS}
            FROM batches
            WHERE medicine_id = $1
            ORDER BY expiry_date ASC, created_at ASC
            "#
        ))
        .bind(medicine_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a batch by id
    pub async fn get_batch(&self, batch_id: Uuid) -> AppResult<Batch> {
        let row = sqlx::query_as::<_, BatchRow>(&format!(
            "SELECT {BATCH_COLUMNS} FROM batches WHERE id = $1"
        ))
        .bind(batch_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;

        Ok(row.into())
    }

    /// Active batches with stock expiring within `within_days` of today
    pub async fn expiring_batches(&self, within_days: i64) -> AppResult<Vec<ExpiringBatch>> {
        let rows = sqlx::query_as::<_, ExpiringBatch>(
            r#"
            SELECT b.id as batch_id, b.medicine_id, m.name as medicine_name,
                   b.batch_number, b.quantity, b.expiry_date,
                   (b.expiry_date - CURRENT_DATE)::bigint as days_until_expiry
            FROM batches b
            JOIN medicines m ON m.id = b.medicine_id
            WHERE b.status = 'active'
              AND b.quantity > 0
              AND b.expiry_date <= CURRENT_DATE + $1::int
            ORDER BY b.expiry_date ASC
            "#,
        )
        .bind(within_days as i32)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }
}
