//! Alert service: derives stock and expiry alerts from ledger snapshots
//!
//! Classification lives in `shared::models::alert`; this service only feeds
//! it snapshots and optionally materializes the result for the notification
//! dispatcher. The alerts table is a cache, never the system of record.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppResult;
use shared::models::{expiry_severity, stock_severity, Alert, AlertType, StockSeverity};

/// Alert service over ledger snapshots
#[derive(Clone)]
pub struct AlertService {
    db: PgPool,
}

/// Per-medicine stock snapshot
#[derive(Debug, FromRow)]
struct StockSnapshotRow {
    medicine_id: Uuid,
    name: String,
    reorder_level: i64,
    current_stock: i64,
}

/// Per-batch expiry snapshot (active batches with stock only)
#[derive(Debug, FromRow)]
struct ExpirySnapshotRow {
    batch_id: Uuid,
    medicine_id: Uuid,
    name: String,
    batch_number: String,
    quantity: i64,
    days_until_expiry: i64,
}

/// A materialized alert row
#[derive(Debug, serde::Serialize, FromRow)]
pub struct AlertRecord {
    pub id: Uuid,
    pub alert_type: String,
    pub severity: String,
    pub medicine_id: Uuid,
    pub batch_id: Option<Uuid>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl AlertService {
    /// Create a new AlertService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Compute the current alert set from ledger state
    pub async fn generate(&self) -> AppResult<Vec<Alert>> {
        let mut alerts = self.stock_alerts().await?;
        alerts.extend(self.expiry_alerts().await?);
        Ok(alerts)
    }

    async fn stock_alerts(&self) -> AppResult<Vec<Alert>> {
        let rows = sqlx::query_as::<_, StockSnapshotRow>(
            r#"
            SELECT m.id as medicine_id, m.name, m.reorder_level,
                   COALESCE(SUM(b.quantity) FILTER (WHERE b.status = 'active'), 0)::bigint
                       as current_stock
            FROM medicines m
            LEFT JOIN batches b ON b.medicine_id = m.id
            WHERE m.is_active = true
            GROUP BY m.id, m.name, m.reorder_level
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let severity = stock_severity(row.current_stock, row.reorder_level)?;
                let message = match severity {
                    StockSeverity::OutOfStock => format!("{} is out of stock", row.name),
                    _ => format!(
                        "{} stock is low ({} of reorder level {})",
                        row.name, row.current_stock, row.reorder_level
                    ),
                };
                Some(Alert {
                    alert_type: AlertType::Stock,
                    severity: severity.as_str().to_string(),
                    medicine_id: row.medicine_id,
                    batch_id: None,
                    message,
                })
            })
            .collect())
    }

    async fn expiry_alerts(&self) -> AppResult<Vec<Alert>> {
        // Zero-quantity batches carry no value at risk and are excluded
        let rows = sqlx::query_as::<_, ExpirySnapshotRow>(
            r#"
            SELECT b.id as batch_id, b.medicine_id, m.name, b.batch_number, b.quantity,
                   (b.expiry_date - CURRENT_DATE)::bigint as days_until_expiry
            FROM batches b
            JOIN medicines m ON m.id = b.medicine_id
            WHERE b.status = 'active' AND b.quantity > 0
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let severity = expiry_severity(row.days_until_expiry)?;
                let message = if row.days_until_expiry < 0 {
                    format!(
                        "Batch {} of {} expired {} days ago ({} units)",
                        row.batch_number,
                        row.name,
                        -row.days_until_expiry,
                        row.quantity
                    )
                } else {
                    format!(
                        "Batch {} of {} expires in {} days ({} units)",
                        row.batch_number, row.name, row.days_until_expiry, row.quantity
                    )
                };
                Some(Alert {
                    alert_type: AlertType::Expiry,
                    severity: severity.as_str().to_string(),
                    medicine_id: row.medicine_id,
                    batch_id: Some(row.batch_id),
                    message,
                })
            })
            .collect())
    }

    /// Recompute and persist the alert set for notification delivery
    ///
    /// Replaces the previous materialization wholesale; the computed set is
    /// returned so callers can dispatch without re-reading.
    pub async fn refresh(&self) -> AppResult<Vec<Alert>> {
        let alerts = self.generate().await?;

        let mut tx = self.db.begin().await?;
        sqlx::query("DELETE FROM alerts").execute(&mut *tx).await?;
        for alert in &alerts {
            sqlx::query(
                r#"
                INSERT INTO alerts (alert_type, severity, medicine_id, batch_id, message)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(alert.alert_type.as_str())
            .bind(&alert.severity)
            .bind(alert.medicine_id)
            .bind(alert.batch_id)
            .bind(&alert.message)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        tracing::info!("Materialized {} alerts", alerts.len());
        Ok(alerts)
    }

    /// List the materialized alerts
    pub async fn list(&self) -> AppResult<Vec<AlertRecord>> {
        let rows = sqlx::query_as::<_, AlertRecord>(
            r#"
            SELECT id, alert_type, severity, medicine_id, batch_id, message, created_at
            FROM alerts
            ORDER BY created_at DESC, severity ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }
}
