//! Analytics aggregation service
//!
//! A read-side projection over the batch ledger and the sales log: calendar
//! revenue windows, inventory valuation, turnover, top sellers, and category
//! mix. Never mutates the ledger; the independent sub-queries run
//! concurrently and tolerate an empty store by returning zeroed structures.

use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::dates::{month_start, next_month_start, week_start};
use shared::models::{stock_severity, StockSeverity};

/// Aggregation windows accepted by the dashboard endpoint
pub const SUPPORTED_WINDOWS: [i64; 4] = [7, 30, 90, 365];

/// Analytics service
#[derive(Clone)]
pub struct AnalyticsService {
    db: PgPool,
}

/// Full dashboard payload
#[derive(Debug, Serialize)]
pub struct DashboardMetrics {
    pub window_days: i64,
    pub revenue: RevenueWindows,
    pub sales: SalesMetrics,
    pub inventory: InventoryMetrics,
    pub expiry: ExpiryMetrics,
    pub top_sellers: Vec<TopSeller>,
    pub category_breakdown: Vec<CategoryRevenue>,
}

/// Revenue over calendar-aligned windows (weeks start Monday)
#[derive(Debug, Default, Serialize)]
pub struct RevenueWindows {
    pub today: Decimal,
    pub yesterday: Decimal,
    pub this_week: Decimal,
    pub last_week: Decimal,
    pub this_month: Decimal,
    pub last_month: Decimal,
}

#[derive(Debug, Serialize)]
pub struct SalesMetrics {
    pub total_sales: i64,
    pub completed_sales: i64,
    /// Percentage; 100 when no status data is populated
    pub fulfillment_rate: Decimal,
}

#[derive(Debug, Serialize)]
pub struct InventoryMetrics {
    /// Sum of quantity x cost price across active batches
    pub total_value: Decimal,
    pub active_batches: i64,
    pub stock_out_count: i64,
    pub low_stock_count: i64,
    /// Annualized: trailing-30-day COGS x 12 over current inventory value.
    /// An estimate — current value stands in for average inventory because
    /// no historical snapshot series exists.
    pub turnover_rate: Decimal,
}

#[derive(Debug, Default, Serialize)]
pub struct ExpiryMetrics {
    pub expired_batches: i64,
    pub expiring_within_30_days: i64,
    pub expiring_within_90_days: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct TopSeller {
    pub medicine_id: Uuid,
    pub medicine_name: String,
    pub units_sold: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Serialize, FromRow)]
pub struct CategoryRevenue {
    pub category_id: Uuid,
    pub category_name: String,
    pub color: String,
    pub units_sold: i64,
    pub revenue: Decimal,
}

#[derive(Debug, FromRow)]
struct StockLevelRow {
    reorder_level: i64,
    current_stock: i64,
}

impl AnalyticsService {
    /// Create a new AnalyticsService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Compute the full dashboard for a trailing window
    pub async fn aggregate(&self, window_days: i64, top_n: i64) -> AppResult<DashboardMetrics> {
        if !SUPPORTED_WINDOWS.contains(&window_days) {
            return Err(AppError::Validation {
                field: "window_days".to_string(),
                message: format!("Window must be one of {:?} days", SUPPORTED_WINDOWS),
            });
        }

        let today = Utc::now().date_naive();
        let (revenue, sales, inventory, expiry, top_sellers, category_breakdown) = tokio::try_join!(
            self.revenue_windows(today),
            self.sales_metrics(window_days),
            self.inventory_metrics(),
            self.expiry_metrics(),
            self.top_sellers(window_days, top_n),
            self.category_breakdown(window_days),
        )?;

        Ok(DashboardMetrics {
            window_days,
            revenue,
            sales,
            inventory,
            expiry,
            top_sellers,
            category_breakdown,
        })
    }

    /// Revenue per calendar window around `today`
    async fn revenue_windows(&self, today: NaiveDate) -> AppResult<RevenueWindows> {
        let tomorrow = today + Days::new(1);
        let yesterday = today - Days::new(1);
        let this_week = week_start(today);
        let last_week = this_week - Days::new(7);
        let this_month = month_start(today);
        let next_month = next_month_start(today);
        let last_month = month_start(this_month - Days::new(1));

        Ok(RevenueWindows {
            today: self.revenue_between(today, tomorrow).await?,
            yesterday: self.revenue_between(yesterday, today).await?,
            this_week: self.revenue_between(this_week, this_week + Days::new(7)).await?,
            last_week: self.revenue_between(last_week, this_week).await?,
            this_month: self.revenue_between(this_month, next_month).await?,
            last_month: self.revenue_between(last_month, this_month).await?,
        })
    }

    /// Sum of sale totals in the half-open interval [start, end)
    async fn revenue_between(&self, start: NaiveDate, end: NaiveDate) -> AppResult<Decimal> {
        let total: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(total), 0)
            FROM sales
            WHERE created_at >= $1 AND created_at < $2
            "#,
        )
        .bind(day_start(start))
        .bind(day_start(end))
        .fetch_one(&self.db)
        .await?;
        Ok(total)
    }

    async fn sales_metrics(&self, window_days: i64) -> AppResult<SalesMetrics> {
        let (total, completed, with_status): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE status = 'completed'),
                   COUNT(*) FILTER (WHERE status IS NOT NULL)
            FROM sales
            WHERE created_at >= NOW() - ($1::bigint || ' days')::interval
            "#,
        )
        .bind(window_days)
        .fetch_one(&self.db)
        .await?;

        // Completed over all sales in the window. Absence of status data
        // must not read as failure, so an entirely status-less window (or an
        // empty one) reports 100.
        let fulfillment_rate = if with_status == 0 || total == 0 {
            Decimal::from(100)
        } else {
            Decimal::from(completed) * Decimal::from(100) / Decimal::from(total)
        };

        Ok(SalesMetrics {
            total_sales: total,
            completed_sales: completed,
            fulfillment_rate,
        })
    }

    async fn inventory_metrics(&self) -> AppResult<InventoryMetrics> {
        let (total_value, active_batches): (Decimal, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(quantity * cost_price), 0), COUNT(*)
            FROM batches
            WHERE status = 'active'
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        // Stock-out/low-stock counts go through the alert classifier rather
        // than re-encoding the thresholds in SQL.
        let levels = sqlx::query_as::<_, StockLevelRow>(
            r#"
            SELECT m.reorder_level,
                   COALESCE(SUM(b.quantity) FILTER (WHERE b.status = 'active'), 0)::bigint
                       as current_stock
            FROM medicines m
            LEFT JOIN batches b ON b.medicine_id = m.id
            WHERE m.is_active = true
            GROUP BY m.id, m.reorder_level
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let mut stock_out_count = 0;
        let mut low_stock_count = 0;
        for row in &levels {
            match stock_severity(row.current_stock, row.reorder_level) {
                Some(StockSeverity::OutOfStock) => stock_out_count += 1,
                Some(_) => low_stock_count += 1,
                None => {}
            }
        }

        let turnover_rate = self.turnover_rate(total_value).await?;

        Ok(InventoryMetrics {
            total_value,
            active_batches,
            stock_out_count,
            low_stock_count,
            turnover_rate,
        })
    }

    /// Annualized turnover from trailing-30-day cost of goods sold
    async fn turnover_rate(&self, inventory_value: Decimal) -> AppResult<Decimal> {
        if inventory_value == Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }

        let cogs_30d: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(si.quantity * b.cost_price), 0)
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            JOIN batches b ON b.id = si.batch_id
            WHERE s.created_at >= NOW() - INTERVAL '30 days'
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        Ok(cogs_30d * Decimal::from(12) / inventory_value)
    }

    async fn expiry_metrics(&self) -> AppResult<ExpiryMetrics> {
        let days: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT (expiry_date - CURRENT_DATE)::bigint
            FROM batches
            WHERE status = 'active' AND quantity > 0
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let mut metrics = ExpiryMetrics::default();
        for d in days {
            match shared::models::expiry_severity(d) {
                Some(shared::models::ExpirySeverity::Expired) => metrics.expired_batches += 1,
                Some(
                    shared::models::ExpirySeverity::Critical
                    | shared::models::ExpirySeverity::Warning,
                ) => {
                    metrics.expiring_within_30_days += 1;
                    metrics.expiring_within_90_days += 1;
                }
                Some(shared::models::ExpirySeverity::Info) => {
                    metrics.expiring_within_90_days += 1
                }
                None => {}
            }
        }
        Ok(metrics)
    }

    /// Best-selling medicines over the trailing window, by revenue
    pub async fn top_sellers(&self, window_days: i64, limit: i64) -> AppResult<Vec<TopSeller>> {
        let rows = sqlx::query_as::<_, TopSeller>(
            r#"
            SELECT m.id as medicine_id, m.name as medicine_name,
                   COALESCE(SUM(si.quantity), 0)::bigint as units_sold,
                   COALESCE(SUM(si.quantity * si.unit_price), 0) as revenue
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            JOIN batches b ON b.id = si.batch_id
            JOIN medicines m ON m.id = b.medicine_id
            WHERE s.created_at >= NOW() - ($1::bigint || ' days')::interval
            GROUP BY m.id, m.name
            ORDER BY revenue DESC
            LIMIT $2
            "#,
        )
        .bind(window_days)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Revenue mix per category over the trailing window
    async fn category_breakdown(&self, window_days: i64) -> AppResult<Vec<CategoryRevenue>> {
        let rows = sqlx::query_as::<_, CategoryRevenue>(
            r#"
            SELECT c.id as category_id, c.name as category_name, c.color,
                   COALESCE(SUM(si.quantity), 0)::bigint as units_sold,
                   COALESCE(SUM(si.quantity * si.unit_price), 0) as revenue
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            JOIN batches b ON b.id = si.batch_id
            JOIN medicines m ON m.id = b.medicine_id
            JOIN categories c ON c.id = m.category_id
            WHERE s.created_at >= NOW() - ($1::bigint || ' days')::interval
            GROUP BY c.id, c.name, c.color
            ORDER BY revenue DESC
            "#,
        )
        .bind(window_days)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Export report data as CSV
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record).map_err(|e| {
                crate::error::AppError::Internal(format!("CSV serialization error: {}", e))
            })?;
        }
        let csv_data = String::from_utf8(wtr.into_inner().map_err(|e| {
            crate::error::AppError::Internal(format!("CSV writer error: {}", e))
        })?)
        .map_err(|e| crate::error::AppError::Internal(format!("UTF-8 conversion error: {}", e)))?;
        Ok(csv_data)
    }
}

/// Midnight UTC at the start of a calendar day
fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or_else(Utc::now)
}
