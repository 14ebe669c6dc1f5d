//! Import reconciliation service
//!
//! Ingests externally supplied medicine/batch rows (spreadsheet exports,
//! delimited text) and merges them into the ledger without duplicating
//! records. The whole import is partially tolerant: bad rows are skipped and
//! counted, never fatal; only store-level failures abort. Re-running the
//! same file is idempotent through the SKU and (medicine, batch number)
//! keys.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::AppResult;
use shared::dates::{normalize_date_pair, parse_flexible_date};
use shared::models::{DEFAULT_CATEGORY_COLOR, DEFAULT_SUPPLIER_NAME};
use shared::validation::{generate_sku, normalize_barcode};

/// Import reconciliation service
#[derive(Clone)]
pub struct ImportService {
    db: PgPool,
}

/// One tabular row from an external source, converted once at the boundary
///
/// Every field is optional text; the reconciler owns all parsing and
/// recovery so malformed cells degrade row by row instead of failing the
/// file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportRow {
    #[serde(alias = "Medicine Name")]
    pub medicine_name: Option<String>,
    #[serde(alias = "SKU")]
    pub sku: Option<String>,
    #[serde(alias = "Category")]
    pub category: Option<String>,
    #[serde(alias = "Batch Number")]
    pub batch_number: Option<String>,
    #[serde(alias = "Quantity")]
    pub quantity: Option<String>,
    #[serde(alias = "Expiry Date")]
    pub expiry_date: Option<String>,
    #[serde(alias = "Manufacturing Date")]
    pub manufacturing_date: Option<String>,
    #[serde(alias = "Selling Price")]
    pub selling_price: Option<String>,
    #[serde(alias = "Cost Price")]
    pub cost_price: Option<String>,
    #[serde(alias = "Generic Name")]
    pub generic_name: Option<String>,
    #[serde(alias = "Manufacturer")]
    pub manufacturer: Option<String>,
    #[serde(alias = "Supplier")]
    pub supplier: Option<String>,
    #[serde(alias = "Location")]
    pub location: Option<String>,
    #[serde(alias = "Barcode")]
    pub barcode: Option<String>,
    #[serde(alias = "Requires Prescription")]
    pub requires_prescription: Option<String>,
    #[serde(alias = "Notes")]
    pub notes: Option<String>,
}

/// Outcome of a reconciliation run
#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub medicines_created: u64,
    pub batches_created: u64,
    pub categories_created: u64,
    /// Rows resolved to already-existing batches (idempotent re-import)
    pub skipped: u64,
    pub errors: Vec<ImportRowError>,
}

/// A non-fatal per-row problem
#[derive(Debug, Serialize)]
pub struct ImportRowError {
    /// 1-based row number in the source
    pub row: usize,
    pub message: String,
}

/// Batch number assigned when the source omits one; stable so re-imports of
/// the same file still merge
const FALLBACK_BATCH_NUMBER: &str = "IMPORT";

const DEFAULT_REORDER_LEVEL: i64 = 10;

impl ImportService {
    /// Create a new ImportService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Reconcile a CSV document (named columns per the import template)
    pub async fn reconcile_csv(&self, content: &str) -> AppResult<ImportReport> {
        let (rows, parse_errors) = collect_rows(content);
        self.reconcile_numbered(rows, parse_errors).await
    }

    /// Merge tabular rows into the ledger, auto-provisioning references
    ///
    /// Never fails on individual rows; a store-level failure aborts the
    /// remainder (already-committed rows stay, and a re-run is safe).
    pub async fn reconcile(&self, rows: Vec<ImportRow>) -> AppResult<ImportReport> {
        let numbered = rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| (index + 1, row))
            .collect();
        self.reconcile_numbered(numbered, Vec::new()).await
    }

    /// Reconciliation core over rows that carry their source row numbers
    ///
    /// Parse errors and per-row errors share that numbering, so a report
    /// entry always points at the right line of the source file.
    async fn reconcile_numbered(
        &self,
        rows: Vec<(usize, ImportRow)>,
        parse_errors: Vec<ImportRowError>,
    ) -> AppResult<ImportReport> {
        let mut report = ImportReport {
            errors: parse_errors,
            ..ImportReport::default()
        };
        let today = Utc::now().date_naive();

        // Pre-scan: bulk-create categories missing from the existing set so
        // per-row processing only does lookups.
        let mut categories = self.load_categories().await?;
        let wanted: Vec<String> = rows
            .iter()
            .filter_map(|(_, r)| r.category.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .filter(|name| !categories.contains_key(&name.to_lowercase()))
            .map(str::to_string)
            .collect();
        report.categories_created = self.create_categories(&wanted, &mut categories).await?;

        let suppliers = self.load_suppliers().await?;
        let default_supplier = self.ensure_default_supplier().await?;

        for (row_number, row) in &rows {
            let row_number = *row_number;

            let Some(name) = row.medicine_name.as_deref().map(str::trim).filter(|n| !n.is_empty())
            else {
                report.errors.push(ImportRowError {
                    row: row_number,
                    message: "Missing medicine name".to_string(),
                });
                continue;
            };

            let category_id = row
                .category
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .and_then(|c| categories.get(&c.to_lowercase()).copied());
            let Some(category_id) = category_id else {
                report.errors.push(ImportRowError {
                    row: row_number,
                    message: format!("Unresolvable category for '{}'", name),
                });
                continue;
            };

            let supplier_id = row
                .supplier
                .as_deref()
                .or(row.manufacturer.as_deref())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .and_then(|s| suppliers.get(&s.to_lowercase()).copied())
                .unwrap_or(default_supplier);

            match self
                .upsert_row(row, name, category_id, supplier_id, today)
                .await
            {
                Ok(outcome) => {
                    if outcome.medicine_created {
                        report.medicines_created += 1;
                    }
                    if outcome.batch_created {
                        report.batches_created += 1;
                    } else {
                        report.skipped += 1;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        report.errors.sort_by_key(|e| e.row);
        tracing::info!(
            "Import reconciled: {} medicines, {} batches created, {} skipped, {} errors",
            report.medicines_created,
            report.batches_created,
            report.skipped,
            report.errors.len()
        );
        Ok(report)
    }

    async fn load_categories(&self) -> AppResult<HashMap<String, Uuid>> {
        let rows = sqlx::query_as::<_, (Uuid, String)>("SELECT id, name FROM categories")
            .fetch_all(&self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(id, name)| (name.to_lowercase(), id))
            .collect())
    }

    async fn create_categories(
        &self,
        names: &[String],
        categories: &mut HashMap<String, Uuid>,
    ) -> AppResult<u64> {
        let mut created = 0;
        for name in names {
            if categories.contains_key(&name.to_lowercase()) {
                continue;
            }
            let inserted = sqlx::query_scalar::<_, Uuid>(
                r#"
                INSERT INTO categories (name, color)
                VALUES ($1, $2)
                ON CONFLICT (name) DO NOTHING
                RETURNING id
                "#,
            )
            .bind(name)
            .bind(DEFAULT_CATEGORY_COLOR)
            .fetch_optional(&self.db)
            .await?;

            let id = match inserted {
                Some(id) => {
                    created += 1;
                    id
                }
                // Lost a race with a concurrent import; use the winner's row
                None => {
                    sqlx::query_scalar::<_, Uuid>("SELECT id FROM categories WHERE name = $1")
                        .bind(name)
                        .fetch_one(&self.db)
                        .await?
                }
            };
            categories.insert(name.to_lowercase(), id);
        }
        Ok(created)
    }

    async fn load_suppliers(&self) -> AppResult<HashMap<String, Uuid>> {
        let rows = sqlx::query_as::<_, (Uuid, String)>("SELECT id, name FROM suppliers")
            .fetch_all(&self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(id, name)| (name.to_lowercase(), id))
            .collect())
    }

    async fn ensure_default_supplier(&self) -> AppResult<Uuid> {
        let existing = sqlx::query_scalar::<_, Uuid>("SELECT id FROM suppliers WHERE name = $1")
            .bind(DEFAULT_SUPPLIER_NAME)
            .fetch_optional(&self.db)
            .await?;
        if let Some(id) = existing {
            return Ok(id);
        }

        let inserted = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO suppliers (name)
            VALUES ($1)
            ON CONFLICT (name) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(DEFAULT_SUPPLIER_NAME)
        .fetch_optional(&self.db)
        .await?;
        match inserted {
            Some(id) => Ok(id),
            None => Ok(
                sqlx::query_scalar::<_, Uuid>("SELECT id FROM suppliers WHERE name = $1")
                    .bind(DEFAULT_SUPPLIER_NAME)
                    .fetch_one(&self.db)
                    .await?,
            ),
        }
    }

    async fn upsert_row(
        &self,
        row: &ImportRow,
        name: &str,
        category_id: Uuid,
        supplier_id: Uuid,
        today: NaiveDate,
    ) -> AppResult<RowOutcome> {
        let sku = row
            .sku
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_ascii_uppercase())
            .unwrap_or_else(|| generate_sku(name));

        // Spreadsheet tools mangle long numeric barcodes into scientific
        // notation; those are malformed, not data.
        let barcode = row.barcode.as_deref().and_then(normalize_barcode);
        if row.barcode.is_some() && barcode.is_none() {
            tracing::debug!("Discarded malformed barcode for '{}'", name);
        }

        let requires_prescription = row
            .requires_prescription
            .as_deref()
            .map(parse_flag)
            .unwrap_or(false);

        let (medicine_id, medicine_created) = self
            .resolve_medicine(
                &sku,
                name,
                row,
                category_id,
                supplier_id,
                barcode,
                requires_prescription,
            )
            .await?;

        let manufacturing = row
            .manufacturing_date
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| parse_flexible_date(s, today));
        let expiry = row
            .expiry_date
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| parse_flexible_date(s, today));
        let (manufacturing_date, expiry_date) = normalize_date_pair(manufacturing, expiry, today);
        if matches!((manufacturing, expiry), (Some(m), Some(e)) if m >= e) {
            tracing::warn!(
                "Manufacturing date on or after expiry for '{}'; dates reset",
                name
            );
        }

        let quantity = row
            .quantity
            .as_deref()
            .and_then(parse_quantity)
            .unwrap_or(0);
        let cost_price = row.cost_price.as_deref().and_then(parse_money).unwrap_or(Decimal::ZERO);
        let selling_price = row
            .selling_price
            .as_deref()
            .and_then(parse_money)
            .unwrap_or(Decimal::ZERO);

        let batch_number = row
            .batch_number
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .unwrap_or(FALLBACK_BATCH_NUMBER);

        // Idempotency key: re-imports of the same (medicine, batch number)
        // must not create duplicate stock.
        let inserted = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO batches (
                medicine_id, batch_number, quantity, manufacturing_date,
                expiry_date, cost_price, selling_price
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (medicine_id, batch_number) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(medicine_id)
        .bind(batch_number)
        .bind(quantity)
        .bind(manufacturing_date)
        .bind(expiry_date)
        .bind(cost_price)
        .bind(selling_price)
        .fetch_optional(&self.db)
        .await?;

        Ok(RowOutcome {
            medicine_created,
            batch_created: inserted.is_some(),
        })
    }

    #[allow(clippy::too_many_arguments)]
    async fn resolve_medicine(
        &self,
        sku: &str,
        name: &str,
        row: &ImportRow,
        category_id: Uuid,
        supplier_id: Uuid,
        barcode: Option<String>,
        requires_prescription: bool,
    ) -> AppResult<(Uuid, bool)> {
        // SKU is the only dedup key; matching by name would merge distinct
        // strengths of the same medicine.
        if let Some(id) =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM medicines WHERE sku = $1")
                .bind(sku)
                .fetch_optional(&self.db)
                .await?
        {
            return Ok((id, false));
        }

        let inserted = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO medicines (
                sku, name, generic_name, category_id, supplier_id, reorder_level,
                requires_prescription, barcode, location, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (sku) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(sku)
        .bind(name)
        .bind(row.generic_name.as_deref().map(str::trim))
        .bind(category_id)
        .bind(supplier_id)
        .bind(DEFAULT_REORDER_LEVEL)
        .bind(requires_prescription)
        .bind(barcode)
        .bind(row.location.as_deref().map(str::trim))
        .bind(row.notes.as_deref().map(str::trim))
        .fetch_optional(&self.db)
        .await?;

        match inserted {
            Some(id) => Ok((id, true)),
            // Lost a race with a concurrent import of the same SKU
            None => Ok((
                sqlx::query_scalar::<_, Uuid>("SELECT id FROM medicines WHERE sku = $1")
                    .bind(sku)
                    .fetch_one(&self.db)
                    .await?,
                false,
            )),
        }
    }
}

#[derive(Debug)]
struct RowOutcome {
    medicine_created: bool,
    batch_created: bool,
}

/// Read CSV records, tagging every record with its 1-based source position
///
/// Unreadable records become numbered errors under the same counter as the
/// readable rows around them.
fn collect_rows(content: &str) -> (Vec<(usize, ImportRow)>, Vec<ImportRowError>) {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    let mut errors = Vec::new();
    for (index, record) in reader.deserialize::<ImportRow>().enumerate() {
        let row_number = index + 1;
        match record {
            Ok(row) => rows.push((row_number, row)),
            Err(e) => errors.push(ImportRowError {
                row: row_number,
                message: format!("Unreadable row: {}", e),
            }),
        }
    }
    (rows, errors)
}

/// Parse a quantity cell, tolerating decimals ("50.0") and junk
fn parse_quantity(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return (n >= 0).then_some(n);
    }
    let f = trimmed.parse::<f64>().ok()?;
    (f >= 0.0).then_some(f as i64)
}

/// Parse a money cell, stripping currency symbols and separators
fn parse_money(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    let value = cleaned.parse::<Decimal>().ok()?;
    (value >= Decimal::ZERO).then_some(value)
}

/// Parse a yes/no style cell
fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "yes" | "y" | "true" | "1"
    )
}
