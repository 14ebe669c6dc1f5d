//! Catalog service for medicines, categories, and suppliers

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use shared::models::{Category, Medicine, Supplier, DEFAULT_CATEGORY_COLOR};
use shared::validation::{validate_reorder_level, validate_sku};

/// Catalog service for reference data management
#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
}

/// Raw medicine row as stored
#[derive(Debug, FromRow)]
struct MedicineRow {
    id: Uuid,
    sku: String,
    name: String,
    generic_name: Option<String>,
    category_id: Uuid,
    supplier_id: Option<Uuid>,
    reorder_level: i64,
    requires_prescription: bool,
    barcode: Option<String>,
    location: Option<String>,
    notes: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MedicineRow> for Medicine {
    fn from(row: MedicineRow) -> Self {
        Medicine {
            id: row.id,
            sku: row.sku,
            name: row.name,
            generic_name: row.generic_name,
            category_id: row.category_id,
            supplier_id: row.supplier_id,
            reorder_level: row.reorder_level,
            requires_prescription: row.requires_prescription,
            barcode: row.barcode,
            location: row.location,
            notes: row.notes,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const MEDICINE_COLUMNS: &str = "id, sku, name, generic_name, category_id, supplier_id, \
     reorder_level, requires_prescription, barcode, location, notes, is_active, \
     created_at, updated_at";

/// A medicine joined with its current stock total
#[derive(Debug, serde::Serialize)]
pub struct MedicineWithStock {
    #[serde(flatten)]
    pub medicine: Medicine,
    pub current_stock: i64,
}

/// Input for creating a medicine
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMedicineInput {
    pub sku: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub generic_name: Option<String>,
    pub category_id: Uuid,
    pub supplier_id: Option<Uuid>,
    pub reorder_level: i64,
    #[serde(default)]
    pub requires_prescription: bool,
    pub barcode: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

/// Input for updating a medicine
#[derive(Debug, Deserialize)]
pub struct UpdateMedicineInput {
    pub name: Option<String>,
    pub generic_name: Option<String>,
    pub category_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub reorder_level: Option<i64>,
    pub requires_prescription: Option<bool>,
    pub barcode: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

/// Input for creating a category
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub color: Option<String>,
}

/// Input for creating a supplier
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSupplierInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub contact: Option<String>,
}

impl CatalogService {
    /// Create a new CatalogService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a medicine
    pub async fn create_medicine(&self, input: CreateMedicineInput) -> AppResult<Medicine> {
        input
            .validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;
        let sku = input.sku.trim().to_ascii_uppercase();
        if let Err(msg) = validate_sku(&sku) {
            return Err(AppError::Validation {
                field: "sku".to_string(),
                message: msg.to_string(),
            });
        }
        if let Err(msg) = validate_reorder_level(input.reorder_level) {
            return Err(AppError::Validation {
                field: "reorder_level".to_string(),
                message: msg.to_string(),
            });
        }

        let row = sqlx::query_as::<_, MedicineRow>(&format!(
            r#"
            INSERT INTO medicines (
                sku, name, generic_name, category_id, supplier_id, reorder_level,
                requires_prescription, barcode, location, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (sku) DO NOTHING
            RETURNING {MEDICINE_COLUMNS}
            "#
        ))
        .bind(&sku)
        .bind(input.name.trim())
        .bind(input.generic_name.as_deref())
        .bind(input.category_id)
        .bind(input.supplier_id)
        .bind(input.reorder_level)
        .bind(input.requires_prescription)
        .bind(input.barcode.as_deref())
        .bind(input.location.as_deref())
        .bind(input.notes.as_deref())
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::DuplicateEntry("sku".to_string()))?;

        Ok(row.into())
    }

    /// List active medicines with their current stock totals
    pub async fn list_medicines(&self) -> AppResult<Vec<MedicineWithStock>> {
        #[derive(FromRow)]
        struct RowWithStock {
            #[sqlx(flatten)]
            medicine: MedicineRow,
            current_stock: i64,
        }

        let rows = sqlx::query_as::<_, RowWithStock>(&format!(
            r#"
            SELECT m.{cols},
                   COALESCE(SUM(b.quantity) FILTER (WHERE b.status = 'active'), 0)::bigint
                       as current_stock
            FROM medicines m
            LEFT JOIN batches b ON b.medicine_id = m.id
            WHERE m.is_active = true
            GROUP BY m.id
            ORDER BY m.name ASC
            "#,
            cols = MEDICINE_COLUMNS.replace(", ", ", m.")
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| MedicineWithStock {
                medicine: r.medicine.into(),
                current_stock: r.current_stock,
            })
            .collect())
    }

    /// Get a medicine by id
    pub async fn get_medicine(&self, medicine_id: Uuid) -> AppResult<Medicine> {
        let row = sqlx::query_as::<_, MedicineRow>(&format!(
            "SELECT {MEDICINE_COLUMNS} FROM medicines WHERE id = $1"
        ))
        .bind(medicine_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Medicine".to_string()))?;

        Ok(row.into())
    }

    /// Update a medicine's catalog fields
    pub async fn update_medicine(
        &self,
        medicine_id: Uuid,
        input: UpdateMedicineInput,
    ) -> AppResult<Medicine> {
        let existing = self.get_medicine(medicine_id).await?;

        let reorder_level = input.reorder_level.unwrap_or(existing.reorder_level);
        if let Err(msg) = validate_reorder_level(reorder_level) {
            return Err(AppError::Validation {
                field: "reorder_level".to_string(),
                message: msg.to_string(),
            });
        }

        let row = sqlx::query_as::<_, MedicineRow>(&format!(
            r#"
            UPDATE medicines
            SET name = $2, generic_name = $3, category_id = $4, supplier_id = $5,
                reorder_level = $6, requires_prescription = $7, barcode = $8,
                location = $9, notes = $10, updated_at = NOW()
            WHERE id = $1
            RETURNING {MEDICINE_COLUMNS}
            "#
        ))
        .bind(medicine_id)
        .bind(input.name.unwrap_or(existing.name))
        .bind(input.generic_name.or(existing.generic_name))
        .bind(input.category_id.unwrap_or(existing.category_id))
        .bind(input.supplier_id.or(existing.supplier_id))
        .bind(reorder_level)
        .bind(
            input
                .requires_prescription
                .unwrap_or(existing.requires_prescription),
        )
        .bind(input.barcode.or(existing.barcode))
        .bind(input.location.or(existing.location))
        .bind(input.notes.or(existing.notes))
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Soft-delete a medicine
    ///
    /// Medicines referenced by batches are never hard-deleted; history and
    /// analytics keep resolving through them.
    pub async fn deactivate_medicine(&self, medicine_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE medicines SET is_active = false, updated_at = NOW() WHERE id = $1",
        )
        .bind(medicine_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Medicine".to_string()));
        }
        Ok(())
    }

    /// List categories
    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, (Uuid, String, String, DateTime<Utc>)>(
            "SELECT id, name, color, created_at FROM categories ORDER BY name ASC",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, color, created_at)| Category {
                id,
                name,
                color,
                created_at,
            })
            .collect())
    }

    /// Create a category
    pub async fn create_category(&self, input: CreateCategoryInput) -> AppResult<Category> {
        input
            .validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        let color = input
            .color
            .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string());
        let row = sqlx::query_as::<_, (Uuid, String, String, DateTime<Utc>)>(
            r#"
            INSERT INTO categories (name, color)
            VALUES ($1, $2)
            ON CONFLICT (name) DO NOTHING
            RETURNING id, name, color, created_at
            "#,
        )
        .bind(input.name.trim())
        .bind(&color)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::DuplicateEntry("category name".to_string()))?;

        Ok(Category {
            id: row.0,
            name: row.1,
            color: row.2,
            created_at: row.3,
        })
    }

    /// List suppliers
    pub async fn list_suppliers(&self) -> AppResult<Vec<Supplier>> {
        let rows = sqlx::query_as::<_, (Uuid, String, Option<String>, DateTime<Utc>)>(
            "SELECT id, name, contact, created_at FROM suppliers ORDER BY name ASC",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, contact, created_at)| Supplier {
                id,
                name,
                contact,
                created_at,
            })
            .collect())
    }

    /// Create a supplier
    pub async fn create_supplier(&self, input: CreateSupplierInput) -> AppResult<Supplier> {
        input
            .validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        let row = sqlx::query_as::<_, (Uuid, String, Option<String>, DateTime<Utc>)>(
            r#"
            INSERT INTO suppliers (name, contact)
            VALUES ($1, $2)
            ON CONFLICT (name) DO NOTHING
            RETURNING id, name, contact, created_at
            "#,
        )
        .bind(input.name.trim())
        .bind(input.contact.as_deref())
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::DuplicateEntry("supplier name".to_string()))?;

        Ok(Supplier {
            id: row.0,
            name: row.1,
            contact: row.2,
            created_at: row.3,
        })
    }
}
