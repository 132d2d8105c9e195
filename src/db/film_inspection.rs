//! Film inspection form queries.
//!
//! Every product variant shares one table. Per-sample measurement series,
//! equipment references and pre-store check results are JSON columns.

use crate::services::mapping::Record;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use super::{parse_json_column, DbPool};

// ============================================================================
// Types
// ============================================================================

/// Film inspection form record from the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FilmInspectionForm {
    pub form_id: String,
    pub variant: String,
    pub product_code: Option<String>,
    pub specification: Option<String>,
    pub customer: Option<String>,
    pub location: Option<String>,
    pub production_order: Option<String>,
    pub purchase_order: Option<String>,
    pub machine_no: Option<String>,
    pub quantity: Option<i64>,
    pub lot_no: Option<String>,
    pub batch: Option<String>,
    pub standard_packing: Option<String>,
    pub pallet_size: Option<String>,
    pub production_date: Option<String>,
    pub inspection_date: Option<String>,
    pub ref_no: Option<String>,
    pub prepared_by: Option<String>,
    pub verified_by: Option<String>,
    pub verified_date: Option<String>,
    pub approved_by: Option<String>,
    pub approved_date: Option<String>,
    pub equipment_used: String,
    pub measurements: String,
    pub prestore: String,
    pub created_at: String,
    pub updated_at: String,
}

impl FilmInspectionForm {
    /// Flatten the row into a mapper record.
    ///
    /// `equipment_used` stays nested; measurement series and pre-store fields
    /// are lifted to the top level without shadowing header columns.
    pub fn to_record(&self) -> Result<Record> {
        let mut record = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Record::new(),
        };

        record.insert(
            "equipment_used".into(),
            parse_json_column(&self.equipment_used),
        );
        record.remove("measurements");
        record.remove("prestore");

        for column in [&self.measurements, &self.prestore] {
            if let Value::Object(fields) = parse_json_column(column) {
                for (key, value) in fields {
                    record.entry(key).or_insert(value);
                }
            }
        }

        Ok(record)
    }
}

/// Input for creating or replacing a film inspection form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveFilmInspectionForm {
    pub form_id: Option<String>,
    pub variant: String,
    pub product_code: Option<String>,
    pub specification: Option<String>,
    pub customer: Option<String>,
    pub location: Option<String>,
    pub production_order: Option<String>,
    pub purchase_order: Option<String>,
    pub machine_no: Option<String>,
    pub quantity: Option<i64>,
    pub lot_no: Option<String>,
    pub batch: Option<String>,
    pub standard_packing: Option<String>,
    pub pallet_size: Option<String>,
    pub production_date: Option<String>,
    pub inspection_date: Option<String>,
    pub ref_no: Option<String>,
    pub prepared_by: Option<String>,
    pub verified_by: Option<String>,
    pub verified_date: Option<String>,
    pub approved_by: Option<String>,
    pub approved_date: Option<String>,
    #[serde(default)]
    pub equipment_used: Value,
    #[serde(default)]
    pub measurements: Value,
    #[serde(default)]
    pub prestore: Value,
}

fn json_text(value: &Value) -> String {
    if value.is_null() {
        "{}".to_string()
    } else {
        value.to_string()
    }
}

// ============================================================================
// Queries
// ============================================================================

/// Create a new film inspection form.
pub async fn create_film_form(
    pool: &DbPool,
    input: SaveFilmInspectionForm,
) -> Result<FilmInspectionForm> {
    let form_id = input
        .form_id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    sqlx::query_as::<_, FilmInspectionForm>(
        r#"
        INSERT INTO film_inspection_forms (
            form_id, variant, product_code, specification, customer, location,
            production_order, purchase_order, machine_no, quantity, lot_no, batch,
            standard_packing, pallet_size, production_date, inspection_date, ref_no,
            prepared_by, verified_by, verified_date, approved_by, approved_date,
            equipment_used, measurements, prestore
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&form_id)
    .bind(&input.variant)
    .bind(&input.product_code)
    .bind(&input.specification)
    .bind(&input.customer)
    .bind(&input.location)
    .bind(&input.production_order)
    .bind(&input.purchase_order)
    .bind(&input.machine_no)
    .bind(input.quantity)
    .bind(&input.lot_no)
    .bind(&input.batch)
    .bind(&input.standard_packing)
    .bind(&input.pallet_size)
    .bind(&input.production_date)
    .bind(&input.inspection_date)
    .bind(&input.ref_no)
    .bind(&input.prepared_by)
    .bind(&input.verified_by)
    .bind(&input.verified_date)
    .bind(&input.approved_by)
    .bind(&input.approved_date)
    .bind(json_text(&input.equipment_used))
    .bind(json_text(&input.measurements))
    .bind(json_text(&input.prestore))
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            Error::AlreadyExists(format!("Film inspection form {} already exists", form_id))
        }
        _ => Error::Database(e),
    })
}

/// Get a film inspection form by ID.
pub async fn get_film_form(pool: &DbPool, form_id: &str) -> Result<FilmInspectionForm> {
    sqlx::query_as::<_, FilmInspectionForm>(
        "SELECT * FROM film_inspection_forms WHERE form_id = ?",
    )
    .bind(form_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Form not found: {}", form_id)))
}

/// List forms, newest first, optionally restricted to one variant.
pub async fn list_film_forms(
    pool: &DbPool,
    variant: Option<&str>,
) -> Result<Vec<FilmInspectionForm>> {
    let forms = match variant {
        Some(variant) => {
            sqlx::query_as::<_, FilmInspectionForm>(
                "SELECT * FROM film_inspection_forms WHERE variant = ? ORDER BY created_at DESC",
            )
            .bind(variant)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, FilmInspectionForm>(
                "SELECT * FROM film_inspection_forms ORDER BY created_at DESC",
            )
            .fetch_all(pool)
            .await?
        }
    };
    Ok(forms)
}

/// Replace the contents of an existing form. The variant is immutable.
pub async fn update_film_form(
    pool: &DbPool,
    form_id: &str,
    input: SaveFilmInspectionForm,
) -> Result<FilmInspectionForm> {
    let existing = get_film_form(pool, form_id).await?;
    if existing.variant != input.variant {
        return Err(Error::Validation(format!(
            "Form {} belongs to variant {}",
            form_id, existing.variant
        )));
    }

    sqlx::query_as::<_, FilmInspectionForm>(
        r#"
        UPDATE film_inspection_forms SET
            product_code = ?, specification = ?, customer = ?, location = ?,
            production_order = ?, purchase_order = ?, machine_no = ?, quantity = ?,
            lot_no = ?, batch = ?, standard_packing = ?, pallet_size = ?,
            production_date = ?, inspection_date = ?, ref_no = ?, prepared_by = ?,
            verified_by = ?, verified_date = ?, approved_by = ?, approved_date = ?,
            equipment_used = ?, measurements = ?, prestore = ?,
            updated_at = datetime('now')
        WHERE form_id = ?
        RETURNING *
        "#,
    )
    .bind(&input.product_code)
    .bind(&input.specification)
    .bind(&input.customer)
    .bind(&input.location)
    .bind(&input.production_order)
    .bind(&input.purchase_order)
    .bind(&input.machine_no)
    .bind(input.quantity)
    .bind(&input.lot_no)
    .bind(&input.batch)
    .bind(&input.standard_packing)
    .bind(&input.pallet_size)
    .bind(&input.production_date)
    .bind(&input.inspection_date)
    .bind(&input.ref_no)
    .bind(&input.prepared_by)
    .bind(&input.verified_by)
    .bind(&input.verified_date)
    .bind(&input.approved_by)
    .bind(&input.approved_date)
    .bind(json_text(&input.equipment_used))
    .bind(json_text(&input.measurements))
    .bind(json_text(&input.prestore))
    .bind(form_id)
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

/// Delete a film inspection form.
pub async fn delete_film_form(pool: &DbPool, form_id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM film_inspection_forms WHERE form_id = ?")
        .bind(form_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Form not found: {}", form_id)));
    }

    Ok(())
}
