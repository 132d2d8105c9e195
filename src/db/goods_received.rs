//! Goods received note (GRN) queries.
//!
//! A GRN starts as a draft and is submitted once; submitted notes are
//! read-only.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::DbPool;

// ============================================================================
// Types
// ============================================================================

/// GRN lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrnStatus {
    Draft,
    Submitted,
}

impl GrnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "submitted" => Some(Self::Submitted),
            _ => None,
        }
    }
}

/// GRN header record.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct GoodsReceivedNote {
    pub id: String,
    pub grn_number: Option<String>,
    pub grn_date: Option<String>,
    pub receipt_date: Option<String>,
    pub received_by: Option<String>,
    pub po_number: Option<String>,
    pub po_date: Option<String>,
    pub supplier_name: Option<String>,
    pub supplier_code: Option<String>,
    pub supplier_invoice: Option<String>,
    pub invoice_date: Option<String>,
    pub delivery_challan: Option<String>,
    pub vehicle_number: Option<String>,
    pub quality_status: Option<String>,
    #[serde(skip_serializing)]
    pub document_urls: String,
    pub user_id: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl GoodsReceivedNote {
    pub fn status_enum(&self) -> GrnStatus {
        GrnStatus::from_str(&self.status).unwrap_or(GrnStatus::Draft)
    }

    pub fn document_urls_vec(&self) -> Vec<String> {
        serde_json::from_str(&self.document_urls).unwrap_or_default()
    }
}

/// GRN line item.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct GrnItem {
    pub id: String,
    pub grn_id: String,
    pub item_code: Option<String>,
    pub item_description: Option<String>,
    pub quantity_ordered: f64,
    pub quantity_received: f64,
    pub uom: Option<String>,
    pub unit_price: f64,
    pub batch_number: Option<String>,
    pub expiry_date: Option<String>,
    pub mfg_date: Option<String>,
    pub storage_location: Option<String>,
}

/// GRN with its items.
#[derive(Debug, Clone, Serialize)]
pub struct GrnWithItems {
    #[serde(flatten)]
    pub note: GoodsReceivedNote,
    pub document_urls: Vec<String>,
    pub items: Vec<GrnItem>,
}

/// Line item input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveGrnItem {
    pub item_code: Option<String>,
    pub item_description: Option<String>,
    #[serde(default)]
    pub quantity_ordered: f64,
    #[serde(default)]
    pub quantity_received: f64,
    pub uom: Option<String>,
    #[serde(default)]
    pub unit_price: f64,
    pub batch_number: Option<String>,
    pub expiry_date: Option<String>,
    pub mfg_date: Option<String>,
    pub storage_location: Option<String>,
}

/// Input for creating or replacing a draft GRN.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveGoodsReceivedNote {
    pub grn_number: Option<String>,
    pub grn_date: Option<String>,
    pub receipt_date: Option<String>,
    pub received_by: Option<String>,
    pub po_number: Option<String>,
    pub po_date: Option<String>,
    pub supplier_name: Option<String>,
    pub supplier_code: Option<String>,
    pub supplier_invoice: Option<String>,
    pub invoice_date: Option<String>,
    pub delivery_challan: Option<String>,
    pub vehicle_number: Option<String>,
    pub quality_status: Option<String>,
    #[serde(default)]
    pub document_urls: Vec<String>,
    pub user_id: Option<String>,
    #[serde(default)]
    pub items: Vec<SaveGrnItem>,
}

// ============================================================================
// Queries
// ============================================================================

/// Create a draft GRN with its items.
pub async fn create_grn(pool: &DbPool, input: SaveGoodsReceivedNote) -> Result<GrnWithItems> {
    let id = uuid::Uuid::new_v4().to_string();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO goods_received_notes (
            id, grn_number, grn_date, receipt_date, received_by, po_number, po_date,
            supplier_name, supplier_code, supplier_invoice, invoice_date, delivery_challan,
            vehicle_number, quality_status, document_urls, user_id, status
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'draft')
        "#,
    )
    .bind(&id)
    .bind(&input.grn_number)
    .bind(&input.grn_date)
    .bind(&input.receipt_date)
    .bind(&input.received_by)
    .bind(&input.po_number)
    .bind(&input.po_date)
    .bind(&input.supplier_name)
    .bind(&input.supplier_code)
    .bind(&input.supplier_invoice)
    .bind(&input.invoice_date)
    .bind(&input.delivery_challan)
    .bind(&input.vehicle_number)
    .bind(&input.quality_status)
    .bind(serde_json::to_string(&input.document_urls)?)
    .bind(&input.user_id)
    .execute(&mut *tx)
    .await?;

    insert_items(&mut tx, &id, &input.items).await?;
    tx.commit().await?;

    get_grn(pool, &id).await
}

/// Replace the header and items of a draft GRN.
pub async fn update_grn(
    pool: &DbPool,
    id: &str,
    input: SaveGoodsReceivedNote,
) -> Result<GrnWithItems> {
    let existing = get_grn(pool, id).await?;
    if existing.note.status_enum() == GrnStatus::Submitted {
        return Err(Error::Conflict(format!("GRN {} is already submitted", id)));
    }

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE goods_received_notes SET
            grn_number = ?, grn_date = ?, receipt_date = ?, received_by = ?, po_number = ?,
            po_date = ?, supplier_name = ?, supplier_code = ?, supplier_invoice = ?,
            invoice_date = ?, delivery_challan = ?, vehicle_number = ?, quality_status = ?,
            document_urls = ?, updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(&input.grn_number)
    .bind(&input.grn_date)
    .bind(&input.receipt_date)
    .bind(&input.received_by)
    .bind(&input.po_number)
    .bind(&input.po_date)
    .bind(&input.supplier_name)
    .bind(&input.supplier_code)
    .bind(&input.supplier_invoice)
    .bind(&input.invoice_date)
    .bind(&input.delivery_challan)
    .bind(&input.vehicle_number)
    .bind(&input.quality_status)
    .bind(serde_json::to_string(&input.document_urls)?)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM grn_items WHERE grn_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    insert_items(&mut tx, id, &input.items).await?;
    tx.commit().await?;

    get_grn(pool, id).await
}

async fn insert_items(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    grn_id: &str,
    items: &[SaveGrnItem],
) -> Result<()> {
    for item in items {
        sqlx::query(
            r#"
            INSERT INTO grn_items (
                id, grn_id, item_code, item_description, quantity_ordered, quantity_received,
                uom, unit_price, batch_number, expiry_date, mfg_date, storage_location
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(grn_id)
        .bind(&item.item_code)
        .bind(&item.item_description)
        .bind(item.quantity_ordered)
        .bind(item.quantity_received)
        .bind(&item.uom)
        .bind(item.unit_price)
        .bind(&item.batch_number)
        .bind(item.expiry_date.as_deref().filter(|d| !d.is_empty()))
        .bind(item.mfg_date.as_deref().filter(|d| !d.is_empty()))
        .bind(&item.storage_location)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Get a GRN with its items.
pub async fn get_grn(pool: &DbPool, id: &str) -> Result<GrnWithItems> {
    let note = sqlx::query_as::<_, GoodsReceivedNote>(
        "SELECT * FROM goods_received_notes WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("GRN not found: {}", id)))?;

    let items = sqlx::query_as::<_, GrnItem>(
        "SELECT * FROM grn_items WHERE grn_id = ? ORDER BY rowid",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(GrnWithItems {
        document_urls: note.document_urls_vec(),
        note,
        items,
    })
}

/// List GRN headers, newest first, optionally by status.
pub async fn list_grns(pool: &DbPool, status: Option<GrnStatus>) -> Result<Vec<GoodsReceivedNote>> {
    let notes = match status {
        Some(status) => {
            sqlx::query_as::<_, GoodsReceivedNote>(
                "SELECT * FROM goods_received_notes WHERE status = ? ORDER BY created_at DESC",
            )
            .bind(status.as_str())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, GoodsReceivedNote>(
                "SELECT * FROM goods_received_notes ORDER BY created_at DESC",
            )
            .fetch_all(pool)
            .await?
        }
    };
    Ok(notes)
}

/// Submit a draft GRN. At least one item is required.
pub async fn submit_grn(pool: &DbPool, id: &str) -> Result<GrnWithItems> {
    let existing = get_grn(pool, id).await?;
    if existing.note.status_enum() == GrnStatus::Submitted {
        return Err(Error::Conflict(format!("GRN {} is already submitted", id)));
    }
    if existing.items.is_empty() {
        return Err(Error::Validation("A GRN needs at least one item".into()));
    }

    sqlx::query(
        "UPDATE goods_received_notes SET status = 'submitted', updated_at = datetime('now') WHERE id = ?",
    )
    .bind(id)
    .execute(pool)
    .await?;

    tracing::info!(grn_id = %id, "GRN submitted");
    get_grn(pool, id).await
}

/// Delete a GRN and its items.
pub async fn delete_grn(pool: &DbPool, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM goods_received_notes WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("GRN not found: {}", id)));
    }

    Ok(())
}
