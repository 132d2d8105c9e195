//! Fire extinguisher register and inspection log queries.
//!
//! Extinguisher numbers are stored as `FE-NNN`. Inspections are appended to
//! the `inspection_data` JSON column of their extinguisher.

use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::DbPool;

// ============================================================================
// Types
// ============================================================================

/// Fire extinguisher record from the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FireExtinguisher {
    pub id: String,
    pub extinguisher_no: String,
    pub type_of_extinguisher: Option<String>,
    pub location: Option<String>,
    pub capacity: Option<String>,
    pub inspection_data: String,
    pub created_at: String,
    pub updated_at: String,
}

impl FireExtinguisher {
    pub fn inspection_log(&self) -> InspectionLog {
        serde_json::from_str(&self.inspection_data).unwrap_or_default()
    }

    /// Number without the `FE-` prefix and leading zeros, as shown on forms.
    pub fn display_number(&self) -> String {
        let digits = self
            .extinguisher_no
            .trim_start_matches("FE-")
            .trim_start_matches('0');
        if digits.is_empty() {
            "0".to_string()
        } else {
            digits.to_string()
        }
    }
}

/// Inspection history stored on an extinguisher.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InspectionLog {
    #[serde(default)]
    pub inspections: Vec<ExtinguisherInspection>,
}

/// Inspection status derived from the next due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InspectionStatus {
    Active,
    #[serde(rename = "Service Due")]
    ServiceDue,
    Expired,
}

impl InspectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::ServiceDue => "Service Due",
            Self::Expired => "Expired",
        }
    }

    /// Expired once the due date has passed, due for service within 30 days.
    pub fn from_due_date(due: NaiveDate, today: NaiveDate) -> Self {
        let days_until_due = (due - today).num_days();
        if days_until_due < 0 {
            Self::Expired
        } else if days_until_due <= 30 {
            Self::ServiceDue
        } else {
            Self::Active
        }
    }
}

/// One monthly inspection entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtinguisherInspection {
    #[serde(default)]
    pub id: String,
    pub date: Option<String>,
    pub inspector: Option<String>,
    pub next_due_date: Option<String>,
    pub form_date: Option<String>,
    pub expiry_date: Option<String>,
    pub refilled_date: Option<String>,
    pub checked_by: Option<String>,
    pub verified_by: Option<String>,
    pub capacity: Option<String>,
    pub pin_seal: Option<String>,
    pub pressure: Option<String>,
    pub hose_nozzle: Option<String>,
    pub handle_knob: Option<String>,
    pub dent_rust_leak: Option<String>,
    pub easy_access: Option<String>,
    pub remarks: Option<String>,
    pub status: Option<InspectionStatus>,
    pub created_at: Option<String>,
}

/// Input for creating or updating an extinguisher.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveFireExtinguisher {
    pub extinguisher_no: String,
    pub type_of_extinguisher: Option<String>,
    pub location: Option<String>,
    pub capacity: Option<String>,
}

/// Input for recording an inspection. The extinguisher is created when missing.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordInspection {
    pub extinguisher_no: String,
    pub type_of_extinguisher: Option<String>,
    pub location: Option<String>,
    pub capacity: Option<String>,
    pub inspection: ExtinguisherInspection,
}

/// Normalise user input (`7`, `FE-7`, `fe-007`) to the stored `FE-007` form.
pub fn normalize_extinguisher_no(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("FE-")
        .or_else(|| trimmed.strip_prefix("fe-"))
        .unwrap_or(trimmed);

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::Validation(format!(
            "Invalid extinguisher number: {}",
            raw
        )));
    }

    Ok(format!("FE-{:0>3}", digits))
}

// ============================================================================
// Queries
// ============================================================================

/// Create a new extinguisher.
pub async fn create_extinguisher(
    pool: &DbPool,
    input: SaveFireExtinguisher,
) -> Result<FireExtinguisher> {
    let number = normalize_extinguisher_no(&input.extinguisher_no)?;

    sqlx::query_as::<_, FireExtinguisher>(
        r#"
        INSERT INTO fire_extinguishers (id, extinguisher_no, type_of_extinguisher, location, capacity)
        VALUES (?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(&number)
    .bind(&input.type_of_extinguisher)
    .bind(&input.location)
    .bind(&input.capacity)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            Error::AlreadyExists(format!("Extinguisher {} already exists", number))
        }
        _ => Error::Database(e),
    })
}

/// Get an extinguisher by ID.
pub async fn get_extinguisher(pool: &DbPool, id: &str) -> Result<FireExtinguisher> {
    sqlx::query_as::<_, FireExtinguisher>("SELECT * FROM fire_extinguishers WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Extinguisher not found: {}", id)))
}

/// List extinguishers ordered by number.
pub async fn list_extinguishers(pool: &DbPool) -> Result<Vec<FireExtinguisher>> {
    sqlx::query_as::<_, FireExtinguisher>(
        "SELECT * FROM fire_extinguishers ORDER BY extinguisher_no",
    )
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}

/// Update extinguisher details.
pub async fn update_extinguisher(
    pool: &DbPool,
    id: &str,
    input: SaveFireExtinguisher,
) -> Result<FireExtinguisher> {
    let number = normalize_extinguisher_no(&input.extinguisher_no)?;

    sqlx::query_as::<_, FireExtinguisher>(
        r#"
        UPDATE fire_extinguishers
        SET extinguisher_no = ?, type_of_extinguisher = ?, location = ?, capacity = ?,
            updated_at = datetime('now')
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(&number)
    .bind(&input.type_of_extinguisher)
    .bind(&input.location)
    .bind(&input.capacity)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Extinguisher not found: {}", id)))
}

/// Delete an extinguisher and its inspection history.
pub async fn delete_extinguisher(pool: &DbPool, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM fire_extinguishers WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Extinguisher not found: {}", id)));
    }

    Ok(())
}

/// Append an inspection, creating the extinguisher on first use.
///
/// The extinguisher's type, location and capacity are refreshed from the
/// submission and the entry status is derived from its next due date.
/// The log is read and written inside one write transaction.
pub async fn record_inspection(
    pool: &DbPool,
    input: RecordInspection,
    today: NaiveDate,
) -> Result<FireExtinguisher> {
    let number = normalize_extinguisher_no(&input.extinguisher_no)?;

    let mut inspection = input.inspection;
    if inspection.id.is_empty() {
        inspection.id = uuid::Uuid::new_v4().to_string();
    }
    inspection.status = inspection
        .next_due_date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d.get(..10).unwrap_or(d), "%Y-%m-%d").ok())
        .map(|due| InspectionStatus::from_due_date(due, today));
    inspection.created_at = Some(chrono::Utc::now().to_rfc3339());

    let mut tx = pool.begin().await?;

    // The upsert is the first statement, so the write lock is held before
    // the log is read.
    let extinguisher = sqlx::query_as::<_, FireExtinguisher>(
        r#"
        INSERT INTO fire_extinguishers (id, extinguisher_no, type_of_extinguisher, location, capacity)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(extinguisher_no) DO UPDATE SET
            type_of_extinguisher = COALESCE(excluded.type_of_extinguisher, type_of_extinguisher),
            location = COALESCE(excluded.location, location),
            capacity = COALESCE(excluded.capacity, capacity),
            updated_at = datetime('now')
        RETURNING *
        "#,
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(&number)
    .bind(&input.type_of_extinguisher)
    .bind(&input.location)
    .bind(&input.capacity)
    .fetch_one(&mut *tx)
    .await?;

    let mut log = extinguisher.inspection_log();
    if log.inspections.is_empty() {
        tracing::info!(extinguisher_no = %number, "First inspection recorded");
    }
    log.inspections.push(inspection);

    let saved = save_inspection_log(&mut tx, &extinguisher.id, &log).await?;
    tx.commit().await?;

    Ok(saved)
}

/// Remove a single inspection entry.
pub async fn delete_inspection(
    pool: &DbPool,
    extinguisher_id: &str,
    inspection_id: &str,
) -> Result<FireExtinguisher> {
    let mut tx = pool.begin().await?;

    // Touching the row first takes the write lock.
    let extinguisher = sqlx::query_as::<_, FireExtinguisher>(
        "UPDATE fire_extinguishers SET updated_at = datetime('now') WHERE id = ? RETURNING *",
    )
    .bind(extinguisher_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Extinguisher not found: {}", extinguisher_id)))?;

    let mut log = extinguisher.inspection_log();
    let before = log.inspections.len();
    log.inspections.retain(|i| i.id != inspection_id);

    if log.inspections.len() == before {
        return Err(Error::NotFound(format!(
            "Inspection not found: {}",
            inspection_id
        )));
    }

    let saved = save_inspection_log(&mut tx, extinguisher_id, &log).await?;
    tx.commit().await?;

    Ok(saved)
}

async fn save_inspection_log(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    id: &str,
    log: &InspectionLog,
) -> Result<FireExtinguisher> {
    sqlx::query_as::<_, FireExtinguisher>(
        r#"
        UPDATE fire_extinguishers
        SET inspection_data = ?, updated_at = datetime('now')
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(serde_json::to_string(log)?)
    .bind(id)
    .fetch_one(&mut **tx)
    .await
    .map_err(Error::Database)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_pool, initialize_schema};
    use rstest::rstest;

    #[rstest]
    #[case("7", "FE-007")]
    #[case("FE-7", "FE-007")]
    #[case("fe-012", "FE-012")]
    #[case(" 1234 ", "FE-1234")]
    fn test_normalize_extinguisher_no(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_extinguisher_no(raw).unwrap(), expected);
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert!(normalize_extinguisher_no("FE-").is_err());
        assert!(normalize_extinguisher_no("abc").is_err());
    }

    #[test]
    fn test_status_from_due_date() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let day = |d| NaiveDate::from_ymd_opt(2024, 6, 1).unwrap() + chrono::Duration::days(d);
        assert_eq!(InspectionStatus::from_due_date(day(-1), today), InspectionStatus::Expired);
        assert_eq!(InspectionStatus::from_due_date(day(0), today), InspectionStatus::ServiceDue);
        assert_eq!(InspectionStatus::from_due_date(day(30), today), InspectionStatus::ServiceDue);
        assert_eq!(InspectionStatus::from_due_date(day(31), today), InspectionStatus::Active);
    }

    #[tokio::test]
    async fn test_record_inspection_creates_extinguisher() {
        let pool = init_pool(":memory:").await.unwrap();
        initialize_schema(&pool).await.unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let record = |due: &str| RecordInspection {
            extinguisher_no: "5".into(),
            type_of_extinguisher: Some("CO2".into()),
            location: Some("Extrusion hall".into()),
            capacity: Some("4.5 kg".into()),
            inspection: ExtinguisherInspection {
                next_due_date: Some(due.into()),
                inspector: Some("Sam".into()),
                ..Default::default()
            },
        };

        let first = record_inspection(&pool, record("2024-06-20"), today).await.unwrap();
        assert_eq!(first.extinguisher_no, "FE-005");
        assert_eq!(first.display_number(), "5");

        let second = record_inspection(&pool, record("2024-12-01"), today).await.unwrap();
        assert_eq!(second.id, first.id);

        let log = second.inspection_log();
        assert_eq!(log.inspections.len(), 2);
        assert_eq!(log.inspections[0].status, Some(InspectionStatus::ServiceDue));
        assert_eq!(log.inspections[1].status, Some(InspectionStatus::Active));

        let remaining = delete_inspection(&pool, &first.id, &log.inspections[0].id)
            .await
            .unwrap();
        assert_eq!(remaining.inspection_log().inspections.len(), 1);
    }
}
