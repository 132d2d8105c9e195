//! Quality alert queries.

use crate::services::mapping::Record;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use super::DbPool;

// ============================================================================
// Types
// ============================================================================

/// Quality alert joined with its reporter.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QualityAlert {
    pub id: i64,
    pub user_id: Option<String>,
    pub incident_title: Option<String>,
    pub responsible_dept: Option<String>,
    pub location_area: Option<String>,
    pub incident_date: Option<String>,
    pub incident_time: Option<String>,
    pub abnormality_type: Option<String>,
    pub quality_risk: Option<String>,
    pub kept_in_view: Option<String>,
    pub incident_desc: Option<String>,
    pub product_code: Option<String>,
    pub roll_id: Option<String>,
    pub lot_no: Option<String>,
    pub roll_positions: Option<String>,
    pub lot_time: Option<String>,
    pub shift: Option<String>,
    pub action_taken: Option<String>,
    pub who_action: Option<String>,
    pub when_action_date: Option<String>,
    pub status_action: Option<String>,
    pub submission_status: String,
    pub created_at: String,
    pub reporter_name: Option<String>,
    pub reporter_department: Option<String>,
}

impl QualityAlert {
    pub fn to_record(&self) -> Result<Record> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Ok(Record::new()),
        }
    }
}

/// Input for raising a quality alert.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateQualityAlert {
    pub user_id: Option<String>,
    pub incident_title: Option<String>,
    pub responsible_dept: Option<String>,
    pub location_area: Option<String>,
    pub incident_date: Option<String>,
    pub incident_time: Option<String>,
    pub abnormality_type: Option<String>,
    pub quality_risk: Option<String>,
    pub kept_in_view: Option<String>,
    pub incident_desc: Option<String>,
    pub product_code: Option<String>,
    pub roll_id: Option<String>,
    pub lot_no: Option<String>,
    pub roll_positions: Option<String>,
    pub lot_time: Option<String>,
    pub shift: Option<String>,
    pub action_taken: Option<String>,
    pub who_action: Option<String>,
    pub when_action_date: Option<String>,
    pub status_action: Option<String>,
    pub submission_status: Option<String>,
}

const SELECT_ALERTS: &str = r#"
    SELECT qa.*, u.full_name AS reporter_name, u.department AS reporter_department
    FROM quality_alerts qa
    LEFT JOIN users u ON u.id = qa.user_id
"#;

// ============================================================================
// Queries
// ============================================================================

/// Raise a new quality alert.
pub async fn create_alert(pool: &DbPool, input: CreateQualityAlert) -> Result<QualityAlert> {
    let has_title = input
        .incident_title
        .as_deref()
        .map(|t| !t.trim().is_empty())
        .unwrap_or(false);
    if !has_title {
        return Err(Error::Validation("incident_title is required".into()));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO quality_alerts (
            user_id, incident_title, responsible_dept, location_area, incident_date,
            incident_time, abnormality_type, quality_risk, kept_in_view, incident_desc,
            product_code, roll_id, lot_no, roll_positions, lot_time, shift,
            action_taken, who_action, when_action_date, status_action, submission_status
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.user_id)
    .bind(&input.incident_title)
    .bind(&input.responsible_dept)
    .bind(&input.location_area)
    .bind(&input.incident_date)
    .bind(&input.incident_time)
    .bind(&input.abnormality_type)
    .bind(&input.quality_risk)
    .bind(&input.kept_in_view)
    .bind(&input.incident_desc)
    .bind(&input.product_code)
    .bind(&input.roll_id)
    .bind(&input.lot_no)
    .bind(&input.roll_positions)
    .bind(&input.lot_time)
    .bind(&input.shift)
    .bind(&input.action_taken)
    .bind(&input.who_action)
    .bind(&input.when_action_date)
    .bind(&input.status_action)
    .bind(input.submission_status.as_deref().unwrap_or("submitted"))
    .execute(pool)
    .await?;

    get_alert(pool, result.last_insert_rowid()).await
}

/// Get an alert by ID.
pub async fn get_alert(pool: &DbPool, id: i64) -> Result<QualityAlert> {
    sqlx::query_as::<_, QualityAlert>(&format!("{} WHERE qa.id = ?", SELECT_ALERTS))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Quality alert not found: {}", id)))
}

/// List all alerts, newest first.
pub async fn list_alerts(pool: &DbPool) -> Result<Vec<QualityAlert>> {
    sqlx::query_as::<_, QualityAlert>(&format!(
        "{} ORDER BY qa.created_at DESC, qa.id DESC",
        SELECT_ALERTS
    ))
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}

/// Delete an alert.
pub async fn delete_alert(pool: &DbPool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM quality_alerts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Quality alert not found: {}", id)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_user, init_pool, initialize_schema, CreateUser};

    #[tokio::test]
    async fn test_alert_joins_reporter() {
        let pool = init_pool(":memory:").await.unwrap();
        initialize_schema(&pool).await.unwrap();

        let user = create_user(
            &pool,
            CreateUser {
                full_name: "Ravi Kumar".into(),
                email: None,
                department: Some("Production".into()),
            },
        )
        .await
        .unwrap();

        let alert = create_alert(
            &pool,
            CreateQualityAlert {
                user_id: Some(user.id),
                incident_title: Some("Gel spots".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(alert.reporter_name.as_deref(), Some("Ravi Kumar"));
        assert_eq!(alert.reporter_department.as_deref(), Some("Production"));
        assert_eq!(alert.submission_status, "submitted");
    }
}
