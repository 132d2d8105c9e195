//! Maintenance job requisition (MJR) queries.
//!
//! A requisition is raised as a `request` and completed by the maintenance
//! team as an `action`. Check-box groups and materials are JSON columns.

use crate::services::mapping::Record;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, QueryBuilder, Sqlite};

use super::{parse_json_column, DbPool};

// ============================================================================
// Types
// ============================================================================

/// Job requisition record from the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct JobRequisition {
    pub id: String,
    pub requisition_no: Option<String>,
    pub form_type: String,
    pub occur_date: Option<String>,
    pub occur_time: Option<String>,
    pub requestor_name: Option<String>,
    pub req_dept: Option<String>,
    pub req_dept_hod: Option<String>,
    pub equipment_name: Option<String>,
    pub equipment_no: Option<String>,
    pub equipment_install_date: Option<String>,
    pub machine_no: Option<String>,
    pub purchase_req_no: Option<String>,
    pub require_completion_date: Option<String>,
    pub completion_time: Option<String>,
    pub total_hours: Option<String>,
    pub existing_condition: Option<String>,
    pub root_cause: Option<String>,
    pub correction: Option<String>,
    pub technician_name: Option<String>,
    pub material_retrieval: Option<String>,
    pub cleaning_inspection: Option<String>,
    pub schedule_start_date: Option<String>,
    pub schedule_start_time: Option<String>,
    pub schedule_end_date: Option<String>,
    pub schedule_end_time: Option<String>,
    pub inspection_result: Option<String>,
    pub inspection_remarks: Option<String>,
    pub inspection_checked_by: Option<String>,
    pub clean_retr_checked_by: Option<String>,
    pub cost_incurred: Option<f64>,
    pub breakdown_codes: String,
    pub power_options: String,
    pub machine_options: String,
    pub handle_by: String,
    pub materials_used: String,
    pub created_at: String,
}

impl JobRequisition {
    /// Mapper record with the JSON columns parsed in place.
    pub fn to_record(&self) -> Result<Record> {
        let mut record = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Record::new(),
        };
        for (key, raw) in [
            ("breakdown_codes", &self.breakdown_codes),
            ("power_options", &self.power_options),
            ("machine_options", &self.machine_options),
            ("handle_by", &self.handle_by),
            ("materials_used", &self.materials_used),
        ] {
            record.insert(key.into(), parse_json_column(raw));
        }
        Ok(record)
    }
}

/// Input for raising or completing a requisition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveJobRequisition {
    pub requisition_no: Option<String>,
    pub form_type: Option<String>,
    pub occur_date: Option<String>,
    pub occur_time: Option<String>,
    pub requestor_name: Option<String>,
    pub req_dept: Option<String>,
    pub req_dept_hod: Option<String>,
    pub equipment_name: Option<String>,
    pub equipment_no: Option<String>,
    pub equipment_install_date: Option<String>,
    pub machine_no: Option<String>,
    pub purchase_req_no: Option<String>,
    pub require_completion_date: Option<String>,
    pub completion_time: Option<String>,
    pub total_hours: Option<String>,
    pub existing_condition: Option<String>,
    pub root_cause: Option<String>,
    pub correction: Option<String>,
    pub technician_name: Option<String>,
    pub material_retrieval: Option<String>,
    pub cleaning_inspection: Option<String>,
    pub schedule_start_date: Option<String>,
    pub schedule_start_time: Option<String>,
    pub schedule_end_date: Option<String>,
    pub schedule_end_time: Option<String>,
    pub inspection_result: Option<String>,
    pub inspection_remarks: Option<String>,
    pub inspection_checked_by: Option<String>,
    pub clean_retr_checked_by: Option<String>,
    pub cost_incurred: Option<f64>,
    #[serde(default)]
    pub breakdown_codes: Value,
    #[serde(default)]
    pub power_options: Value,
    #[serde(default)]
    pub machine_options: Value,
    #[serde(default)]
    pub handle_by: Value,
    #[serde(default)]
    pub materials_used: Value,
}

/// Filters for the machine history card.
#[derive(Debug, Clone, Default)]
pub struct RequisitionFilter {
    pub equipment_name: Option<String>,
    pub equipment_no: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

fn json_text(value: &Value) -> String {
    if value.is_null() {
        "[]".to_string()
    } else {
        value.to_string()
    }
}

// ============================================================================
// Queries
// ============================================================================

/// Create a new requisition.
pub async fn create_requisition(
    pool: &DbPool,
    input: SaveJobRequisition,
) -> Result<JobRequisition> {
    let form_type = input.form_type.as_deref().unwrap_or("request");
    if !matches!(form_type, "request" | "action") {
        return Err(Error::Validation(format!("Unknown form_type: {}", form_type)));
    }

    sqlx::query_as::<_, JobRequisition>(
        r#"
        INSERT INTO job_requisitions (
            id, requisition_no, form_type, occur_date, occur_time, requestor_name, req_dept,
            req_dept_hod, equipment_name, equipment_no, equipment_install_date, machine_no,
            purchase_req_no, require_completion_date, completion_time, total_hours,
            existing_condition, root_cause, correction, technician_name, material_retrieval,
            cleaning_inspection, schedule_start_date, schedule_start_time, schedule_end_date,
            schedule_end_time, inspection_result, inspection_remarks, inspection_checked_by,
            clean_retr_checked_by, cost_incurred, breakdown_codes, power_options,
            machine_options, handle_by, materials_used
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(&input.requisition_no)
    .bind(form_type)
    .bind(&input.occur_date)
    .bind(&input.occur_time)
    .bind(&input.requestor_name)
    .bind(&input.req_dept)
    .bind(&input.req_dept_hod)
    .bind(&input.equipment_name)
    .bind(&input.equipment_no)
    .bind(&input.equipment_install_date)
    .bind(&input.machine_no)
    .bind(&input.purchase_req_no)
    .bind(&input.require_completion_date)
    .bind(&input.completion_time)
    .bind(&input.total_hours)
    .bind(&input.existing_condition)
    .bind(&input.root_cause)
    .bind(&input.correction)
    .bind(&input.technician_name)
    .bind(&input.material_retrieval)
    .bind(&input.cleaning_inspection)
    .bind(&input.schedule_start_date)
    .bind(&input.schedule_start_time)
    .bind(&input.schedule_end_date)
    .bind(&input.schedule_end_time)
    .bind(&input.inspection_result)
    .bind(&input.inspection_remarks)
    .bind(&input.inspection_checked_by)
    .bind(&input.clean_retr_checked_by)
    .bind(input.cost_incurred)
    .bind(json_text(&input.breakdown_codes))
    .bind(json_text(&input.power_options))
    .bind(json_text(&input.machine_options))
    .bind(json_text(&input.handle_by))
    .bind(json_text(&input.materials_used))
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

/// Get a requisition by ID.
pub async fn get_requisition(pool: &DbPool, id: &str) -> Result<JobRequisition> {
    sqlx::query_as::<_, JobRequisition>("SELECT * FROM job_requisitions WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Job requisition not found: {}", id)))
}

/// List requisitions by occurrence date, oldest first.
pub async fn list_requisitions(
    pool: &DbPool,
    filter: &RequisitionFilter,
) -> Result<Vec<JobRequisition>> {
    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT * FROM job_requisitions WHERE 1 = 1");

    if let Some(name) = &filter.equipment_name {
        query.push(" AND equipment_name = ").push_bind(name.clone());
    }
    if let Some(no) = &filter.equipment_no {
        query.push(" AND equipment_no = ").push_bind(no.clone());
    }
    if let Some(from) = &filter.from_date {
        query.push(" AND occur_date >= ").push_bind(from.clone());
    }
    if let Some(to) = &filter.to_date {
        query.push(" AND occur_date <= ").push_bind(to.clone());
    }
    query.push(" ORDER BY occur_date, rowid");

    query
        .build_query_as::<JobRequisition>()
        .fetch_all(pool)
        .await
        .map_err(Error::Database)
}

/// Delete a requisition.
pub async fn delete_requisition(pool: &DbPool, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM job_requisitions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Job requisition not found: {}", id)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_pool, initialize_schema};
    use serde_json::json;

    #[tokio::test]
    async fn test_history_filter_orders_by_occurrence() {
        let pool = init_pool(":memory:").await.unwrap();
        initialize_schema(&pool).await.unwrap();

        for (no, date) in [("MJR-2", "2024-02-10"), ("MJR-1", "2024-01-05"), ("MJR-3", "2024-03-01")] {
            create_requisition(
                &pool,
                SaveJobRequisition {
                    requisition_no: Some(no.into()),
                    occur_date: Some(date.into()),
                    equipment_name: Some("Extruder".into()),
                    breakdown_codes: json!(["A"]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }

        let rows = list_requisitions(
            &pool,
            &RequisitionFilter {
                equipment_name: Some("Extruder".into()),
                to_date: Some("2024-02-28".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let numbers: Vec<_> = rows.iter().filter_map(|r| r.requisition_no.as_deref()).collect();
        assert_eq!(numbers, vec!["MJR-1", "MJR-2"]);
        assert_eq!(rows[0].to_record().unwrap()["breakdown_codes"], json!(["A"]));
    }

    #[tokio::test]
    async fn test_unknown_form_type_rejected() {
        let pool = init_pool(":memory:").await.unwrap();
        initialize_schema(&pool).await.unwrap();
        let err = create_requisition(
            &pool,
            SaveJobRequisition {
                form_type: Some("other".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
