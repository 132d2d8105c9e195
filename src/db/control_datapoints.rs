//! Control datapoint queries.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite};

use super::DbPool;

// ============================================================================
// Types
// ============================================================================

/// Control datapoint record from the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ControlDatapoint {
    pub id: i64,
    pub control_type: Option<String>,
    pub department: Option<String>,
    pub parameter_name: Option<String>,
    pub target_value: Option<f64>,
    pub actual_value: Option<f64>,
    pub tolerance_min: Option<f64>,
    pub tolerance_max: Option<f64>,
    pub status: Option<String>,
    pub remarks: Option<String>,
    pub machine: Option<String>,
    pub gcas: Option<String>,
    pub product: Option<String>,
    pub created_by_name: Option<String>,
    pub created_at: String,
}

impl ControlDatapoint {
    /// Whether the actual value sits inside the tolerance band.
    pub fn within_tolerance(&self) -> Option<bool> {
        let actual = self.actual_value?;
        let above_min = self.tolerance_min.map_or(true, |min| actual >= min);
        let below_max = self.tolerance_max.map_or(true, |max| actual <= max);
        Some(above_min && below_max)
    }
}

/// Input for recording a datapoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateControlDatapoint {
    pub control_type: Option<String>,
    pub department: Option<String>,
    pub parameter_name: Option<String>,
    pub target_value: Option<f64>,
    pub actual_value: Option<f64>,
    pub tolerance_min: Option<f64>,
    pub tolerance_max: Option<f64>,
    pub status: Option<String>,
    pub remarks: Option<String>,
    pub machine: Option<String>,
    pub gcas: Option<String>,
    pub product: Option<String>,
    pub created_by_name: Option<String>,
}

/// Export filters. Dates compare against `created_at`.
#[derive(Debug, Clone, Default)]
pub struct DatapointFilter {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub department: Option<String>,
    pub control_type: Option<String>,
    pub machine: Option<String>,
    pub gcas: Option<String>,
    pub product: Option<String>,
}

// ============================================================================
// Queries
// ============================================================================

/// Record a new datapoint. Status is derived from the tolerance band when omitted.
pub async fn create_datapoint(
    pool: &DbPool,
    input: CreateControlDatapoint,
) -> Result<ControlDatapoint> {
    if let (Some(min), Some(max)) = (input.tolerance_min, input.tolerance_max) {
        if min > max {
            return Err(Error::Validation(
                "tolerance_min must not exceed tolerance_max".into(),
            ));
        }
    }

    let result = sqlx::query(
        r#"
        INSERT INTO control_datapoints (
            control_type, department, parameter_name, target_value, actual_value,
            tolerance_min, tolerance_max, status, remarks, machine, gcas, product, created_by_name
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.control_type)
    .bind(&input.department)
    .bind(&input.parameter_name)
    .bind(input.target_value)
    .bind(input.actual_value)
    .bind(input.tolerance_min)
    .bind(input.tolerance_max)
    .bind(&input.status)
    .bind(&input.remarks)
    .bind(&input.machine)
    .bind(&input.gcas)
    .bind(&input.product)
    .bind(&input.created_by_name)
    .execute(pool)
    .await?;

    let mut datapoint = get_datapoint(pool, result.last_insert_rowid()).await?;
    if datapoint.status.is_none() {
        if let Some(ok) = datapoint.within_tolerance() {
            let status = if ok { "Within Limit" } else { "Out of Limit" };
            sqlx::query("UPDATE control_datapoints SET status = ? WHERE id = ?")
                .bind(status)
                .bind(datapoint.id)
                .execute(pool)
                .await?;
            datapoint.status = Some(status.to_string());
        }
    }
    Ok(datapoint)
}

/// Get a datapoint by ID.
pub async fn get_datapoint(pool: &DbPool, id: i64) -> Result<ControlDatapoint> {
    sqlx::query_as::<_, ControlDatapoint>("SELECT * FROM control_datapoints WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Control datapoint not found: {}", id)))
}

/// List datapoints matching a filter, newest first.
pub async fn list_datapoints(
    pool: &DbPool,
    filter: &DatapointFilter,
) -> Result<Vec<ControlDatapoint>> {
    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT * FROM control_datapoints WHERE 1 = 1");

    if let Some(start) = &filter.start_date {
        query.push(" AND created_at >= ").push_bind(start.clone());
    }
    if let Some(end) = &filter.end_date {
        query.push(" AND created_at <= ").push_bind(end.clone());
    }
    for (column, value) in [
        ("department", &filter.department),
        ("control_type", &filter.control_type),
        ("machine", &filter.machine),
        ("gcas", &filter.gcas),
        ("product", &filter.product),
    ] {
        if let Some(value) = value {
            query
                .push(format!(" AND {} = ", column))
                .push_bind(value.clone());
        }
    }
    query.push(" ORDER BY created_at DESC, id DESC");

    query
        .build_query_as::<ControlDatapoint>()
        .fetch_all(pool)
        .await
        .map_err(Error::Database)
}

/// Delete a datapoint.
pub async fn delete_datapoint(pool: &DbPool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM control_datapoints WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Control datapoint not found: {}", id)));
    }

    Ok(())
}
