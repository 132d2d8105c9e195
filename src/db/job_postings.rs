//! Job posting queries.

use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::DbPool;

// ============================================================================
// Types
// ============================================================================

/// Job posting record from the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub salary_range: Option<String>,
    pub experience_needed: Option<String>,
    pub num_positions: Option<i64>,
    pub employment_type: Option<String>,
    pub department: Option<String>,
    pub program_duration: Option<String>,
    pub status: String,
    pub apply_before: Option<String>,
    pub created_at: String,
}

/// Input for creating or replacing a job posting.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveJobPosting {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub salary_range: Option<String>,
    pub experience_needed: Option<String>,
    pub num_positions: Option<i64>,
    pub employment_type: Option<String>,
    pub department: Option<String>,
    pub program_duration: Option<String>,
    pub status: Option<String>,
    pub apply_before: Option<String>,
}

impl SaveJobPosting {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("Job title is required".into()));
        }
        if let Some(n) = self.num_positions {
            if n <= 0 {
                return Err(Error::Validation(
                    "Number of positions must be a positive number".into(),
                ));
            }
        }
        if let Some(date) = self.apply_before.as_deref().filter(|d| !d.is_empty()) {
            NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
                Error::Validation(format!("apply_before is not a valid date: {}", date))
            })?;
        }
        Ok(())
    }
}

// ============================================================================
// Queries
// ============================================================================

/// Create a new job posting.
pub async fn create_job_posting(pool: &DbPool, input: SaveJobPosting) -> Result<JobPosting> {
    input.validate()?;

    sqlx::query_as::<_, JobPosting>(
        r#"
        INSERT INTO job_postings (
            id, title, description, location, salary_range, experience_needed,
            num_positions, employment_type, department, program_duration, status, apply_before
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(input.title.trim())
    .bind(&input.description)
    .bind(&input.location)
    .bind(&input.salary_range)
    .bind(&input.experience_needed)
    .bind(input.num_positions)
    .bind(&input.employment_type)
    .bind(&input.department)
    .bind(&input.program_duration)
    .bind(input.status.as_deref().unwrap_or("open"))
    .bind(input.apply_before.as_deref().filter(|d| !d.is_empty()))
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

/// Get a job posting by ID.
pub async fn get_job_posting(pool: &DbPool, id: &str) -> Result<JobPosting> {
    sqlx::query_as::<_, JobPosting>("SELECT * FROM job_postings WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Job posting not found: {}", id)))
}

/// List job postings, newest first, optionally by status.
pub async fn list_job_postings(pool: &DbPool, status: Option<&str>) -> Result<Vec<JobPosting>> {
    let postings = match status {
        Some(status) => {
            sqlx::query_as::<_, JobPosting>(
                "SELECT * FROM job_postings WHERE status = ? ORDER BY created_at DESC",
            )
            .bind(status)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, JobPosting>("SELECT * FROM job_postings ORDER BY created_at DESC")
                .fetch_all(pool)
                .await?
        }
    };
    Ok(postings)
}

/// Replace a job posting.
pub async fn update_job_posting(
    pool: &DbPool,
    id: &str,
    input: SaveJobPosting,
) -> Result<JobPosting> {
    input.validate()?;

    sqlx::query_as::<_, JobPosting>(
        r#"
        UPDATE job_postings SET
            title = ?, description = ?, location = ?, salary_range = ?,
            experience_needed = ?, num_positions = ?, employment_type = ?,
            department = ?, program_duration = ?, status = COALESCE(?, status),
            apply_before = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(input.title.trim())
    .bind(&input.description)
    .bind(&input.location)
    .bind(&input.salary_range)
    .bind(&input.experience_needed)
    .bind(input.num_positions)
    .bind(&input.employment_type)
    .bind(&input.department)
    .bind(&input.program_duration)
    .bind(&input.status)
    .bind(input.apply_before.as_deref().filter(|d| !d.is_empty()))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Job posting not found: {}", id)))
}

/// Delete a job posting.
pub async fn delete_job_posting(pool: &DbPool, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM job_postings WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Job posting not found: {}", id)));
    }

    Ok(())
}
