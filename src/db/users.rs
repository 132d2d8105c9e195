//! User directory queries.
//!
//! Users are referenced by quality alerts (reporter name and department).

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::DbPool;

// ============================================================================
// Types
// ============================================================================

/// User record from the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub email: Option<String>,
    pub department: Option<String>,
    pub created_at: String,
}

/// Input for creating a user.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub full_name: String,
    pub email: Option<String>,
    pub department: Option<String>,
}

// ============================================================================
// Queries
// ============================================================================

/// Create a new user.
pub async fn create_user(pool: &DbPool, input: CreateUser) -> Result<User> {
    if input.full_name.trim().is_empty() {
        return Err(Error::Validation("full_name is required".into()));
    }

    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, full_name, email, department)
        VALUES (?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(input.full_name.trim())
    .bind(&input.email)
    .bind(&input.department)
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

/// Get a user by ID.
pub async fn get_user(pool: &DbPool, id: &str) -> Result<User> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User not found: {}", id)))
}

/// List all users ordered by name.
pub async fn list_users(pool: &DbPool) -> Result<Vec<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY full_name")
        .fetch_all(pool)
        .await
        .map_err(Error::Database)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_pool, initialize_schema};

    #[tokio::test]
    async fn test_create_and_get_user() {
        let pool = init_pool(":memory:").await.unwrap();
        initialize_schema(&pool).await.unwrap();

        let user = create_user(
            &pool,
            CreateUser {
                full_name: "  Asha Rao ".into(),
                email: None,
                department: Some("QA".into()),
            },
        )
        .await
        .unwrap();

        assert_eq!(user.full_name, "Asha Rao");
        let fetched = get_user(&pool, &user.id).await.unwrap();
        assert_eq!(fetched.department.as_deref(), Some("QA"));
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let pool = init_pool(":memory:").await.unwrap();
        initialize_schema(&pool).await.unwrap();

        let err = create_user(
            &pool,
            CreateUser {
                full_name: " ".into(),
                email: None,
                department: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
