use sqlx::PgPool;
use uuid::Uuid;

use crate::models::User;

use super::{is_unique_violation, DbError};

pub async fn list(pool: &PgPool) -> Result<Vec<User>, DbError> {
    let users = sqlx::query_as::<_, User>(
        "SELECT id, username, created_at FROM users ORDER BY username",
    )
    .fetch_all(pool)
    .await?;
    Ok(users)
}

pub async fn get(pool: &PgPool, id: Uuid) -> Result<Option<User>, DbError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, created_at FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, DbError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, created_at FROM users WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn insert(pool: &PgPool, username: &str) -> Result<User, DbError> {
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (username) VALUES ($1) RETURNING id, username, created_at",
    )
    .bind(username)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            DbError::Conflict(format!("username '{}' is already taken", username))
        } else {
            DbError::Sqlx(e)
        }
    })?;
    Ok(user)
}
