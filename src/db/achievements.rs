use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Achievement;

use super::{is_unique_violation, DbError};

pub async fn list(pool: &PgPool) -> Result<Vec<Achievement>, DbError> {
    let achievements = sqlx::query_as::<_, Achievement>(
        "SELECT id, name FROM achievements ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(achievements)
}

pub async fn get(pool: &PgPool, id: Uuid) -> Result<Option<Achievement>, DbError> {
    let achievement = sqlx::query_as::<_, Achievement>(
        "SELECT id, name FROM achievements WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(achievement)
}

pub async fn insert(pool: &PgPool, name: &str) -> Result<Achievement, DbError> {
    let achievement = sqlx::query_as::<_, Achievement>(
        "INSERT INTO achievements (name) VALUES ($1) RETURNING id, name",
    )
    .bind(name)
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_duplicate(e, name))?;
    Ok(achievement)
}

pub async fn update(pool: &PgPool, id: Uuid, name: &str) -> Result<Achievement, DbError> {
    let achievement = sqlx::query_as::<_, Achievement>(
        "UPDATE achievements SET name = $2 WHERE id = $1 RETURNING id, name",
    )
    .bind(id)
    .bind(name)
    .fetch_optional(pool)
    .await
    .map_err(|e| conflict_on_duplicate(e, name))?
    .ok_or_else(|| DbError::NotFound(format!("achievement {} not found", id)))?;
    Ok(achievement)
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    let deleted = sqlx::query("DELETE FROM achievements WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(DbError::NotFound(format!("achievement {} not found", id)));
    }
    Ok(())
}

fn conflict_on_duplicate(err: sqlx::Error, name: &str) -> DbError {
    if is_unique_violation(&err) {
        DbError::Conflict(format!("achievement '{}' already exists", name))
    } else {
        DbError::Sqlx(err)
    }
}
