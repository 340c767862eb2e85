use std::collections::{BTreeSet, HashMap};

use serde_json::Value;
use sqlx::postgres::PgArguments;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::{Achievement, Cat, CatInput, CatPatch, CatRow};
use crate::query::SqlParts;

use super::DbError;

const SELECT_COLUMNS: &str = "c.id, c.name, c.color, c.birth_year, c.owner_id, \
     u.username AS owner_username, c.created_at, c.updated_at";

pub async fn list(pool: &PgPool, parts: &SqlParts) -> Result<Vec<Cat>, DbError> {
    let sql = format!(
        "SELECT {} FROM cats c JOIN users u ON u.id = c.owner_id WHERE {} ORDER BY {}",
        SELECT_COLUMNS, parts.where_clause, parts.order_by
    );

    let mut query = sqlx::query_as::<_, CatRow>(&sql);
    for param in &parts.params {
        query = bind_value(query, param);
    }
    let rows = query.fetch_all(pool).await?;

    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let mut by_cat = achievements_by_cat(pool, &ids).await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let achievements = by_cat.remove(&row.id).unwrap_or_default();
            Cat::from_row(row, achievements)
        })
        .collect())
}

pub async fn get(pool: &PgPool, id: Uuid) -> Result<Option<Cat>, DbError> {
    let sql = format!(
        "SELECT {} FROM cats c JOIN users u ON u.id = c.owner_id WHERE c.id = $1",
        SELECT_COLUMNS
    );
    let row = sqlx::query_as::<_, CatRow>(&sql).bind(id).fetch_optional(pool).await?;

    match row {
        None => Ok(None),
        Some(row) => {
            let mut by_cat = achievements_by_cat(pool, &[row.id]).await?;
            let achievements = by_cat.remove(&row.id).unwrap_or_default();
            Ok(Some(Cat::from_row(row, achievements)))
        }
    }
}

pub async fn insert(pool: &PgPool, owner_id: Uuid, input: &CatInput) -> Result<Cat, DbError> {
    let mut tx = pool.begin().await?;

    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO cats (name, color, birth_year, owner_id) \
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(&input.name)
    .bind(&input.color)
    .bind(input.birth_year)
    .bind(owner_id)
    .fetch_one(&mut *tx)
    .await?;

    set_achievements(&mut tx, id, &input.achievements).await?;
    tx.commit().await?;

    fetch_existing(pool, id).await
}

/// Full replace. Owner is deliberately untouched: ownership is bound at
/// creation and never reassigned here.
pub async fn replace(pool: &PgPool, id: Uuid, input: &CatInput) -> Result<Cat, DbError> {
    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        "UPDATE cats SET name = $2, color = $3, birth_year = $4, updated_at = now() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(&input.name)
    .bind(&input.color)
    .bind(input.birth_year)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(DbError::NotFound(format!("cat {} not found", id)));
    }

    set_achievements(&mut tx, id, &input.achievements).await?;
    tx.commit().await?;

    fetch_existing(pool, id).await
}

pub async fn patch(pool: &PgPool, id: Uuid, input: &CatPatch) -> Result<Cat, DbError> {
    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        "UPDATE cats SET \
            name = COALESCE($2, name), \
            color = COALESCE($3, color), \
            birth_year = COALESCE($4, birth_year), \
            updated_at = now() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(input.name.as_deref())
    .bind(input.color.as_deref())
    .bind(input.birth_year)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(DbError::NotFound(format!("cat {} not found", id)));
    }

    if let Some(achievement_ids) = &input.achievements {
        set_achievements(&mut tx, id, achievement_ids).await?;
    }
    tx.commit().await?;

    fetch_existing(pool, id).await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    // Join rows go with the cat via ON DELETE CASCADE
    let deleted = sqlx::query("DELETE FROM cats WHERE id = $1").bind(id).execute(pool).await?;

    if deleted.rows_affected() == 0 {
        return Err(DbError::NotFound(format!("cat {} not found", id)));
    }
    Ok(())
}

async fn fetch_existing(pool: &PgPool, id: Uuid) -> Result<Cat, DbError> {
    get(pool, id)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("cat {} not found", id)))
}

/// Replace the achievement links for a cat, validating that every
/// referenced achievement exists.
async fn set_achievements(
    tx: &mut Transaction<'_, Postgres>,
    cat_id: Uuid,
    achievement_ids: &[Uuid],
) -> Result<(), DbError> {
    sqlx::query("DELETE FROM cat_achievements WHERE cat_id = $1")
        .bind(cat_id)
        .execute(&mut **tx)
        .await?;

    if achievement_ids.is_empty() {
        return Ok(());
    }

    let distinct: BTreeSet<Uuid> = achievement_ids.iter().copied().collect();
    let ids: Vec<Uuid> = distinct.into_iter().collect();

    let known: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM achievements WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_one(&mut **tx)
            .await?;
    if known as usize != ids.len() {
        return Err(DbError::UnknownAchievement);
    }

    sqlx::query(
        "INSERT INTO cat_achievements (cat_id, achievement_id) \
         SELECT $1, unnest($2::uuid[])",
    )
    .bind(cat_id)
    .bind(&ids)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[derive(Debug, FromRow)]
struct CatAchievementRow {
    cat_id: Uuid,
    id: Uuid,
    name: String,
}

async fn achievements_by_cat(
    pool: &PgPool,
    cat_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Achievement>>, DbError> {
    if cat_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query_as::<_, CatAchievementRow>(
        "SELECT ca.cat_id, a.id, a.name FROM cat_achievements ca \
         JOIN achievements a ON a.id = ca.achievement_id \
         WHERE ca.cat_id = ANY($1) ORDER BY a.name",
    )
    .bind(cat_ids.to_vec())
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<Achievement>> = HashMap::new();
    for row in rows {
        grouped
            .entry(row.cat_id)
            .or_default()
            .push(Achievement { id: row.id, name: row.name });
    }
    Ok(grouped)
}

fn bind_value<'q, O>(
    query: sqlx::query::QueryAs<'q, Postgres, O, PgArguments>,
    value: &'q Value,
) -> sqlx::query::QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    match value {
        Value::Null => {
            let none: Option<String> = None;
            query.bind(none)
        }
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(f) = n.as_f64() {
                query.bind(f)
            } else {
                query.bind(n.to_string())
            }
        }
        Value::String(s) => query.bind(s),
        // Arrays/objects never appear in cat query params
        _ => query,
    }
}
