use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::achievement::Achievement;

/// Cat row as selected from the database, joined with the owner's username.
#[derive(Debug, Clone, FromRow)]
pub struct CatRow {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub birth_year: i32,
    pub owner_id: Uuid,
    pub owner_username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// API output shape: the row plus its embedded achievements.
#[derive(Debug, Clone, Serialize)]
pub struct Cat {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub birth_year: i32,
    pub owner_id: Uuid,
    pub owner: String,
    pub achievements: Vec<Achievement>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cat {
    pub fn from_row(row: CatRow, achievements: Vec<Achievement>) -> Self {
        Self {
            id: row.id,
            name: row.name,
            color: row.color,
            birth_year: row.birth_year,
            owner_id: row.owner_id,
            owner: row.owner_username,
            achievements,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Create/replace payload. The owner is never part of the payload; it is
/// bound from the requesting principal at creation and fixed thereafter.
#[derive(Debug, Deserialize)]
pub struct CatInput {
    pub name: String,
    pub color: String,
    pub birth_year: i32,
    #[serde(default)]
    pub achievements: Vec<Uuid>,
}

/// Partial-update payload: absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
pub struct CatPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub birth_year: Option<i32>,
    pub achievements: Option<Vec<Uuid>>,
}
