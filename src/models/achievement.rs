use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A named tag attachable to cats. Managed independently of any cat.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Achievement {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AchievementInput {
    pub name: String,
}
