use axum::{
    extract::{Extension, Path},
    response::Json,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{Achievement, AchievementInput};

// Achievements carry no access restriction: any caller may manage them.

/// GET /api/achievements - List achievements
pub async fn list(Extension(pool): Extension<PgPool>) -> ApiResult<Vec<Achievement>> {
    let achievements = db::achievements::list(&pool).await?;
    Ok(ApiResponse::success(achievements))
}

/// POST /api/achievements - Create an achievement
pub async fn create(
    Extension(pool): Extension<PgPool>,
    Json(payload): Json<AchievementInput>,
) -> ApiResult<Achievement> {
    let name = validated_name(&payload)?;
    let achievement = db::achievements::insert(&pool, name).await?;
    Ok(ApiResponse::created(achievement))
}

/// GET /api/achievements/:id - Retrieve a single achievement
pub async fn retrieve(
    Path(id): Path<Uuid>,
    Extension(pool): Extension<PgPool>,
) -> ApiResult<Achievement> {
    let achievement = db::achievements::get(&pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("achievement {} not found", id)))?;
    Ok(ApiResponse::success(achievement))
}

/// PUT/PATCH /api/achievements/:id - Rename an achievement. The resource has
/// a single writable field, so full and partial update coincide.
pub async fn update(
    Path(id): Path<Uuid>,
    Extension(pool): Extension<PgPool>,
    Json(payload): Json<AchievementInput>,
) -> ApiResult<Achievement> {
    let name = validated_name(&payload)?;
    let achievement = db::achievements::update(&pool, id, name).await?;
    Ok(ApiResponse::success(achievement))
}

/// DELETE /api/achievements/:id - Delete an achievement
pub async fn destroy(
    Path(id): Path<Uuid>,
    Extension(pool): Extension<PgPool>,
) -> ApiResult<()> {
    db::achievements::delete(&pool, id).await?;
    Ok(ApiResponse::<()>::no_content())
}

fn validated_name(payload: &AchievementInput) -> Result<&str, ApiError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("name must not be empty"));
    }
    Ok(name)
}
