use axum::extract::{Extension, Path};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::User;

// Users are a read-only resource: the router exposes GET only.

/// GET /api/users - List users
pub async fn list(Extension(pool): Extension<PgPool>) -> ApiResult<Vec<User>> {
    let users = db::users::list(&pool).await?;
    Ok(ApiResponse::success(users))
}

/// GET /api/users/:id - Retrieve a single user
pub async fn retrieve(
    Path(id): Path<Uuid>,
    Extension(pool): Extension<PgPool>,
) -> ApiResult<User> {
    let user = db::users::get(&pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("user {} not found", id)))?;
    Ok(ApiResponse::success(user))
}
