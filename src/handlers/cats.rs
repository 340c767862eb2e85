use axum::{
    extract::{Extension, Path, Query},
    response::Json,
};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{Cat, CatInput, CatPatch};
use crate::policy::{self, AccessContext, Action, Principal};
use crate::query::CatQuery;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Exact-match filters
    pub color: Option<String>,
    pub birth_year: Option<i32>,
    /// Substring search over cat name, owner username, achievement names
    pub search: Option<String>,
    /// Comma-separated ordering fields; `-` prefix for descending
    pub ordering: Option<String>,
}

/// GET /api/cats - List cats, open to anyone including anonymous
pub async fn list(
    Query(params): Query<ListParams>,
    Extension(pool): Extension<PgPool>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Vec<Cat>> {
    policy::authorize(&AccessContext::collection(Action::List, principal))?;

    let query = CatQuery {
        color: params.color,
        birth_year: params.birth_year,
        search: params.search,
        ordering: params.ordering,
    };
    let parts = query.to_sql()?;

    let cats = db::cats::list(&pool, &parts).await?;
    Ok(ApiResponse::success(cats))
}

/// POST /api/cats - Create a cat; the requesting principal becomes its owner
pub async fn create(
    Extension(pool): Extension<PgPool>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CatInput>,
) -> ApiResult<Cat> {
    policy::authorize(&AccessContext::collection(Action::Create, principal.clone()))?;
    validate_input(&payload)?;

    // Permission check above guarantees authentication; attribution binds
    // the owner that all later ownership checks compare against.
    let owner_id = policy::owner_on_create(&principal)?;

    let cat = db::cats::insert(&pool, owner_id, &payload).await?;
    Ok(ApiResponse::created(cat))
}

/// GET /api/cats/:id - Retrieve a single cat, open to anyone
pub async fn retrieve(
    Path(id): Path<Uuid>,
    Extension(pool): Extension<PgPool>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Cat> {
    let cat = fetch(&pool, id).await?;
    policy::authorize(&AccessContext::object(Action::Retrieve, principal, cat.owner_id))?;
    Ok(ApiResponse::success(cat))
}

/// PUT /api/cats/:id - Full update, owner only
pub async fn update(
    Path(id): Path<Uuid>,
    Extension(pool): Extension<PgPool>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CatInput>,
) -> ApiResult<Cat> {
    let cat = fetch(&pool, id).await?;
    policy::authorize(&AccessContext::object(Action::Update, principal, cat.owner_id))?;
    validate_input(&payload)?;

    let cat = db::cats::replace(&pool, id, &payload).await?;
    Ok(ApiResponse::success(cat))
}

/// PATCH /api/cats/:id - Partial update, owner only
pub async fn partial_update(
    Path(id): Path<Uuid>,
    Extension(pool): Extension<PgPool>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CatPatch>,
) -> ApiResult<Cat> {
    let cat = fetch(&pool, id).await?;
    policy::authorize(&AccessContext::object(Action::PartialUpdate, principal, cat.owner_id))?;

    if let Some(name) = &payload.name {
        if name.trim().is_empty() {
            return Err(ApiError::bad_request("name must not be empty"));
        }
    }

    let cat = db::cats::patch(&pool, id, &payload).await?;
    Ok(ApiResponse::success(cat))
}

/// DELETE /api/cats/:id - Delete, owner only
pub async fn destroy(
    Path(id): Path<Uuid>,
    Extension(pool): Extension<PgPool>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<()> {
    let cat = fetch(&pool, id).await?;
    policy::authorize(&AccessContext::object(Action::Destroy, principal, cat.owner_id))?;

    db::cats::delete(&pool, id).await?;
    Ok(ApiResponse::<()>::no_content())
}

async fn fetch(pool: &PgPool, id: Uuid) -> Result<Cat, ApiError> {
    let cat = db::cats::get(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("cat {} not found", id)))?;
    Ok(cat)
}

fn validate_input(input: &CatInput) -> Result<(), ApiError> {
    if input.name.trim().is_empty() {
        return Err(ApiError::bad_request("name must not be empty"));
    }
    if input.color.trim().is_empty() {
        return Err(ApiError::bad_request("color must not be empty"));
    }
    Ok(())
}
