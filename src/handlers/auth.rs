use axum::{extract::Extension, response::Json};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;

use crate::auth::{issue_token, Claims};
use crate::config;
use crate::db;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::User;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
}

/// POST /auth/signup - Register a new user
pub async fn signup(
    Extension(pool): Extension<PgPool>,
    Json(payload): Json<SignupRequest>,
) -> ApiResult<User> {
    let username = validate_username(&payload.username)?;
    let user = db::users::insert(&pool, username).await?;

    tracing::info!(username = %user.username, "registered user");
    Ok(ApiResponse::created(user))
}

/// POST /auth/token - Issue a JWT for an existing user
pub async fn token(
    Extension(pool): Extension<PgPool>,
    Json(payload): Json<TokenRequest>,
) -> ApiResult<Value> {
    let username = validate_username(&payload.username)?;
    let user = db::users::find_by_username(&pool, username)
        .await?
        .ok_or_else(|| ApiError::unauthorized("unknown username"))?;

    let claims = Claims::new(user.id, user.username.clone());
    let token = issue_token(&claims)?;
    let expires_in = config::config().security.jwt_expiry_hours * 3600;

    Ok(ApiResponse::success(json!({
        "token": token,
        "user": user,
        "expires_in": expires_in,
    })))
}

fn validate_username(raw: &str) -> Result<&str, ApiError> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(ApiError::bad_request("username must not be empty"));
    }
    if username.len() > 150 {
        return Err(ApiError::bad_request("username must be at most 150 characters"));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')) {
        return Err(ApiError::bad_request(
            "username may contain only letters, digits and . _ -",
        ));
    }
    Ok(username)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames_are_trimmed_and_validated() {
        assert_eq!(validate_username("  murzik  ").expect("ok"), "murzik");
        assert!(validate_username("").is_err());
        assert!(validate_username("   ").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"x".repeat(151)).is_err());
        assert_eq!(validate_username("a.b_c-d").expect("ok"), "a.b_c-d");
    }
}
