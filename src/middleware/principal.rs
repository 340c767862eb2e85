use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::verify_token;
use crate::error::ApiError;
use crate::policy::Principal;

/// Identifies the requesting principal and injects it into request
/// extensions. Unlike a login gate, this middleware lets anonymous requests
/// through: reads are open to everyone, so deciding what anonymous callers
/// may do belongs to the access policy, not here. A present-but-invalid
/// token is still a hard 401.
pub async fn identify_principal(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = match bearer_token(&headers)? {
        None => Principal::Anonymous,
        Some(token) => {
            let claims = verify_token(&token)?;
            Principal::User { id: claims.sub, username: claims.username }
        }
    };

    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

/// Extract the bearer token from the Authorization header, if any.
fn bearer_token(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    let auth_header = match headers.get("authorization") {
        Some(value) => value,
        None => return Ok(None),
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header format"))?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthorized("Authorization header must use Bearer token format"))?;

    if token.trim().is_empty() {
        return Err(ApiError::unauthorized("Empty bearer token"));
    }

    Ok(Some(token.to_string()))
}
