use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use homefinder_types::api::Claims;
use homefinder_types::models::Role;

use crate::auth::AppState;
use crate::error::ApiError;

/// Extract and validate the bearer token from the Authorization header,
/// injecting `Claims` for downstream handlers.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized(
            "Unauthorized: Missing or invalid token format",
        ))?;

    let token = auth_header.strip_prefix("Bearer ").ok_or(
        ApiError::Unauthorized("Unauthorized: Missing or invalid token format"),
    )?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized("Unauthorized: Invalid token"))?;

    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}

/// Role guard for property management routes. Must be layered inside
/// `require_auth` so the claims extension is present.
pub async fn require_owner(req: Request, next: Next) -> Result<Response, ApiError> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .ok_or(ApiError::Unauthorized("Unauthorized: Missing or invalid token format"))?;

    if claims.role != Role::Owner {
        return Err(ApiError::Forbidden(
            "Forbidden: Only property owners can perform this action".into(),
        ));
    }

    Ok(next.run(req).await)
}
