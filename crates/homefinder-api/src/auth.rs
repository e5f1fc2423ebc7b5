use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use jsonwebtoken::{EncodingKey, Header, encode};

use homefinder_db::Database;
use homefinder_db::models::UserRow;
use homefinder_types::api::{
    AuthResponse, Claims, LoginRequest, ProfileResponse, RegisterRequest, UpdateProfileRequest,
    UpdateProfileResponse,
};
use homefinder_types::models::Role;

use crate::convert::user_from_row;
use crate::error::{ApiError, ApiResult, FieldError};
use crate::extract::Json;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let mut errors = Vec::new();
    if req.username.trim().len() < 3 {
        errors.push(FieldError::new("username", "Username must be at least 3 characters"));
    }
    if req.full_name.trim().len() < 2 {
        errors.push(FieldError::new("fullName", "Full name must be at least 2 characters"));
    }
    if !looks_like_email(&req.email) {
        errors.push(FieldError::new("email", "Must provide a valid email"));
    }
    if req.password.len() < 6 {
        errors.push(FieldError::new("password", "Password must be at least 6 characters"));
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    if state.db.get_user_by_email(&req.email)?.is_some() {
        return Err(ApiError::Conflict {
            message: "Email already registered".into(),
            field: "email".into(),
        });
    }
    if state.db.get_user_by_username(&req.username)?.is_some() {
        return Err(ApiError::Conflict {
            message: "Username already taken".into(),
            field: "username".into(),
        });
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))?
        .to_string();

    // The pre-checks race with concurrent registrations; the UNIQUE
    // indexes are authoritative, so a constraint hit here is still a
    // duplicate, not a storage failure.
    let user = state
        .db
        .create_user(
            &req.username,
            req.full_name.trim(),
            &req.email,
            &password_hash,
            req.role.as_str(),
        )
        .map_err(|e| {
            if homefinder_db::is_unique_violation(&e) {
                ApiError::Conflict {
                    message: "Username or email already exists".into(),
                    field: "email".into(),
                }
            } else {
                ApiError::Internal(e)
            }
        })?;

    let token = create_token(&state.jwt_secret, &user)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "Registration successful".into(),
            token,
            user: user_from_row(&user),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .db
        .get_user_by_email(&req.email)?
        .ok_or(ApiError::Unauthorized("Invalid email or password"))?;

    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored hash unreadable: {}", e)))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized("Invalid email or password"))?;

    let token = create_token(&state.jwt_secret, &user)?;

    Ok(Json(AuthResponse {
        message: "Login successful".into(),
        token,
        user: user_from_row(&user),
    }))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .db
        .get_user_by_id(claims.sub)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(ProfileResponse {
        user: user_from_row(&user),
    }))
}

/// PATCH /users/:id — self-only profile update (fullName and email).
pub async fn update_profile(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<impl IntoResponse> {
    if user_id != claims.sub {
        return Err(ApiError::Forbidden(
            "Forbidden: You can only update your own profile".into(),
        ));
    }

    let mut errors = Vec::new();
    if req.full_name.trim().len() < 2 {
        errors.push(FieldError::new("fullName", "Full name must be at least 2 characters"));
    }
    if !looks_like_email(&req.email) {
        errors.push(FieldError::new("email", "Must be a valid email"));
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    if let Some(existing) = state.db.get_user_by_email(&req.email)?
        && existing.id != claims.sub
    {
        return Err(ApiError::Conflict {
            message: "Email already in use by another account".into(),
            field: "email".into(),
        });
    }

    let updated = state
        .db
        .update_user(claims.sub, req.full_name.trim(), &req.email)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(UpdateProfileResponse {
        message: "Profile updated successfully".into(),
        user: user_from_row(&updated),
    }))
}

fn create_token(secret: &str, user: &UserRow) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        role: Role::parse(&user.role).unwrap_or(Role::Tenant),
        exp: (chrono::Utc::now() + chrono::Duration::days(7)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Deliberately loose: one '@' with a dotted domain, like the original's
/// form-level check. The unique index is the real gate.
fn looks_like_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}
