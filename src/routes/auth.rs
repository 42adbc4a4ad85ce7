//! Registration, login and current-user handlers
//!
//! Tokens are stateless signed claims; nothing about a session is stored
//! server side. Unknown email and wrong password produce the same error so
//! the API does not reveal which emails are registered.

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::{generate_token, hash_password, verify_password};
use crate::error::AppError;
use crate::middleware::Auth;
use crate::queries::user::{self, UserRow};
use crate::routes::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterPayload {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginPayload {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub password: String,
}

/// Public profile; the password hash never leaves the server
#[derive(Debug, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            name: row.name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

/// POST /auth/register
#[tracing::instrument(skip(state, payload))]
pub async fn post_register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let email = payload.email.trim().to_lowercase();
    let hashed = hash_password(&payload.password)?;

    let user = user::insert_user(&state.pool, &email, payload.name.trim(), &hashed).await?;

    tracing::info!(user_id = %user.id, "User registered");

    let token = generate_token(user.id.clone(), &state.jwt_secret, state.token_ttl_seconds)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

/// POST /auth/login
#[tracing::instrument(skip(state, payload))]
pub async fn post_login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.validate()?;

    let email = payload.email.trim().to_lowercase();

    let user = user::find_by_email(&state.pool, &email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&payload.password, &user.hashed_password)? {
        return Err(AppError::InvalidCredentials);
    }

    tracing::info!(user_id = %user.id, "User logged in");

    let token = generate_token(user.id.clone(), &state.jwt_secret, state.token_ttl_seconds)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// GET /auth/me
#[tracing::instrument(skip(state), fields(user_id = %auth.user_id))]
pub async fn get_me(
    State(state): State<AppState>,
    Extension(auth): Extension<Auth>,
) -> Result<Json<UserProfile>, AppError> {
    let user = user::find_by_id(&state.pool, &auth.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(user.into()))
}
