//! Profile update handler

use axum::{Extension, Json, extract::State};
use serde::Deserialize;
use validator::Validate;

use crate::auth::hash_password;
use crate::error::AppError;
use crate::middleware::Auth;
use crate::queries::user;
use crate::routes::AppState;
use crate::routes::auth::UserProfile;

/// Partial update; absent fields keep their current values
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfilePayload {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: Option<String>,
}

/// PUT /users/profile
#[tracing::instrument(skip(state, payload), fields(user_id = %auth.user_id))]
pub async fn put_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<Auth>,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<Json<UserProfile>, AppError> {
    payload.validate()?;

    let current = user::find_by_id(&state.pool, &auth.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let email = payload
        .email
        .map(|e| e.trim().to_lowercase())
        .unwrap_or(current.email);
    let name = payload
        .name
        .map(|n| n.trim().to_string())
        .unwrap_or(current.name);
    let hashed = match payload.password {
        Some(password) => hash_password(&password)?,
        None => current.hashed_password,
    };

    user::update_user(&state.pool, &auth.user_id, &email, &name, &hashed).await?;

    tracing::info!("Profile updated");

    let updated = user::find_by_id(&state.pool, &auth.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(updated.into()))
}
