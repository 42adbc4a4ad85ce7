use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::validate_token;
use crate::error::AppError;
use crate::routes::AppState;

/// Auth extension containing user_id extracted from the bearer token
#[derive(Clone, Debug)]
pub struct Auth {
    pub user_id: String,
}

/// Authentication middleware validating the `Authorization: Bearer` header
///
/// Extracts the bearer token, validates the JWT, verifies the user still
/// exists, and inserts an Auth extension with user_id. Responds 401 if:
/// - The header is missing or not a bearer credential
/// - The token is invalid or expired
/// - The user no longer exists (account deleted after issuance)
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(&req) {
        Some(token) => token,
        None => {
            tracing::debug!("Missing or malformed Authorization header");
            return AppError::Unauthorized.into_response();
        }
    };

    let user_id = match validate_token(token, &state.jwt_secret) {
        Ok(user_id) => user_id,
        Err(e) => {
            tracing::debug!("Invalid bearer token: {:?}", e);
            return AppError::Unauthorized.into_response();
        }
    };

    let user_exists = sqlx::query("SELECT id FROM users WHERE id = ?1")
        .bind(&user_id)
        .fetch_optional(&state.pool)
        .await;

    match user_exists {
        Ok(Some(_)) => {
            req.extensions_mut().insert(Auth { user_id });
            next.run(req).await
        }
        Ok(None) => {
            tracing::warn!("Token for nonexistent user {}", user_id);
            AppError::Unauthorized.into_response()
        }
        Err(e) => AppError::Database(e).into_response(),
    }
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
