use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use sqlx::SqlitePool;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::error::AppError;
use crate::middleware::auth_middleware;

pub mod auth;
pub mod health;
pub mod profile;
pub mod recipes;

pub use auth::{AuthResponse, UserProfile};
pub use recipes::RecipeResponse;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt_secret: String,
    pub token_ttl_seconds: u64,
}

/// Unmatched routes get the same JSON error envelope as everything else
pub async fn fallback() -> impl IntoResponse {
    AppError::NotFound
}

/// Build the application router
///
/// Public routes (register, login, recipe reads) are merged with protected
/// routes wrapped in the bearer-token middleware. The CORS allow-list is a
/// single configured origin, with "*" meaning any origin.
pub fn router(state: AppState, allowed_origin: &str) -> anyhow::Result<Router> {
    let cors = cors_layer(allowed_origin)?;

    let protected_routes = Router::new()
        .route("/auth/me", get(auth::get_me))
        .route("/users/profile", put(profile::put_profile))
        .route("/recipes", post(recipes::post_create_recipe))
        .route("/recipes/favorites", get(recipes::get_favorites))
        .route(
            "/recipes/{id}",
            put(recipes::put_update_recipe).delete(recipes::delete_recipe),
        )
        .route("/recipes/{id}/rate", post(recipes::post_rate_recipe))
        .route("/recipes/{id}/favorite", post(recipes::post_toggle_favorite))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let app = Router::new()
        // Health check endpoints (no auth required)
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .with_state(state.pool.clone())
        .merge(
            Router::new()
                .route("/auth/register", post(auth::post_register))
                .route("/auth/login", post(auth::post_login))
                .route("/recipes", get(recipes::get_recipe_list))
                .route("/recipes/{id}", get(recipes::get_recipe_by_id))
                .route("/recipes/user/{user_id}", get(recipes::get_user_recipes))
                .merge(protected_routes)
                .with_state(state),
        )
        .fallback(fallback)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

fn cors_layer(allowed_origin: &str) -> anyhow::Result<CorsLayer> {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let cors = if allowed_origin == "*" {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(allowed_origin.parse::<HeaderValue>()?)
    };

    Ok(cors)
}
