pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod observability;
pub mod queries;
pub mod routes;

pub use routes::AppState;

/// Create app router for testing
///
/// Builds the Axum router with all routes configured against the given
/// pool, useful for integration testing without starting the full server.
pub fn create_app(pool: sqlx::SqlitePool) -> anyhow::Result<axum::Router> {
    let state = AppState {
        pool,
        jwt_secret: "test_secret_key_minimum_32_characters_long".to_string(),
        token_ttl_seconds: 3600,
    };

    routes::router(state, "*")
}
