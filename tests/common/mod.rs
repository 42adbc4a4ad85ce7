#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use tower::ServiceExt;

pub async fn setup_test_db() -> SqlitePool {
    // Single connection so every query sees the same in-memory database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .unwrap();

    sqlx::migrate!("./migrations").run(&pool).await.unwrap();

    pool
}

pub async fn create_test_app(pool: SqlitePool) -> Router {
    recipeshare::create_app(pool).unwrap()
}

/// Drive the router with a JSON request; returns status and decoded body
pub async fn send_json(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");

    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }

    let request = builder
        .body(match body {
            Some(value) => Body::from(value.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}

/// Register a user and return (token, user_id)
pub async fn register_user(router: &Router, email: &str, name: &str) -> (String, String) {
    let (status, body) = send_json(
        router,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "email": email, "password": "password123", "name": name })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "registration failed: {body}");

    (
        body["token"].as_str().unwrap().to_string(),
        body["user"]["id"].as_str().unwrap().to_string(),
    )
}

/// Create a recipe owned by the token's user and return its id
pub async fn create_recipe(router: &Router, token: &str, title: &str) -> String {
    let (status, body) = send_json(
        router,
        "POST",
        "/recipes",
        Some(token),
        Some(json!({
            "title": title,
            "description": "",
            "ingredients": ["water", "salt"],
            "steps": ["boil", "season"],
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "recipe creation failed: {body}");

    body["id"].as_str().unwrap().to_string()
}
