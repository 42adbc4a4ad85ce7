//! Typed client facade over the HTTP API
//!
//! One method per backend operation. Every request goes through a single
//! builder helper that attaches the stored token as a bearer credential,
//! so callers never deal with headers themselves. `register` and `login`
//! store the issued token on the client.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::routes::{AuthResponse, RecipeResponse, UserProfile};

#[derive(Error, Debug)]
pub enum ApiError {
    /// Structured error returned by the server
    #[error("{kind}: {message}")]
    Api {
        status: u16,
        kind: String,
        message: String,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Error envelope produced by the server's routing layer
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    message: String,
}

/// Recipe fields sent on create and update
#[derive(Debug, Clone, Serialize)]
pub struct RecipeDraft {
    pub title: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct FavoriteStatus {
    pub favorited: bool,
    pub favorite_count: u64,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Single interception point: every outgoing request is built here and
    /// picks up the stored bearer token
    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, format!("{}{path}", self.base_url));
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body: ErrorBody = response.json().await.unwrap_or(ErrorBody {
            error: "InternalError".to_string(),
            message: format!("unexpected response status {status}"),
        });

        Err(ApiError::Api {
            status: status.as_u16(),
            kind: body.error,
            message: body.message,
        })
    }

    pub async fn register(
        &mut self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthResponse, ApiError> {
        let response = self
            .request(Method::POST, "/auth/register")
            .json(&json!({ "email": email, "password": password, "name": name }))
            .send()
            .await?;

        let auth: AuthResponse = Self::decode(response).await?;
        self.token = Some(auth.token.clone());
        Ok(auth)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let response = self
            .request(Method::POST, "/auth/login")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let auth: AuthResponse = Self::decode(response).await?;
        self.token = Some(auth.token.clone());
        Ok(auth)
    }

    pub async fn me(&self) -> Result<UserProfile, ApiError> {
        let response = self.request(Method::GET, "/auth/me").send().await?;
        Self::decode(response).await
    }

    pub async fn list_recipes(
        &self,
        search: Option<&str>,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Vec<RecipeResponse>, ApiError> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(search) = search {
            query.push(("search", search.to_string()));
        }
        if let Some(page) = page {
            query.push(("page", page.to_string()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }

        let response = self
            .request(Method::GET, "/recipes")
            .query(&query)
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn get_recipe(&self, id: &str) -> Result<RecipeResponse, ApiError> {
        let response = self
            .request(Method::GET, &format!("/recipes/{id}"))
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn create_recipe(&self, draft: &RecipeDraft) -> Result<RecipeResponse, ApiError> {
        let response = self
            .request(Method::POST, "/recipes")
            .json(draft)
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn update_recipe(
        &self,
        id: &str,
        draft: &RecipeDraft,
    ) -> Result<RecipeResponse, ApiError> {
        let response = self
            .request(Method::PUT, &format!("/recipes/{id}"))
            .json(draft)
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn delete_recipe(&self, id: &str) -> Result<(), ApiError> {
        let response = self
            .request(Method::DELETE, &format!("/recipes/{id}"))
            .send()
            .await?;
        let _: serde_json::Value = Self::decode(response).await?;
        Ok(())
    }

    pub async fn rate_recipe(&self, id: &str, score: i64) -> Result<RecipeResponse, ApiError> {
        let response = self
            .request(Method::POST, &format!("/recipes/{id}/rate"))
            .json(&json!({ "score": score }))
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn toggle_favorite(&self, id: &str) -> Result<FavoriteStatus, ApiError> {
        let response = self
            .request(Method::POST, &format!("/recipes/{id}/favorite"))
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn user_recipes(&self, user_id: &str) -> Result<Vec<RecipeResponse>, ApiError> {
        let response = self
            .request(Method::GET, &format!("/recipes/user/{user_id}"))
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn favorites(&self) -> Result<Vec<RecipeResponse>, ApiError> {
        let response = self.request(Method::GET, "/recipes/favorites").send().await?;
        Self::decode(response).await
    }

    pub async fn update_profile(
        &self,
        name: Option<&str>,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<UserProfile, ApiError> {
        let mut body = serde_json::Map::new();
        if let Some(name) = name {
            body.insert("name".to_string(), json!(name));
        }
        if let Some(email) = email {
            body.insert("email".to_string(), json!(email));
        }
        if let Some(password) = password {
            body.insert("password".to_string(), json!(password));
        }

        let response = self
            .request(Method::PUT, "/users/profile")
            .json(&body)
            .send()
            .await?;
        Self::decode(response).await
    }
}
