//! Recipe CRUD, rating and favorite handlers
//!
//! Ownership is a flat equality check between the authenticated caller and
//! the recipe's owner reference. Rating and favoriting are open to any
//! authenticated user.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::error::AppError;
use crate::middleware::Auth;
use crate::queries::recipe::{self, RecipeRow};
use crate::routes::AppState;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecipePayload {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, message = "must contain at least one ingredient"))]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub steps: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RatePayload {
    #[validate(range(min = 1, max = 5, message = "must be between 1 and 5"))]
    pub score: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecipeResponse {
    pub id: String,
    pub owner_id: String,
    pub owner_name: String,
    pub title: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    /// Mean of all current per-user scores; absent while unrated
    pub avg_rating: Option<f64>,
    pub rating_count: i64,
    /// User ids who favorited this recipe
    pub favorites: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

async fn to_response(pool: &SqlitePool, row: RecipeRow) -> Result<RecipeResponse, AppError> {
    let favorites = recipe::favorites_for(pool, &row.id).await?;

    Ok(RecipeResponse {
        ingredients: row.ingredients_vec()?,
        steps: row.steps_vec()?,
        id: row.id,
        owner_id: row.owner_id,
        owner_name: row.owner_name,
        title: row.title,
        description: row.description,
        avg_rating: row.avg_rating,
        rating_count: row.rating_count,
        favorites,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

async fn to_responses(
    pool: &SqlitePool,
    rows: Vec<RecipeRow>,
) -> Result<Vec<RecipeResponse>, AppError> {
    let mut responses = Vec::with_capacity(rows.len());
    for row in rows {
        responses.push(to_response(pool, row).await?);
    }
    Ok(responses)
}

/// Flat ownership check; NotFound dominates Forbidden so probing ids leaks nothing
async fn require_owner(pool: &SqlitePool, recipe_id: &str, user_id: &str) -> Result<(), AppError> {
    let owner = recipe::owner_of(pool, recipe_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if owner != user_id {
        return Err(AppError::Forbidden);
    }

    Ok(())
}

/// GET /recipes
#[tracing::instrument(skip(state))]
pub async fn get_recipe_list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<RecipeResponse>>, AppError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let page = params.page.unwrap_or(1).max(1);
    let offset = (page - 1) * limit;

    let search = params.search.as_deref().filter(|s| !s.trim().is_empty());

    let rows = recipe::list_recipes(&state.pool, search, limit, offset).await?;

    Ok(Json(to_responses(&state.pool, rows).await?))
}

/// GET /recipes/{id}
#[tracing::instrument(skip(state))]
pub async fn get_recipe_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RecipeResponse>, AppError> {
    let row = recipe::get_recipe(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(to_response(&state.pool, row).await?))
}

/// POST /recipes
#[tracing::instrument(skip(state, payload), fields(user_id = %auth.user_id))]
pub async fn post_create_recipe(
    State(state): State<AppState>,
    Extension(auth): Extension<Auth>,
    Json(payload): Json<RecipePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let row = recipe::insert_recipe(
        &state.pool,
        &auth.user_id,
        payload.title.trim(),
        &payload.description,
        &payload.ingredients,
        &payload.steps,
    )
    .await?;

    tracing::info!(recipe_id = %row.id, "Recipe created");

    Ok((
        StatusCode::CREATED,
        Json(to_response(&state.pool, row).await?),
    ))
}

/// PUT /recipes/{id}
#[tracing::instrument(skip(state, payload), fields(user_id = %auth.user_id))]
pub async fn put_update_recipe(
    State(state): State<AppState>,
    Extension(auth): Extension<Auth>,
    Path(id): Path<String>,
    Json(payload): Json<RecipePayload>,
) -> Result<Json<RecipeResponse>, AppError> {
    payload.validate()?;
    require_owner(&state.pool, &id, &auth.user_id).await?;

    recipe::update_recipe(
        &state.pool,
        &id,
        payload.title.trim(),
        &payload.description,
        &payload.ingredients,
        &payload.steps,
    )
    .await?;

    let row = recipe::get_recipe(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(to_response(&state.pool, row).await?))
}

/// DELETE /recipes/{id}
#[tracing::instrument(skip(state), fields(user_id = %auth.user_id))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    Extension(auth): Extension<Auth>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    require_owner(&state.pool, &id, &auth.user_id).await?;

    recipe::delete_recipe(&state.pool, &id).await?;

    tracing::info!(recipe_id = %id, "Recipe deleted");

    Ok(Json(json!({ "deleted": true })))
}

/// POST /recipes/{id}/rate
#[tracing::instrument(skip(state, payload), fields(user_id = %auth.user_id))]
pub async fn post_rate_recipe(
    State(state): State<AppState>,
    Extension(auth): Extension<Auth>,
    Path(id): Path<String>,
    Json(payload): Json<RatePayload>,
) -> Result<Json<RecipeResponse>, AppError> {
    payload.validate()?;

    if recipe::owner_of(&state.pool, &id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    recipe::upsert_rating(&state.pool, &id, &auth.user_id, payload.score).await?;

    let row = recipe::get_recipe(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(to_response(&state.pool, row).await?))
}

/// POST /recipes/{id}/favorite
#[tracing::instrument(skip(state), fields(user_id = %auth.user_id))]
pub async fn post_toggle_favorite(
    State(state): State<AppState>,
    Extension(auth): Extension<Auth>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if recipe::owner_of(&state.pool, &id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let favorited = recipe::toggle_favorite(&state.pool, &id, &auth.user_id).await?;
    let favorites = recipe::favorites_for(&state.pool, &id).await?;

    Ok(Json(json!({
        "favorited": favorited,
        "favorite_count": favorites.len(),
    })))
}

/// GET /recipes/user/{user_id}
#[tracing::instrument(skip(state))]
pub async fn get_user_recipes(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<RecipeResponse>>, AppError> {
    let rows = recipe::list_by_owner(&state.pool, &user_id).await?;

    Ok(Json(to_responses(&state.pool, rows).await?))
}

/// GET /recipes/favorites
#[tracing::instrument(skip(state), fields(user_id = %auth.user_id))]
pub async fn get_favorites(
    State(state): State<AppState>,
    Extension(auth): Extension<Auth>,
) -> Result<Json<Vec<RecipeResponse>>, AppError> {
    let rows = recipe::list_favorited_by(&state.pool, &auth.user_id).await?;

    Ok(Json(to_responses(&state.pool, rows).await?))
}
