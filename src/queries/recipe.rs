//! Recipe data access
//!
//! Ingredients and steps are stored as JSON arrays of strings so the row
//! keeps the schema-flexible shape of a recipe document. The aggregate
//! rating is derived at read time and never stored.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::AppError;

const RECIPE_SELECT: &str = "SELECT r.id, r.owner_id, u.name AS owner_name, r.title, \
     r.description, r.ingredients, r.steps, r.created_at, r.updated_at, \
     (SELECT AVG(score) FROM ratings WHERE recipe_id = r.id) AS avg_rating, \
     (SELECT COUNT(*) FROM ratings WHERE recipe_id = r.id) AS rating_count \
     FROM recipes r JOIN users u ON u.id = r.owner_id";

/// Recipe row joined with owner name and derived rating aggregates
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecipeRow {
    pub id: String,
    pub owner_id: String,
    pub owner_name: String,
    pub title: String,
    pub description: String,
    pub ingredients: String,
    pub steps: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub avg_rating: Option<f64>,
    pub rating_count: i64,
}

impl RecipeRow {
    pub fn ingredients_vec(&self) -> Result<Vec<String>, AppError> {
        Ok(serde_json::from_str(&self.ingredients)?)
    }

    pub fn steps_vec(&self) -> Result<Vec<String>, AppError> {
        Ok(serde_json::from_str(&self.steps)?)
    }
}

pub async fn insert_recipe(
    pool: &SqlitePool,
    owner_id: &str,
    title: &str,
    description: &str,
    ingredients: &[String],
    steps: &[String],
) -> Result<RecipeRow, AppError> {
    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        "INSERT INTO recipes (id, owner_id, title, description, ingredients, steps, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )
    .bind(&id)
    .bind(owner_id)
    .bind(title)
    .bind(description)
    .bind(serde_json::to_string(ingredients)?)
    .bind(serde_json::to_string(steps)?)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    get_recipe(pool, &id).await?.ok_or(AppError::NotFound)
}

pub async fn get_recipe(pool: &SqlitePool, id: &str) -> Result<Option<RecipeRow>, AppError> {
    let sql = format!("{RECIPE_SELECT} WHERE r.id = ?1");
    let recipe = sqlx::query_as::<_, RecipeRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(recipe)
}

/// Owner id of a recipe, for the flat ownership equality check
pub async fn owner_of(pool: &SqlitePool, id: &str) -> Result<Option<String>, AppError> {
    let owner = sqlx::query_scalar::<_, String>("SELECT owner_id FROM recipes WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(owner)
}

/// List recipes newest first, optionally filtered by title substring
pub async fn list_recipes(
    pool: &SqlitePool,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<RecipeRow>, AppError> {
    let recipes = match search {
        Some(term) => {
            let sql = format!(
                "{RECIPE_SELECT} WHERE r.title LIKE ?1 ORDER BY r.created_at DESC LIMIT ?2 OFFSET ?3"
            );
            sqlx::query_as::<_, RecipeRow>(&sql)
                .bind(format!("%{}%", escape_like(term)))
                .bind(limit)
                .bind(offset)
                .fetch_all(pool)
                .await?
        }
        None => {
            let sql = format!("{RECIPE_SELECT} ORDER BY r.created_at DESC LIMIT ?1 OFFSET ?2");
            sqlx::query_as::<_, RecipeRow>(&sql)
                .bind(limit)
                .bind(offset)
                .fetch_all(pool)
                .await?
        }
    };

    Ok(recipes)
}

pub async fn list_by_owner(pool: &SqlitePool, owner_id: &str) -> Result<Vec<RecipeRow>, AppError> {
    let sql = format!("{RECIPE_SELECT} WHERE r.owner_id = ?1 ORDER BY r.created_at DESC");
    let recipes = sqlx::query_as::<_, RecipeRow>(&sql)
        .bind(owner_id)
        .fetch_all(pool)
        .await?;

    Ok(recipes)
}

pub async fn list_favorited_by(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<RecipeRow>, AppError> {
    let sql = format!(
        "{RECIPE_SELECT} JOIN favorites f ON f.recipe_id = r.id \
         WHERE f.user_id = ?1 ORDER BY f.favorited_at DESC"
    );
    let recipes = sqlx::query_as::<_, RecipeRow>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    Ok(recipes)
}

pub async fn update_recipe(
    pool: &SqlitePool,
    id: &str,
    title: &str,
    description: &str,
    ingredients: &[String],
    steps: &[String],
) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE recipes SET title = ?1, description = ?2, ingredients = ?3, steps = ?4, updated_at = ?5
         WHERE id = ?6",
    )
    .bind(title)
    .bind(description)
    .bind(serde_json::to_string(ingredients)?)
    .bind(serde_json::to_string(steps)?)
    .bind(chrono::Utc::now().timestamp())
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a recipe; ratings and favorites cascade
pub async fn delete_recipe(pool: &SqlitePool, id: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM recipes WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Upsert the caller's rating; one row per (user, recipe) pair
pub async fn upsert_rating(
    pool: &SqlitePool,
    recipe_id: &str,
    user_id: &str,
    score: i64,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO ratings (user_id, recipe_id, score, rated_at) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (user_id, recipe_id) DO UPDATE SET score = excluded.score, rated_at = excluded.rated_at",
    )
    .bind(user_id)
    .bind(recipe_id)
    .bind(score)
    .bind(chrono::Utc::now().timestamp())
    .execute(pool)
    .await?;

    Ok(())
}

/// Toggle the caller's favorite; returns whether the recipe is now favorited
pub async fn toggle_favorite(
    pool: &SqlitePool,
    recipe_id: &str,
    user_id: &str,
) -> Result<bool, AppError> {
    let removed = sqlx::query("DELETE FROM favorites WHERE user_id = ?1 AND recipe_id = ?2")
        .bind(user_id)
        .bind(recipe_id)
        .execute(pool)
        .await?;

    if removed.rows_affected() > 0 {
        return Ok(false);
    }

    sqlx::query(
        "INSERT OR IGNORE INTO favorites (user_id, recipe_id, favorited_at) VALUES (?1, ?2, ?3)",
    )
    .bind(user_id)
    .bind(recipe_id)
    .bind(chrono::Utc::now().timestamp())
    .execute(pool)
    .await?;

    Ok(true)
}

/// User ids who favorited a recipe, oldest favorite first
pub async fn favorites_for(pool: &SqlitePool, recipe_id: &str) -> Result<Vec<String>, AppError> {
    let user_ids = sqlx::query_scalar::<_, String>(
        "SELECT user_id FROM favorites WHERE recipe_id = ?1 ORDER BY favorited_at ASC",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;

    Ok(user_ids)
}

fn escape_like(term: &str) -> String {
    term.replace('%', "").replace('_', " ")
}
