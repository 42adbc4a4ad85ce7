//! User data access

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::AppError;

/// User row from the users table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub name: String,
    pub hashed_password: String,
    pub created_at: i64,
}

/// Insert a new user, mapping the unique-email violation to DuplicateEmail
pub async fn insert_user(
    pool: &SqlitePool,
    email: &str,
    name: &str,
    hashed_password: &str,
) -> Result<UserRow, AppError> {
    let id = Uuid::new_v4().to_string();
    let created_at = chrono::Utc::now().timestamp();

    let result = sqlx::query(
        "INSERT INTO users (id, email, name, hashed_password, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(&id)
    .bind(email)
    .bind(name)
    .bind(hashed_password)
    .bind(created_at)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(UserRow {
            id,
            email: email.to_string(),
            name: name.to_string(),
            hashed_password: hashed_password.to_string(),
            created_at,
        }),
        Err(e) if is_unique_violation(&e) => Err(AppError::DuplicateEmail),
        Err(e) => Err(e.into()),
    }
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<UserRow>, AppError> {
    let user = sqlx::query_as::<_, UserRow>(
        "SELECT id, email, name, hashed_password, created_at FROM users WHERE email = ?1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<UserRow>, AppError> {
    let user = sqlx::query_as::<_, UserRow>(
        "SELECT id, email, name, hashed_password, created_at FROM users WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Update profile fields, re-checking email uniqueness
pub async fn update_user(
    pool: &SqlitePool,
    id: &str,
    email: &str,
    name: &str,
    hashed_password: &str,
) -> Result<(), AppError> {
    let result = sqlx::query(
        "UPDATE users SET email = ?1, name = ?2, hashed_password = ?3 WHERE id = ?4",
    )
    .bind(email)
    .bind(name)
    .bind(hashed_password)
    .bind(id)
    .execute(pool)
    .await;

    match result {
        Ok(r) if r.rows_affected() == 0 => Err(AppError::NotFound),
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e) => Err(AppError::DuplicateEmail),
        Err(e) => Err(e.into()),
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}
