use sqlx::{Sqlite, SqlitePool};

use crate::{errors::RequestError, models::User};

const USER_COLUMNS: &str = "id, username, password, is_staff, created_at";

pub async fn get_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, RequestError> {
    let mut tx = pool.begin().await?;
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    let result = sqlx::query_as::<Sqlite, User>(&query)
        .bind(id)
        .fetch_optional(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(result)
}

pub async fn get_user_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<User>, RequestError> {
    let mut tx = pool.begin().await?;
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1");
    let result = sqlx::query_as::<Sqlite, User>(&query)
        .bind(username)
        .fetch_optional(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(result)
}

/// Inserts a user whose password is already hashed. A taken username comes
/// back as `RunTimeError`.
pub async fn insert_user(
    pool: &SqlitePool,
    username: &str,
    password_hash: &str,
    is_staff: bool,
) -> Result<User, RequestError> {
    let mut tx = pool.begin().await?;
    let query = format!(
        "INSERT INTO users (username, password, is_staff) VALUES (?1, ?2, ?3) RETURNING {USER_COLUMNS}"
    );
    let user = sqlx::query_as::<Sqlite, User>(&query)
        .bind(username)
        .bind(password_hash)
        .bind(is_staff)
        .fetch_one(&mut tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_error) = &e {
                if db_error.message().contains("UNIQUE constraint failed") {
                    return RequestError::RunTimeError("A user with that username already exists.");
                }
            }
            RequestError::DatabaseError(e)
        })?;
    tx.commit().await?;
    Ok(user)
}

pub async fn set_staff_in_db(pool: &SqlitePool, username: &str) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query("UPDATE users SET is_staff = TRUE WHERE username = ?1")
        .bind(username)
        .execute(&mut tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound("User not found"));
    }
    tx.commit().await?;
    Ok(())
}
