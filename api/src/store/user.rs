use jiff_sqlx::ToSqlx;
use payloads::UserId;
use sqlx::PgPool;

use super::{StoreError, User};
use crate::time::TimeSource;

/// Insert a new user. The username must already be validated and the
/// password hashed; see [`crate::password::create_user`].
pub async fn create_user(
    username: &str,
    password_hash: &str,
    pool: &PgPool,
    time_source: &TimeSource,
) -> Result<User, StoreError> {
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (
                username,
                password_hash,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $3)
            RETURNING *;",
    )
    .bind(username)
    .bind(password_hash)
    .bind(time_source.now().to_sqlx())
    .fetch_one(pool)
    .await?;
    Ok(user)
}

pub async fn read_user(id: &UserId, pool: &PgPool) -> Result<User, StoreError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1;")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(StoreError::UserNotFound)
}

pub async fn find_user_by_username(
    username: &str,
    pool: &PgPool,
) -> Result<Option<User>, StoreError> {
    Ok(
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1;")
            .bind(username)
            .fetch_optional(pool)
            .await?,
    )
}

pub async fn update_password_hash(
    id: &UserId,
    password_hash: &str,
    pool: &PgPool,
    time_source: &TimeSource,
) -> Result<(), StoreError> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET password_hash = $2, updated_at = $3
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(password_hash)
    .bind(time_source.now().to_sqlx())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::UserNotFound);
    }
    Ok(())
}
