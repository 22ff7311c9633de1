//! Merchant Repository

use crate::error::ServiceResult;
use shared::models::Merchant;
use sqlx::{SqliteConnection, SqlitePool};

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> ServiceResult<Option<Merchant>> {
    let merchant = sqlx::query_as::<_, Merchant>("SELECT * FROM merchant WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(merchant)
}

pub async fn find_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> ServiceResult<Option<Merchant>> {
    let merchant = sqlx::query_as::<_, Merchant>("SELECT * FROM merchant WHERE name = ? LIMIT 1")
        .bind(name)
        .fetch_optional(conn)
        .await?;
    Ok(merchant)
}

/// A user holds at most one merchant profile
pub async fn find_by_user(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> ServiceResult<Option<Merchant>> {
    let merchant = sqlx::query_as::<_, Merchant>("SELECT * FROM merchant WHERE user_id = ? LIMIT 1")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(merchant)
}

pub async fn list(pool: &SqlitePool, limit: i64, offset: i64) -> ServiceResult<Vec<Merchant>> {
    let merchants =
        sqlx::query_as::<_, Merchant>("SELECT * FROM merchant ORDER BY name LIMIT ? OFFSET ?")
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;
    Ok(merchants)
}

pub async fn count(pool: &SqlitePool) -> ServiceResult<i64> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM merchant")
        .fetch_one(pool)
        .await?;
    Ok(total)
}

pub async fn insert(conn: &mut SqliteConnection, merchant: &Merchant) -> ServiceResult<()> {
    sqlx::query(
        "INSERT INTO merchant (id, user_id, name, description, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(merchant.id)
    .bind(merchant.user_id)
    .bind(&merchant.name)
    .bind(&merchant.description)
    .bind(merchant.created_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Merge scalar fields; `None` leaves the column untouched.
pub async fn merge_fields(
    conn: &mut SqliteConnection,
    id: i64,
    name: Option<&str>,
    description: Option<&str>,
) -> ServiceResult<()> {
    sqlx::query(
        "UPDATE merchant SET
             name = COALESCE(?, name),
             description = COALESCE(?, description)
         WHERE id = ?",
    )
    .bind(name)
    .bind(description)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn delete(conn: &mut SqliteConnection, id: i64) -> ServiceResult<()> {
    sqlx::query("DELETE FROM merchant WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}
