//! Category Repository

use crate::error::ServiceResult;
use shared::models::Category;
use sqlx::{SqliteConnection, SqlitePool};

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> ServiceResult<Option<Category>> {
    let category = sqlx::query_as::<_, Category>("SELECT * FROM category WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(category)
}

/// Case-insensitive name lookup (the `name` column is COLLATE NOCASE)
pub async fn find_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> ServiceResult<Option<Category>> {
    let category = sqlx::query_as::<_, Category>("SELECT * FROM category WHERE name = ? LIMIT 1")
        .bind(name)
        .fetch_optional(conn)
        .await?;
    Ok(category)
}

pub async fn list(pool: &SqlitePool, limit: i64, offset: i64) -> ServiceResult<Vec<Category>> {
    let categories =
        sqlx::query_as::<_, Category>("SELECT * FROM category ORDER BY name LIMIT ? OFFSET ?")
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;
    Ok(categories)
}

pub async fn count(pool: &SqlitePool) -> ServiceResult<i64> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM category")
        .fetch_one(pool)
        .await?;
    Ok(total)
}

pub async fn insert(conn: &mut SqliteConnection, category: &Category) -> ServiceResult<()> {
    sqlx::query(
        "INSERT INTO category (id, name, description, product_count, created_by, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(category.id)
    .bind(&category.name)
    .bind(&category.description)
    .bind(category.product_count)
    .bind(category.created_by)
    .bind(category.created_at)
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
    product_count: Option<i64>,
) -> ServiceResult<()> {
    sqlx::query(
        "UPDATE category SET
             name = COALESCE(?, name),
             description = COALESCE(?, description),
             product_count = COALESCE(?, product_count)
         WHERE id = ?",
    )
    .bind(name)
    .bind(description)
    .bind(product_count)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Adjust the live-product counter kept on the category row
pub async fn adjust_product_count(
    conn: &mut SqliteConnection,
    id: i64,
    delta: i64,
) -> ServiceResult<()> {
    sqlx::query("UPDATE category SET product_count = product_count + ? WHERE id = ?")
        .bind(delta)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn delete(conn: &mut SqliteConnection, id: i64) -> ServiceResult<()> {
    sqlx::query("DELETE FROM category WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}
