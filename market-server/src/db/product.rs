//! Product Repository

use crate::error::ServiceResult;
use shared::models::Product;
use sqlx::{SqliteConnection, SqlitePool};

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> ServiceResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM product WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(product)
}

pub async fn find_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> ServiceResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM product WHERE name = ? LIMIT 1")
        .bind(name)
        .fetch_optional(conn)
        .await?;
    Ok(product)
}

pub async fn list(pool: &SqlitePool, limit: i64, offset: i64) -> ServiceResult<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM product ORDER BY created_at DESC LIMIT ? OFFSET ?",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(products)
}

pub async fn count_by_merchant(conn: &mut SqliteConnection, merchant_id: i64) -> ServiceResult<i64> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product WHERE merchant_id = ?")
        .bind(merchant_id)
        .fetch_one(conn)
        .await?;
    Ok(total)
}

pub async fn count(pool: &SqlitePool) -> ServiceResult<i64> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product")
        .fetch_one(pool)
        .await?;
    Ok(total)
}

pub async fn insert(conn: &mut SqliteConnection, product: &Product) -> ServiceResult<()> {
    sqlx::query(
        "INSERT INTO product (id, name, description, price_cents, quantity, product_code,
                              category_id, merchant_id, thumb_key, gallery_json, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price_cents)
    .bind(product.quantity)
    .bind(&product.product_code)
    .bind(product.category_id)
    .bind(product.merchant_id)
    .bind(&product.thumb_key)
    .bind(&product.gallery_json)
    .bind(product.created_at)
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
    price_cents: Option<i64>,
    quantity: Option<i64>,
) -> ServiceResult<()> {
    sqlx::query(
        "UPDATE product SET
             name = COALESCE(?, name),
             description = COALESCE(?, description),
             price_cents = COALESCE(?, price_cents),
             quantity = COALESCE(?, quantity)
         WHERE id = ?",
    )
    .bind(name)
    .bind(description)
    .bind(price_cents)
    .bind(quantity)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Replace image keys. Passing `None` for either field keeps the previous
/// value; the caller decides which subset is being replaced.
pub async fn set_images(
    conn: &mut SqliteConnection,
    id: i64,
    thumb_key: Option<&str>,
    gallery_json: Option<&str>,
) -> ServiceResult<()> {
    sqlx::query(
        "UPDATE product SET
             thumb_key = COALESCE(?, thumb_key),
             gallery_json = COALESCE(?, gallery_json)
         WHERE id = ?",
    )
    .bind(thumb_key)
    .bind(gallery_json)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn delete(conn: &mut SqliteConnection, id: i64) -> ServiceResult<()> {
    sqlx::query("DELETE FROM product WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}
