//! Stock Ledger
//!
//! The unit of durability for stock counts. Both operations run on the
//! caller's connection so they join whatever transaction encloses them;
//! the ledger performs no validation of its own — callers verify quantity
//! against live stock before debiting, and crediting twice for one order
//! is a caller bug, not something this layer guards against.

use crate::error::ServiceResult;
use sqlx::SqliteConnection;

/// Decrement a product's available quantity by `qty`.
pub async fn debit(conn: &mut SqliteConnection, product_id: i64, qty: i64) -> ServiceResult<()> {
    sqlx::query("UPDATE product SET quantity = quantity - ? WHERE id = ?")
        .bind(qty)
        .bind(product_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Increment a product's available quantity by `qty`. Used only to reverse
/// a prior debit.
pub async fn credit(conn: &mut SqliteConnection, product_id: i64, qty: i64) -> ServiceResult<()> {
    sqlx::query("UPDATE product SET quantity = quantity + ? WHERE id = ?")
        .bind(qty)
        .bind(product_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Current stock of a product, `None` when the product does not exist
pub async fn stock_of(conn: &mut SqliteConnection, product_id: i64) -> ServiceResult<Option<i64>> {
    let quantity: Option<i64> = sqlx::query_scalar("SELECT quantity FROM product WHERE id = ?")
        .bind(product_id)
        .fetch_optional(conn)
        .await?;
    Ok(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::testutil::seed_product;

    #[tokio::test]
    async fn debit_then_credit_restores_stock() {
        let pool = test_pool().await;
        let product_id = seed_product(&pool, "Desk Lamp", 5).await;

        let mut conn = pool.acquire().await.unwrap();
        debit(&mut conn, product_id, 3).await.unwrap();
        assert_eq!(stock_of(&mut conn, product_id).await.unwrap(), Some(2));

        credit(&mut conn, product_id, 3).await.unwrap();
        assert_eq!(stock_of(&mut conn, product_id).await.unwrap(), Some(5));
    }

    #[tokio::test]
    async fn stock_of_missing_product_is_none() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(stock_of(&mut conn, 404).await.unwrap(), None);
    }
}
