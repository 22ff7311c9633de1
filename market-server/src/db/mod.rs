//! Database Module
//!
//! SQLite connection pool, embedded migrations, and one repository module
//! per aggregate. Repository functions are free `async fn`s over a pool or
//! connection so multi-document writes can share one transaction.

pub mod category;
pub mod merchant;
pub mod notification;
pub mod order;
pub mod product;
pub mod user_account;

use crate::error::ServiceError;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::str::FromStr;

/// Database service — owns the SQLite connection pool
#[derive(Clone)]
pub struct DbService {
    pub pool: SqlitePool,
}

impl DbService {
    /// Open the database with WAL mode and apply migrations
    pub async fn new(db_path: &str) -> Result<Self, ServiceError> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
            .map_err(|e| ServiceError::Db(e.into()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        // busy_timeout: wait out write contention instead of failing fast
        sqlx::query("PRAGMA busy_timeout = 5000;").execute(&pool).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        tracing::info!("Database ready (SQLite WAL, busy_timeout=5000ms)");

        Ok(Self { pool })
    }
}

/// In-memory pool with the full schema and the fixture accounts, for
/// tests. Foreign keys are enforced just as in production.
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    crate::testutil::seed_accounts(&pool).await;
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn schema_enforces_catalog_references() {
        let pool = test_pool().await;
        let err = sqlx::query(
            "INSERT INTO product
                 (id, name, price_cents, quantity, product_code, category_id, merchant_id, created_at)
             VALUES (1, 'Ghost', 100, 1, 'GHOST123', 999, 999, 0)",
        )
        .execute(&pool)
        .await
        .unwrap_err();
        assert!(err.to_string().contains("FOREIGN KEY"));
    }
}
