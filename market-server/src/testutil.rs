//! Seed helpers shared across service tests.

use sqlx::SqlitePool;

use crate::db;
use shared::models::{Category, Merchant, Product, Role, UserAccount};
use shared::util::{now_millis, product_code, snowflake_id};

/// Accounts the service tests take for granted: customers 7 and 8 place
/// orders, operators 11 and 12 file moderation requests. Seeded by
/// [`crate::db::test_pool`] so foreign keys on `user_id`/`submitted_by`
/// hold without per-test ceremony.
pub async fn seed_accounts(pool: &SqlitePool) {
    sqlx::query(
        "INSERT INTO user_account (id, email, first_name, role) VALUES
             (7, 'ana@fixture.test', 'ana', 'CUSTOMER'),
             (8, 'rui@fixture.test', 'rui', 'CUSTOMER'),
             (11, 'op.one@fixture.test', 'op.one', 'DEO'),
             (12, 'op.two@fixture.test', 'op.two', 'DEO')",
    )
    .execute(pool)
    .await
    .unwrap();
}

/// Default catalog rows (category 1 and merchant 1, owned by user 1) that
/// products reference when a test does not seed its own. Idempotent.
async fn ensure_default_catalog(pool: &SqlitePool) {
    sqlx::query(
        "INSERT OR IGNORE INTO user_account (id, email, first_name, role)
         VALUES (1, 'store.one@fixture.test', 'store.one', 'MERCHANT')",
    )
    .execute(pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT OR IGNORE INTO category (id, name, description, product_count, created_by, created_at)
         VALUES (1, 'General', '', 0, 1, ?)",
    )
    .bind(now_millis())
    .execute(pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT OR IGNORE INTO merchant (id, user_id, name, description, created_at)
         VALUES (1, 1, 'General Store', '', ?)",
    )
    .bind(now_millis())
    .execute(pool)
    .await
    .unwrap();
}

pub async fn seed_user(pool: &SqlitePool, email: &str, role: Role) -> i64 {
    let user = UserAccount {
        id: snowflake_id(),
        email: email.to_string(),
        first_name: email.split('@').next().unwrap_or("user").to_string(),
        role,
    };
    let mut conn = pool.acquire().await.unwrap();
    db::user_account::insert(&mut conn, &user).await.unwrap();
    user.id
}

pub async fn seed_category(pool: &SqlitePool, name: &str) -> i64 {
    let category = Category {
        id: snowflake_id(),
        name: name.to_string(),
        description: String::new(),
        product_count: 0,
        created_by: 1,
        created_at: now_millis(),
    };
    let mut conn = pool.acquire().await.unwrap();
    db::category::insert(&mut conn, &category).await.unwrap();
    category.id
}

pub async fn seed_merchant(pool: &SqlitePool, user_id: i64, name: &str) -> i64 {
    let merchant = Merchant {
        id: snowflake_id(),
        user_id,
        name: name.to_string(),
        description: String::new(),
        created_at: now_millis(),
    };
    let mut conn = pool.acquire().await.unwrap();
    db::merchant::insert(&mut conn, &merchant).await.unwrap();
    merchant.id
}

/// Product with placeholder category/merchant references. Tests that care
/// about those relations seed them explicitly and use [`seed_product_for`].
pub async fn seed_product(pool: &SqlitePool, name: &str, quantity: i64) -> i64 {
    seed_product_for(pool, name, quantity, 1, 1).await
}

pub async fn seed_product_with_images(
    pool: &SqlitePool,
    name: &str,
    thumb_key: Option<&str>,
    gallery_keys: &[&str],
) -> i64 {
    ensure_default_catalog(pool).await;
    let product = Product {
        id: snowflake_id(),
        name: name.to_string(),
        description: String::new(),
        price_cents: 1999,
        quantity: 10,
        product_code: product_code(),
        category_id: 1,
        merchant_id: 1,
        thumb_key: thumb_key.map(str::to_string),
        gallery_json: serde_json::to_string(gallery_keys).unwrap(),
        created_at: now_millis(),
    };
    let mut conn = pool.acquire().await.unwrap();
    db::product::insert(&mut conn, &product).await.unwrap();
    product.id
}

pub async fn seed_product_for(
    pool: &SqlitePool,
    name: &str,
    quantity: i64,
    category_id: i64,
    merchant_id: i64,
) -> i64 {
    ensure_default_catalog(pool).await;
    let product = Product {
        id: snowflake_id(),
        name: name.to_string(),
        description: String::new(),
        price_cents: 1999,
        quantity,
        product_code: product_code(),
        category_id,
        merchant_id,
        thumb_key: None,
        gallery_json: "[]".to_string(),
        created_at: now_millis(),
    };
    let mut conn = pool.acquire().await.unwrap();
    db::product::insert(&mut conn, &product).await.unwrap();
    product.id
}
