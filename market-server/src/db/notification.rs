//! Notification Repository
//!
//! Per-user bounded ring buffer: inserting the 26th message evicts the
//! oldest so each user holds at most 25, served newest first.

use crate::error::ServiceResult;
use shared::models::notification::RING_CAPACITY;
use shared::models::{Notification, StoredMessage};
use shared::util::now_millis;
use sqlx::SqlitePool;

/// Append a message to the recipient's ring buffer
pub async fn push(pool: &SqlitePool, notification: &Notification) -> ServiceResult<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO notification_message (user_id, kind, header, body, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(notification.recipient)
    .bind(notification.kind)
    .bind(&notification.header)
    .bind(&notification.body)
    .bind(now_millis())
    .execute(&mut *tx)
    .await?;

    // Evict beyond capacity, oldest first
    sqlx::query(
        "DELETE FROM notification_message
         WHERE user_id = ?1
           AND id NOT IN (
               SELECT id FROM notification_message
               WHERE user_id = ?1
               ORDER BY id DESC
               LIMIT ?2
           )",
    )
    .bind(notification.recipient)
    .bind(RING_CAPACITY)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

/// A user's messages, newest first
pub async fn list_for_user(pool: &SqlitePool, user_id: i64) -> ServiceResult<Vec<StoredMessage>> {
    let messages = sqlx::query_as::<_, StoredMessage>(
        "SELECT * FROM notification_message WHERE user_id = ? ORDER BY id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(messages)
}

/// Clear a user's ring buffer. Returns the number of removed messages.
pub async fn clear_for_user(pool: &SqlitePool, user_id: i64) -> ServiceResult<u64> {
    let result = sqlx::query("DELETE FROM notification_message WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
