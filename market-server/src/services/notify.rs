//! Notification dispatch
//!
//! Delivery is decoupled from the transaction boundary: workflow services
//! dispatch only after a successful commit, and a delivery failure is
//! logged, never propagated to the caller.

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::db;
use shared::models::Notification;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Asynchronous message delivery to a user. Fire-and-forget from the
/// workflow's perspective; no delivery receipt is consumed.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: Notification) -> Result<(), BoxError>;
}

/// Sink that persists into the per-user ring buffer
pub struct DbNotificationSink {
    pool: SqlitePool,
}

impl DbNotificationSink {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationSink for DbNotificationSink {
    async fn deliver(&self, notification: Notification) -> Result<(), BoxError> {
        db::notification::push(&self.pool, &notification)
            .await
            .map_err(|e| -> BoxError { format!("{e:?}").into() })?;
        Ok(())
    }
}

/// Non-blocking dispatch: sanitize, spawn, log-only failure channel.
pub fn dispatch(sink: &Arc<dyn NotificationSink>, notification: Notification) {
    let recipient = notification.recipient;
    let Some(notification) = notification.sanitized() else {
        tracing::warn!(recipient, "Dropping malformed notification");
        return;
    };

    let sink = Arc::clone(sink);
    tokio::spawn(async move {
        if let Err(e) = sink.deliver(notification).await {
            tracing::warn!(recipient, error = %e, "Notification delivery failed");
        }
    });
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records delivered notifications for assertions
    #[derive(Default)]
    pub struct RecordingSink {
        pub delivered: Mutex<Vec<Notification>>,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn deliver(&self, notification: Notification) -> Result<(), BoxError> {
            self.delivered.lock().unwrap().push(notification);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use shared::models::MessageKind;
    use shared::models::notification::RING_CAPACITY;

    #[tokio::test]
    async fn ring_buffer_keeps_newest_25() {
        let pool = test_pool().await;
        let sink = DbNotificationSink::new(pool.clone());

        for i in 0..30 {
            sink.deliver(Notification::new(
                MessageKind::Info,
                format!("msg {i}"),
                "",
                7,
            ))
            .await
            .unwrap();
        }

        let messages = db::notification::list_for_user(&pool, 7).await.unwrap();
        assert_eq!(messages.len() as i64, RING_CAPACITY);
        // Newest first
        assert_eq!(messages[0].header, "msg 29");
        assert_eq!(messages.last().unwrap().header, "msg 5");
    }

    #[tokio::test]
    async fn dispatch_is_best_effort_and_async() {
        let pool = test_pool().await;
        let sink: Arc<dyn NotificationSink> = Arc::new(DbNotificationSink::new(pool.clone()));

        dispatch(
            &sink,
            Notification::new(MessageKind::Accept, "Order", "done", 3),
        );
        // Malformed messages are dropped without panicking
        dispatch(&sink, Notification::new(MessageKind::Info, "   ", "", 3));

        // Yield until the spawned delivery has run
        let mut messages = vec![];
        for _ in 0..100 {
            tokio::task::yield_now().await;
            messages = db::notification::list_for_user(&pool, 3).await.unwrap();
            if !messages.is_empty() {
                break;
            }
        }
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].header, "Order");
    }
}
