//! Notification API

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::auth::CurrentUser;
use crate::db;
use crate::state::AppState;
use shared::error::{AppError, AppResult};
use shared::models::StoredMessage;
use shared::response::ApiResponse;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/notifications", get(list).delete(clear))
}

/// GET /api/notifications - the caller's messages, newest first
async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<StoredMessage>>>> {
    let messages = db::notification::list_for_user(&state.db.pool, user.id)
        .await
        .map_err(AppError::from)?;
    Ok(Json(ApiResponse::ok(messages)))
}

/// DELETE /api/notifications - empty the caller's ring buffer
async fn clear(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<()>>> {
    let removed = db::notification::clear_for_user(&state.db.pool, user.id)
        .await
        .map_err(AppError::from)?;
    if removed == 0 {
        return Err(AppError::not_found("No notifications"));
    }
    Ok(Json(ApiResponse::message(format!(
        "Cleared {removed} notifications"
    ))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtService;
    use crate::db::{DbService, test_pool};
    use crate::services::blob::testing::RecordingStore;
    use crate::services::notify::testing::RecordingSink;
    use shared::models::{MessageKind, Notification, Role};
    use std::sync::Arc;

    async fn state() -> AppState {
        AppState {
            db: DbService {
                pool: test_pool().await,
            },
            sink: Arc::new(RecordingSink::default()) as _,
            blobs: Arc::new(RecordingStore::default()) as _,
            jwt: Arc::new(JwtService::new("test-secret")),
        }
    }

    fn caller(id: i64) -> CurrentUser {
        CurrentUser {
            id,
            role: Role::Customer,
        }
    }

    #[tokio::test]
    async fn clearing_an_empty_ring_is_not_found() {
        let state = state().await;
        let err = clear(State(state), caller(7)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn clear_reports_the_removed_count() {
        let state = state().await;
        db::notification::push(
            &state.db.pool,
            &Notification::new(MessageKind::Info, "Order", "placed", 7),
        )
        .await
        .unwrap();

        let response = clear(State(state.clone()), caller(7)).await.unwrap();
        assert_eq!(response.0.message, "Cleared 1 notifications");

        // The ring is empty now, so a second clear finds nothing
        let err = clear(State(state), caller(7)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
