//! Category API

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use super::{Pagination, moderation_requests};
use crate::db;
use crate::services::moderation::CategoryModeration;
use crate::state::AppState;
use shared::error::{AppError, AppResult};
use shared::models::Category;
use shared::response::ApiResponse;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/categories", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route(
            "/requests",
            post(moderation_requests::submit::<CategoryModeration>)
                .get(moderation_requests::list::<CategoryModeration>),
        )
        .route(
            "/requests/{id}/accept",
            post(moderation_requests::accept::<CategoryModeration>),
        )
        .route(
            "/requests/{id}/reject",
            post(moderation_requests::reject::<CategoryModeration>),
        )
}

#[derive(Debug, Serialize)]
struct CategoryPage {
    total: i64,
    items: Vec<Category>,
}

/// GET /api/categories - public paginated listing
async fn list(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> AppResult<Json<ApiResponse<CategoryPage>>> {
    let page = page.clamp();
    let total = db::category::count(&state.db.pool)
        .await
        .map_err(AppError::from)?;
    let items = db::category::list(&state.db.pool, page.limit, page.offset)
        .await
        .map_err(AppError::from)?;
    Ok(Json(ApiResponse::ok(CategoryPage { total, items })))
}
