//! Product API

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use super::{Pagination, moderation_requests};
use crate::db;
use crate::services::moderation::ProductModeration;
use crate::state::AppState;
use shared::error::{AppError, AppResult};
use shared::models::Product;
use shared::response::ApiResponse;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/products", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route(
            "/requests",
            post(moderation_requests::submit::<ProductModeration>)
                .get(moderation_requests::list::<ProductModeration>),
        )
        .route(
            "/requests/{id}/accept",
            post(moderation_requests::accept::<ProductModeration>),
        )
        .route(
            "/requests/{id}/reject",
            post(moderation_requests::reject::<ProductModeration>),
        )
}

#[derive(Debug, Serialize)]
struct ProductPage {
    total: i64,
    items: Vec<Product>,
}

/// GET /api/products - public paginated listing
async fn list(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> AppResult<Json<ApiResponse<ProductPage>>> {
    let page = page.clamp();
    let total = db::product::count(&state.db.pool)
        .await
        .map_err(AppError::from)?;
    let items = db::product::list(&state.db.pool, page.limit, page.offset)
        .await
        .map_err(AppError::from)?;
    Ok(Json(ApiResponse::ok(ProductPage { total, items })))
}
