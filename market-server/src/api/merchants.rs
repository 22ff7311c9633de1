//! Merchant API

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use super::{Pagination, moderation_requests};
use crate::db;
use crate::services::moderation::MerchantModeration;
use crate::state::AppState;
use shared::error::{AppError, AppResult};
use shared::models::Merchant;
use shared::response::ApiResponse;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/merchants", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route(
            "/requests",
            post(moderation_requests::submit::<MerchantModeration>)
                .get(moderation_requests::list::<MerchantModeration>),
        )
        .route(
            "/requests/{id}/accept",
            post(moderation_requests::accept::<MerchantModeration>),
        )
        .route(
            "/requests/{id}/reject",
            post(moderation_requests::reject::<MerchantModeration>),
        )
}

#[derive(Debug, Serialize)]
struct MerchantPage {
    total: i64,
    items: Vec<Merchant>,
}

/// GET /api/merchants - public paginated listing
async fn list(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> AppResult<Json<ApiResponse<MerchantPage>>> {
    let page = page.clamp();
    let total = db::merchant::count(&state.db.pool)
        .await
        .map_err(AppError::from)?;
    let items = db::merchant::list(&state.db.pool, page.limit, page.offset)
        .await
        .map_err(AppError::from)?;
    Ok(Json(ApiResponse::ok(MerchantPage { total, items })))
}
