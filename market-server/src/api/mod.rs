//! HTTP API
//!
//! One module per resource. Every endpoint answers with the
//! [`shared::response::ApiResponse`] envelope, success or failure.

pub mod categories;
pub mod health;
pub mod merchants;
pub mod moderation_requests;
pub mod notifications;
pub mod orders;
pub mod products;

use axum::Router;
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Page window for public listing endpoints
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(default = "Pagination::default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl Pagination {
    const MAX_LIMIT: i64 = 200;

    fn default_limit() -> i64 {
        50
    }

    pub fn clamp(self) -> Self {
        Self {
            limit: self.limit.clamp(1, Self::MAX_LIMIT),
            offset: self.offset.max(0),
        }
    }
}

/// Build a router with all routes registered (no state applied yet)
pub fn build_router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(orders::router())
        .merge(categories::router())
        .merge(products::router())
        .merge(merchants::router())
        .merge(notifications::router())
}

/// Fully configured application: routes plus HTTP middleware
pub fn build_app(state: AppState) -> Router {
    build_router()
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
