//! Order API

use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::services::order_flow::RecordSide;
use crate::state::AppState;
use shared::error::{AppError, AppResult};
use shared::models::order::OrderTicket;
use shared::models::{ActiveOrder, OrderLine, OrderState, Role, ShippingAddress, StateFilter};
use shared::response::ApiResponse;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(place))
        // Single-item shortcut kept for older clients
        .route("/quick", post(place_quick))
        .route("/records", get(records))
        .route("/states", get(states))
        .route("/tickets", get(tickets))
        .route("/{id}", delete(cancel))
        .route("/{id}/state", patch(set_state))
}

#[derive(Debug, Deserialize)]
struct PlaceOrderBody {
    items: Vec<OrderLine>,
    shipping: ShippingAddress,
}

#[derive(Debug, Deserialize)]
struct QuickOrderBody {
    product_id: i64,
    quantity: i64,
    shipping: ShippingAddress,
}

#[derive(Debug, Deserialize)]
struct RecordsQuery {
    /// CURR | PAST
    #[serde(rename = "type")]
    side: String,
}

#[derive(Debug, Deserialize)]
struct TicketsQuery {
    /// A state name or ALL
    #[serde(default)]
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SetStateBody {
    state: OrderState,
}

/// POST /api/orders - place a multi-line order (customer)
async fn place(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<PlaceOrderBody>,
) -> AppResult<Json<ApiResponse<ActiveOrder>>> {
    user.require(&[Role::Customer])?;
    let order = state
        .orders()
        .place_order(user.id, body.items, body.shipping)
        .await
        .map_err(AppError::from)?;
    Ok(Json(ApiResponse::ok_with_message(order, "Order placed")))
}

/// POST /api/orders/quick - single-item order (customer)
async fn place_quick(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<QuickOrderBody>,
) -> AppResult<Json<ApiResponse<ActiveOrder>>> {
    user.require(&[Role::Customer])?;
    let lines = vec![OrderLine {
        product_id: body.product_id,
        quantity: body.quantity,
    }];
    let order = state
        .orders()
        .place_order(user.id, lines, body.shipping)
        .await
        .map_err(AppError::from)?;
    Ok(Json(ApiResponse::ok_with_message(order, "Order placed")))
}

/// GET /api/orders/records?type=CURR|PAST - the caller's own orders
async fn records(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<RecordsQuery>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    user.require(&[Role::Customer])?;
    let side = RecordSide::parse(&query.side)
        .ok_or_else(|| AppError::validation("type must be CURR or PAST"))?;
    let records = state
        .orders()
        .records(user.id, side)
        .await
        .map_err(AppError::from)?;
    Ok(Json(ApiResponse::ok(records)))
}

/// GET /api/orders/states - state dictionary for dashboard filters
async fn states() -> Json<ApiResponse<Vec<&'static str>>> {
    Json(ApiResponse::ok(
        OrderState::ALL.iter().map(|s| s.as_str()).collect(),
    ))
}

/// GET /api/orders/tickets?state=…|ALL - operational dashboard (manager)
async fn tickets(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<TicketsQuery>,
) -> AppResult<Json<ApiResponse<Vec<OrderTicket>>>> {
    user.require(&[Role::Manager])?;
    let filter = match query.state.as_deref() {
        None => StateFilter::All,
        Some(value) => StateFilter::parse(value)
            .ok_or_else(|| AppError::validation(format!("Unknown state filter: {value}")))?,
    };
    let tickets = state
        .orders()
        .tickets(filter)
        .await
        .map_err(AppError::from)?;
    Ok(Json(ApiResponse::ok(tickets)))
}

/// DELETE /api/orders/{id} - cancel while still VERIFYING (customer)
async fn cancel(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    user.require(&[Role::Customer])?;
    let message = state
        .orders()
        .cancel(id, user.id)
        .await
        .map_err(AppError::from)?;
    Ok(Json(ApiResponse::message(message)))
}

/// PATCH /api/orders/{id}/state - drive the ticket lifecycle (manager)
async fn set_state(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(body): Json<SetStateBody>,
) -> AppResult<Json<ApiResponse<()>>> {
    user.require(&[Role::Manager])?;
    let message = state
        .orders()
        .advance(id, body.state)
        .await
        .map_err(AppError::from)?;
    Ok(Json(ApiResponse::message(message)))
}
