//! Moderation request handlers, generic over the domain
//!
//! The three request surfaces (categories, products, merchants) are the
//! same four endpoints; each resource module routes these handlers with its
//! own domain type.

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::services::moderation::{ModerationDomain, SubmitPayload};
use crate::state::AppState;
use shared::error::{AppError, AppResult};
use shared::models::{ModerationRequest, RequestSummary, Role};
use shared::response::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct RejectBody {
    pub reason: String,
}

/// POST /api/{domain}/requests - stage a mutation (DEO)
pub async fn submit<D: ModerationDomain>(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<SubmitPayload<D::CreateDoc, D::UpdateDoc>>,
) -> AppResult<Json<ApiResponse<ModerationRequest>>> {
    user.require(&[Role::Deo])?;
    let request = state
        .moderation::<D>()
        .submit(user.id, payload)
        .await
        .map_err(AppError::from)?;
    Ok(Json(ApiResponse::ok_with_message(
        request,
        "Request submitted",
    )))
}

/// GET /api/{domain}/requests - pending requests (manager)
pub async fn list<D: ModerationDomain>(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<RequestSummary>>>> {
    user.require(&[Role::Manager])?;
    let requests = state
        .moderation::<D>()
        .list()
        .await
        .map_err(AppError::from)?;
    Ok(Json(ApiResponse::ok(requests)))
}

/// POST /api/{domain}/requests/{id}/accept (manager)
pub async fn accept<D: ModerationDomain>(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    user.require(&[Role::Manager])?;
    let message = state
        .moderation::<D>()
        .accept(id)
        .await
        .map_err(AppError::from)?;
    Ok(Json(ApiResponse::message(message)))
}

/// POST /api/{domain}/requests/{id}/reject (manager)
pub async fn reject<D: ModerationDomain>(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(body): Json<RejectBody>,
) -> AppResult<Json<ApiResponse<()>>> {
    user.require(&[Role::Manager])?;
    let message = state
        .moderation::<D>()
        .reject(id, &body.reason)
        .await
        .map_err(AppError::from)?;
    Ok(Json(ApiResponse::message(message)))
}
