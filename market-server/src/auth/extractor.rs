//! Axum extractor for the authenticated user

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth::{CurrentUser, JwtService};
use crate::state::AppState;
use shared::error::AppError;

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Already validated earlier in this request
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AppError::Unauthorized)?;
        let token = JwtService::extract_from_header(header).ok_or(AppError::InvalidToken)?;

        let claims = state.jwt.verify(token).map_err(|e| {
            tracing::warn!(uri = %parts.uri, error = %e, "Authentication failed");
            e
        })?;
        let user = CurrentUser::try_from(claims)?;

        parts.extensions.insert(user.clone());
        Ok(user)
    }
}
