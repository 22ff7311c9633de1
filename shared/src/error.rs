//! Unified Error Handling
//!
//! Application-wide error enum with its HTTP mapping. Workflow operations
//! never leave the caller without a structured envelope: every variant
//! renders as an [`ApiResponse`] body with an `Exxxx` code.
//!
//! | Prefix | Category |
//! |--------|----------|
//! | E0xxx  | Validation / business rules |
//! | E01xx  | Order workflow |
//! | E2xxx  | Permission |
//! | E3xxx  | Authentication |
//! | E9xxx  | System |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::response::ApiResponse;

/// Application-level error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== Authentication Errors ==========
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Permission denied: {0}")]
    Forbidden(String),

    // ========== Business Logic Errors ==========
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource already exists: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    // ========== Order Workflow Errors ==========
    #[error("Illegal transition: {0}")]
    IllegalTransition(String),

    #[error("Cancellation not allowed: {0}")]
    CancellationNotAllowed(String),

    #[error("Out of stock: {0}")]
    OutOfStock(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    // ========== System Errors ==========
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status, stable error code, and client-safe message.
    ///
    /// Database/internal detail is logged here and replaced by a generic
    /// message so persistence failures never leak past the envelope.
    pub fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            // Authentication errors (401)
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "E3001",
                "Please login first".into(),
            ),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "E3002", "Invalid token".into()),

            // Authorization errors (403)
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "E2001", msg.clone()),

            // Not found (404)
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "E0003", msg.clone()),

            // Conflict (409)
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "E0004", msg.clone()),

            // Validation (400)
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "E0002", msg.clone()),

            // State machine rule violations (400)
            AppError::IllegalTransition(msg) => (StatusCode::BAD_REQUEST, "E0102", msg.clone()),
            AppError::CancellationNotAllowed(msg) => {
                (StatusCode::BAD_REQUEST, "E0103", msg.clone())
            }

            // Stock rules (422)
            AppError::OutOfStock(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "E0101", msg.clone()),
            AppError::InvalidQuantity(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "E0105", msg.clone())
            }

            // Database errors (500)
            AppError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E9002",
                    "Error, try again".into(),
                )
            }

            // Internal errors (500)
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E9001",
                    "Error, try again".into(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(ApiResponse::<()>::error(code, message));
        (status, body).into_response()
    }
}

// ========== Helper Constructors ==========

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Application-level Result type used by HTTP handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_detail_is_not_leaked() {
        let err = AppError::database("UNIQUE constraint failed: product.name");
        let (status, code, message) = err.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "E9002");
        assert!(!message.contains("UNIQUE"));
    }

    #[test]
    fn workflow_errors_map_to_expected_statuses() {
        assert_eq!(
            AppError::IllegalTransition("x".into()).parts().0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::OutOfStock("x".into()).parts().0,
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::conflict("dup").parts().0,
            StatusCode::CONFLICT
        );
    }
}
