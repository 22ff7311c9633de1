//! Shared types for the marketplace workflow services
//!
//! This crate holds everything the server binary and its tests agree on:
//!
//! - **Models** (`models`): orders, products, categories, merchants,
//!   moderation requests, notifications
//! - **Errors** (`error`): unified [`AppError`] with HTTP status mapping
//! - **Response** (`response`): the `{code, message, data}` envelope every
//!   endpoint returns
//! - **Utilities** (`util`): wall-clock capture, snowflake IDs, order codes

pub mod error;
pub mod models;
pub mod response;
pub mod util;

pub use error::{AppError, AppResult};
pub use response::ApiResponse;
