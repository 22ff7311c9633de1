//! Marketplace workflow server
//!
//! # Module structure
//!
//! ```text
//! market-server/src/
//! ├── config.rs      # Environment configuration
//! ├── error.rs       # Service-layer error bridge
//! ├── state.rs       # Shared application state
//! ├── auth/          # JWT bearer authentication
//! ├── db/            # SQLite pool, migrations, repositories
//! ├── services/      # Order state machine, moderation, ledger, notify, blobs
//! └── api/           # HTTP routes and handlers
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod services;
pub mod state;
pub mod validation;

#[cfg(test)]
pub mod testutil;

pub use auth::{CurrentUser, JwtService};
pub use config::Config;
pub use error::{ServiceError, ServiceResult};
pub use state::AppState;
