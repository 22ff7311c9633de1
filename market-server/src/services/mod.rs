//! Workflow services
//!
//! Business rules live here; the `db` layer stays mechanical. Each service
//! borrows the pool and collaborators from [`crate::state::AppState`].

pub mod blob;
pub mod ledger;
pub mod moderation;
pub mod notify;
pub mod order_flow;
