//! Merchant Model

use serde::{Deserialize, Serialize};

/// Merchant entity, linked to the user account that owns the storefront
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Merchant {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: String,
    pub created_at: i64,
}

/// Proposed merchant creation (moderation payload)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantCreateDoc {
    pub user_id: i64,
    pub name: String,
    pub description: String,
}

/// Proposed merchant update (moderation payload, field merge)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantUpdateDoc {
    pub merchant_id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
}
