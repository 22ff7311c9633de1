//! Category Model

use serde::{Deserialize, Serialize};

/// Category entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// Number of live products in this category, maintained by the
    /// product moderation workflow
    pub product_count: i64,
    pub created_by: i64,
    pub created_at: i64,
}

/// Proposed category creation (moderation payload)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCreateDoc {
    pub name: String,
    pub description: String,
}

/// Proposed category update (moderation payload, field merge)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryUpdateDoc {
    pub category_id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub product_count: Option<i64>,
}
