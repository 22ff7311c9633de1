//! User account and role types

use serde::{Deserialize, Serialize};

/// Marketplace roles.
///
/// DEO (data-entry operator) proposes catalog mutations but cannot apply
/// them; Manager approves moderation requests and drives order tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Customer,
    Deo,
    Manager,
    Merchant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "CUSTOMER",
            Role::Deo => "DEO",
            Role::Manager => "MANAGER",
            Role::Merchant => "MERCHANT",
        }
    }

    pub fn parse(value: &str) -> Option<Role> {
        match value.trim().to_uppercase().as_str() {
            "CUSTOMER" => Some(Role::Customer),
            "DEO" => Some(Role::Deo),
            "MANAGER" => Some(Role::Manager),
            "MERCHANT" => Some(Role::Merchant),
            _ => None,
        }
    }
}

/// User account entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct UserAccount {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub role: Role,
}

/// Minimal user projection for dashboards and request listings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct UserSummary {
    pub id: i64,
    pub email: String,
    pub first_name: String,
}
