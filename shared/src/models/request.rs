//! Moderation Request Model
//!
//! A staged, not-yet-applied mutation awaiting approval. The target domain
//! (category / product / merchant) is implicit in which table holds the
//! request; the shape is identical across domains.

use serde::{Deserialize, Serialize};

use super::user::UserSummary;

/// The kind of mutation a request proposes. Exactly one payload kind per
/// request, tagged explicitly rather than inferred from populated fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModerationKind {
    Create,
    Update,
    Delete,
}

impl ModerationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationKind::Create => "CREATE",
            ModerationKind::Update => "UPDATE",
            ModerationKind::Delete => "DELETE",
        }
    }
}

/// A pending moderation request row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ModerationRequest {
    pub id: i64,
    pub kind: ModerationKind,
    /// The proposed document, serialized per-kind
    pub payload_json: String,
    pub submitted_by: i64,
    pub created_at: i64,
}

/// Listing view: request with submitter and target dereferenced for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestSummary {
    pub id: i64,
    pub kind: ModerationKind,
    pub payload: serde_json::Value,
    pub submitter: Option<UserSummary>,
    /// Current live entity the request targets (UPDATE/DELETE only)
    pub target: Option<serde_json::Value>,
    pub created_at: i64,
}
