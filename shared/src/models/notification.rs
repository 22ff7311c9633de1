//! Notification Model
//!
//! Each user owns a bounded ring of messages: capacity 25, newest first.
//! Delivery is best-effort and always decoupled from the transaction that
//! triggered it.

use serde::{Deserialize, Serialize};

/// Ring buffer capacity per user
pub const RING_CAPACITY: i64 = 25;

/// Maximum header length after trimming
pub const MAX_HEADER_LEN: usize = 100;

/// Maximum body length after trimming
pub const MAX_BODY_LEN: usize = 250;

/// Message type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    Info,
    Warn,
    Accept,
    Reject,
}

/// A message on its way to a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub kind: MessageKind,
    pub header: String,
    pub body: String,
    pub recipient: i64,
}

impl Notification {
    pub fn new(
        kind: MessageKind,
        header: impl Into<String>,
        body: impl Into<String>,
        recipient: i64,
    ) -> Self {
        Self {
            kind,
            header: header.into(),
            body: body.into(),
            recipient,
        }
    }

    /// Clip the body to [`MAX_BODY_LEN`] bytes on a character boundary.
    /// For messages that must reach the user even when composed text
    /// (a rejection reason, a long entity name) overflows the ring limit.
    pub fn clipped(mut self) -> Self {
        if self.body.len() > MAX_BODY_LEN {
            let mut end = MAX_BODY_LEN;
            while !self.body.is_char_boundary(end) {
                end -= 1;
            }
            self.body.truncate(end);
        }
        self
    }

    /// Trim and enforce length limits. Returns `None` when the message is
    /// not deliverable (empty header or over limit).
    pub fn sanitized(mut self) -> Option<Self> {
        self.header = self.header.trim().to_string();
        self.body = self.body.trim().to_string();
        if self.header.is_empty() || self.header.len() > MAX_HEADER_LEN {
            return None;
        }
        if self.body.len() > MAX_BODY_LEN {
            return None;
        }
        Some(self)
    }
}

/// A message stored in a user's ring buffer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct StoredMessage {
    pub id: i64,
    pub user_id: i64,
    pub kind: MessageKind,
    pub header: String,
    pub body: String,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_trims_and_enforces_limits() {
        let n = Notification::new(MessageKind::Info, "  Order  ", "  placed  ", 1)
            .sanitized()
            .unwrap();
        assert_eq!(n.header, "Order");
        assert_eq!(n.body, "placed");

        let too_long = Notification::new(MessageKind::Info, "h".repeat(101), "", 1);
        assert!(too_long.sanitized().is_none());

        let long_body = Notification::new(MessageKind::Info, "h", "b".repeat(251), 1);
        assert!(long_body.sanitized().is_none());

        let empty_header = Notification::new(MessageKind::Info, "   ", "body", 1);
        assert!(empty_header.sanitized().is_none());
    }

    #[test]
    fn clipped_body_survives_sanitize() {
        let n = Notification::new(MessageKind::Reject, "Order", "b".repeat(400), 1)
            .clipped()
            .sanitized()
            .unwrap();
        assert_eq!(n.body.len(), MAX_BODY_LEN);

        // Clipping lands on a character boundary
        let n = Notification::new(MessageKind::Reject, "Order", "é".repeat(200), 1).clipped();
        assert!(n.body.len() <= MAX_BODY_LEN);
        assert!(n.body.chars().all(|c| c == 'é'));

        // Short bodies pass through untouched
        let n = Notification::new(MessageKind::Reject, "Order", "fine", 1).clipped();
        assert_eq!(n.body, "fine");
    }
}
