//! Order Models
//!
//! An order lives in exactly one of two tables: `active_order` while its
//! state is non-terminal, `order_history` once it reaches a terminal state.
//! Moving between them is a move, not a copy.

use serde::{Deserialize, Serialize};

/// Hard cap on line items per order
pub const MAX_ORDER_LINES: usize = 9;

/// Order lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    Verifying,
    Processing,
    InTransit,
    Completed,
    Canceled,
    Failed,
}

impl OrderState {
    pub const ALL: [OrderState; 6] = [
        OrderState::Verifying,
        OrderState::Processing,
        OrderState::InTransit,
        OrderState::Completed,
        OrderState::Canceled,
        OrderState::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Verifying => "VERIFYING",
            OrderState::Processing => "PROCESSING",
            OrderState::InTransit => "IN_TRANSIT",
            OrderState::Completed => "COMPLETED",
            OrderState::Canceled => "CANCELED",
            OrderState::Failed => "FAILED",
        }
    }

    pub fn parse(value: &str) -> Option<OrderState> {
        match value.trim().to_uppercase().as_str() {
            "VERIFYING" => Some(OrderState::Verifying),
            "PROCESSING" => Some(OrderState::Processing),
            "IN_TRANSIT" => Some(OrderState::InTransit),
            "COMPLETED" => Some(OrderState::Completed),
            "CANCELED" => Some(OrderState::Canceled),
            "FAILED" => Some(OrderState::Failed),
            _ => None,
        }
    }

    /// Terminal states live in `order_history` and accept no transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderState::Completed | OrderState::Canceled | OrderState::Failed
        )
    }

    /// The transition table.
    ///
    /// ```text
    /// VERIFYING   -> PROCESSING | CANCELED | FAILED
    /// PROCESSING  -> IN_TRANSIT | CANCELED | FAILED
    /// IN_TRANSIT  -> COMPLETED
    /// ```
    pub fn can_advance_to(&self, target: OrderState) -> bool {
        match self {
            OrderState::Verifying => matches!(
                target,
                OrderState::Processing | OrderState::Canceled | OrderState::Failed
            ),
            OrderState::Processing => matches!(
                target,
                OrderState::InTransit | OrderState::Canceled | OrderState::Failed
            ),
            OrderState::InTransit => matches!(target, OrderState::Completed),
            OrderState::Completed | OrderState::Canceled | OrderState::Failed => false,
        }
    }
}

/// State filter for the operational ticket dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateFilter {
    All,
    State(OrderState),
}

impl StateFilter {
    pub fn parse(value: &str) -> Option<StateFilter> {
        if value.trim().eq_ignore_ascii_case("ALL") {
            return Some(StateFilter::All);
        }
        OrderState::parse(value).map(StateFilter::State)
    }
}

/// One order line: product reference + quantity reserved from stock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: i64,
    pub quantity: i64,
}

/// Delivery address snapshot taken at order time. A copy, never a live
/// reference, so later address-book edits cannot mutate past orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub city: String,
    pub contact: String,
    pub street: String,
}

/// An order in a non-terminal state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ActiveOrder {
    pub id: i64,
    /// Human-presentable unique code, fixed length, distinct from `id`
    pub order_code: String,
    pub user_id: i64,
    pub ship_city: String,
    pub ship_contact: String,
    pub ship_street: String,
    pub state: OrderState,
    pub ordered_on: i64,
    pub verify_time: i64,
    pub process_time: Option<i64>,
    pub transit_time: Option<i64>,

    /// Line items (junction table, populated by application code)
    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(default)]
    pub items: Vec<OrderLine>,
}

/// An archived order in a terminal state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderHistory {
    pub id: i64,
    pub order_code: String,
    pub user_id: i64,
    pub ship_city: String,
    pub ship_contact: String,
    pub ship_street: String,
    pub state: OrderState,
    pub ordered_on: i64,
    pub verify_time: i64,
    pub process_time: Option<i64>,
    pub transit_time: Option<i64>,
    pub complete_time: Option<i64>,
    pub cancel_time: Option<i64>,
    pub fail_time: Option<i64>,
    /// Line items denormalized at archive time
    pub items_json: String,
}

impl OrderHistory {
    pub fn items(&self) -> Vec<OrderLine> {
        serde_json::from_str(&self.items_json).unwrap_or_default()
    }
}

/// Dashboard projection of an active order ticket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderTicket {
    pub id: i64,
    pub order_code: String,
    pub state: OrderState,
    pub ordered_on: i64,
    pub buyer: super::user::UserSummary,
    pub shipping: ShippingAddress,
    pub items: Vec<TicketLine>,
}

/// Ticket line with the product name dereferenced for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketLine {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table_matches_lifecycle() {
        use OrderState::*;
        assert!(Verifying.can_advance_to(Processing));
        assert!(Verifying.can_advance_to(Canceled));
        assert!(Verifying.can_advance_to(Failed));
        assert!(!Verifying.can_advance_to(InTransit));
        assert!(!Verifying.can_advance_to(Completed));

        assert!(Processing.can_advance_to(InTransit));
        assert!(!Processing.can_advance_to(Completed));

        assert!(InTransit.can_advance_to(Completed));
        assert!(!InTransit.can_advance_to(Canceled));

        for terminal in [Completed, Canceled, Failed] {
            assert!(terminal.is_terminal());
            for target in OrderState::ALL {
                assert!(!terminal.can_advance_to(target));
            }
        }
    }

    #[test]
    fn state_round_trips_through_strings() {
        for state in OrderState::ALL {
            assert_eq!(OrderState::parse(state.as_str()), Some(state));
        }
        assert_eq!(OrderState::parse(" in_transit "), Some(OrderState::InTransit));
        assert_eq!(OrderState::parse("SHIPPED"), None);
        assert_eq!(StateFilter::parse("all"), Some(StateFilter::All));
    }
}
