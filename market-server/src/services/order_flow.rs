//! Order State Machine
//!
//! Owns the lifecycle of one order from placement to terminal state.
//! Every multi-document effect (stock debit/credit + order record move)
//! runs inside a single transaction; notifications are dispatched only
//! after a successful commit.

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::db;
use crate::error::{ServiceError, ServiceResult};
use crate::services::notify::{self, NotificationSink};
use crate::services::ledger;
use shared::error::AppError;
use shared::models::order::{MAX_ORDER_LINES, OrderTicket};
use shared::models::{
    ActiveOrder, MessageKind, Notification, OrderHistory, OrderLine, OrderState, Role,
    ShippingAddress, StateFilter,
};
use shared::util::{now_millis, order_code, snowflake_id};

/// Which side of the active/history split a record query reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSide {
    Current,
    Past,
}

impl RecordSide {
    pub fn parse(value: &str) -> Option<RecordSide> {
        match value.trim().to_uppercase().as_str() {
            "CURR" => Some(RecordSide::Current),
            "PAST" => Some(RecordSide::Past),
            _ => None,
        }
    }
}

pub struct OrderService {
    pool: SqlitePool,
    sink: Arc<dyn NotificationSink>,
}

impl OrderService {
    pub fn new(pool: SqlitePool, sink: Arc<dyn NotificationSink>) -> Self {
        Self { pool, sink }
    }

    /// Place an order: reserve stock for every line and create the active
    /// record in VERIFYING, all inside one transaction.
    ///
    /// Stock is validated against the live quantity inside the same
    /// transaction that debits it, for every line. (The single-item path
    /// checked but the multi-item path did not; checking uniformly closes
    /// that oversell window.)
    pub async fn place_order(
        &self,
        buyer: i64,
        lines: Vec<OrderLine>,
        shipping: ShippingAddress,
    ) -> ServiceResult<ActiveOrder> {
        if lines.is_empty() {
            return Err(AppError::validation("Order must contain at least one item").into());
        }
        if lines.len() > MAX_ORDER_LINES {
            return Err(AppError::validation("Order quantity exceeds allowed limit").into());
        }
        for line in &lines {
            if line.quantity < 1 {
                return Err(AppError::InvalidQuantity(format!(
                    "Quantity for product {} must be at least 1",
                    line.product_id
                ))
                .into());
            }
        }
        let mut seen = std::collections::HashSet::new();
        if !lines.iter().all(|l| seen.insert(l.product_id)) {
            return Err(AppError::validation("Duplicate product in order").into());
        }

        let mut tx = self.pool.begin().await?;

        // Check-then-debit per line; any failure rolls back every debit
        for line in &lines {
            let stock = ledger::stock_of(&mut tx, line.product_id)
                .await?
                .ok_or_else(|| {
                    ServiceError::from(AppError::not_found(format!(
                        "Product {} not found",
                        line.product_id
                    )))
                })?;
            if stock < line.quantity {
                return Err(AppError::OutOfStock(format!(
                    "Product {} has {} in stock",
                    line.product_id, stock
                ))
                .into());
            }
            ledger::debit(&mut tx, line.product_id, line.quantity).await?;
        }

        let now = now_millis();
        let order = ActiveOrder {
            id: snowflake_id(),
            order_code: order_code(),
            user_id: buyer,
            ship_city: shipping.city,
            ship_contact: shipping.contact,
            ship_street: shipping.street,
            state: OrderState::Verifying,
            ordered_on: now,
            verify_time: now,
            process_time: None,
            transit_time: None,
            items: lines,
        };
        db::order::insert_active(&mut tx, &order).await?;

        tx.commit().await?;

        notify::dispatch(
            &self.sink,
            Notification::new(
                MessageKind::Info,
                "Order",
                format!("Your order has been placed!\n Order: #{}", order.order_code),
                buyer,
            ),
        );

        Ok(order)
    }

    /// Drive an order ticket to `target`.
    ///
    /// Requesting the current state is a no-op success; any pair outside
    /// the transition table is rejected without touching the order.
    pub async fn advance(&self, order_id: i64, target: OrderState) -> ServiceResult<String> {
        self.transition(order_id, target, None).await
    }

    /// Buyer-initiated cancellation, legal only while VERIFYING.
    pub async fn cancel(&self, order_id: i64, buyer: i64) -> ServiceResult<String> {
        self.transition(order_id, OrderState::Canceled, Some(buyer))
            .await?;
        Ok("Order cancelled".to_string())
    }

    /// The guards run against the same snapshot the transition commits, so
    /// a cancel cannot land on an order a manager advanced concurrently.
    async fn transition(
        &self,
        order_id: i64,
        target: OrderState,
        cancelling_buyer: Option<i64>,
    ) -> ServiceResult<String> {
        let mut tx = self.pool.begin().await?;

        let order = db::order::find_active(&mut tx, order_id)
            .await?
            .ok_or_else(|| ServiceError::from(AppError::not_found("No active order found")))?;

        if let Some(buyer) = cancelling_buyer {
            if order.user_id != buyer {
                return Err(AppError::forbidden("Not your order").into());
            }
            if order.state != OrderState::Verifying {
                return Err(AppError::CancellationNotAllowed(format!(
                    "Order is already {}",
                    order.state.as_str()
                ))
                .into());
            }
        }

        if order.state == target {
            return Ok("Nothing to update".to_string());
        }
        if !order.state.can_advance_to(target) {
            return Err(AppError::IllegalTransition(format!(
                "{} -> {}",
                order.state.as_str(),
                target.as_str()
            ))
            .into());
        }

        let now = now_millis();
        match target {
            OrderState::Processing => {
                db::order::set_processing(&mut tx, order.id, now).await?;
                tx.commit().await?;

                self.notify_buyer(
                    &order,
                    MessageKind::Accept,
                    format!(
                        "Your order has been verified. Currently being processed.\n Order: #{}",
                        order.order_code
                    ),
                );
                Ok("Ticket status updated to PROCESSING".to_string())
            }

            OrderState::InTransit => {
                db::order::set_in_transit(&mut tx, order.id, now).await?;

                // Gather depleted products while the transaction can still
                // observe a consistent stock view
                let mut depleted = Vec::new();
                for item in &order.items {
                    if ledger::stock_of(&mut tx, item.product_id).await? == Some(0) {
                        depleted.push(item.product_id);
                    }
                }
                tx.commit().await?;

                self.notify_buyer(
                    &order,
                    MessageKind::Accept,
                    format!("Your order has been dispatched.\n Order: #{}", order.order_code),
                );
                self.alert_stock_depleted(&depleted).await;
                Ok("Ticket status updated to IN_TRANSIT".to_string())
            }

            OrderState::Canceled | OrderState::Failed => {
                for item in &order.items {
                    ledger::credit(&mut tx, item.product_id, item.quantity).await?;
                }
                let record = archive_record(&order, target, now)?;
                db::order::delete_active(&mut tx, order.id).await?;
                db::order::insert_history(&mut tx, &record).await?;
                tx.commit().await?;

                let body = if target == OrderState::Canceled {
                    format!("Your order has been cancelled.\n Order: #{}", order.order_code)
                } else {
                    format!("Your order has failed.\n Order: #{}", order.order_code)
                };
                self.notify_buyer(&order, MessageKind::Reject, body);
                Ok(format!("Ticket status updated to {}", target.as_str()))
            }

            OrderState::Completed => {
                let record = archive_record(&order, target, now)?;
                db::order::delete_active(&mut tx, order.id).await?;
                db::order::insert_history(&mut tx, &record).await?;
                tx.commit().await?;

                self.notify_buyer(
                    &order,
                    MessageKind::Accept,
                    format!(
                        "Your order has been delivered. Enjoy!\n Order: #{}",
                        order.order_code
                    ),
                );
                Ok("Order completed".to_string())
            }

            // VERIFYING is never a legal target
            OrderState::Verifying => unreachable!("rejected by the transition table"),
        }
    }

    /// Read-only ticket projection for operational dashboards.
    pub async fn tickets(&self, filter: StateFilter) -> ServiceResult<Vec<OrderTicket>> {
        db::order::tickets(&self.pool, filter).await
    }

    /// A buyer's own orders, current or archived.
    pub async fn records(&self, user_id: i64, side: RecordSide) -> ServiceResult<serde_json::Value> {
        match side {
            RecordSide::Current => {
                let orders = db::order::active_by_user(&self.pool, user_id).await?;
                Ok(serde_json::to_value(orders)?)
            }
            RecordSide::Past => {
                let records = db::order::history_by_user(&self.pool, user_id).await?;
                Ok(serde_json::to_value(records)?)
            }
        }
    }

    fn notify_buyer(&self, order: &ActiveOrder, kind: MessageKind, body: String) {
        notify::dispatch(
            &self.sink,
            Notification::new(kind, "Order", body, order.user_id),
        );
    }

    /// Out-of-stock fan-out: alert the owning merchant and every manager.
    /// Best-effort, after commit.
    async fn alert_stock_depleted(&self, product_ids: &[i64]) {
        for product_id in product_ids {
            let alert = match self.stock_alert_targets(*product_id).await {
                Ok(alert) => alert,
                Err(e) => {
                    let err: AppError = e.into();
                    tracing::warn!(product_id, error = %err, "Stock alert lookup failed");
                    continue;
                }
            };
            let (body, recipients) = alert;
            for recipient in recipients {
                notify::dispatch(
                    &self.sink,
                    Notification::new(MessageKind::Warn, "Out of stock", body.clone(), recipient),
                );
            }
        }
    }

    async fn stock_alert_targets(&self, product_id: i64) -> ServiceResult<(String, Vec<i64>)> {
        let mut conn = self.pool.acquire().await?;
        let product = db::product::find_by_id(&mut conn, product_id)
            .await?
            .ok_or_else(|| ServiceError::from(AppError::not_found("Product vanished")))?;
        let merchant = db::merchant::find_by_id(&mut conn, product.merchant_id).await?;
        drop(conn);

        let body = format!(
            "{} is now out of stock. Please replenish the stock. Product code: #{}",
            product.name, product.product_code
        );

        let mut recipients = db::user_account::ids_by_role(&self.pool, Role::Manager).await?;
        if let Some(merchant) = merchant {
            recipients.push(merchant.user_id);
        }
        Ok((body, recipients))
    }
}

/// Build the history record for the active → history move. Each terminal
/// state stamps exactly its own timestamp; earlier stamps carry over.
fn archive_record(
    order: &ActiveOrder,
    terminal: OrderState,
    now: i64,
) -> ServiceResult<OrderHistory> {
    let mut record = OrderHistory {
        id: order.id,
        order_code: order.order_code.clone(),
        user_id: order.user_id,
        ship_city: order.ship_city.clone(),
        ship_contact: order.ship_contact.clone(),
        ship_street: order.ship_street.clone(),
        state: terminal,
        ordered_on: order.ordered_on,
        verify_time: order.verify_time,
        process_time: order.process_time,
        transit_time: order.transit_time,
        complete_time: None,
        cancel_time: None,
        fail_time: None,
        items_json: serde_json::to_string(&order.items)?,
    };
    match terminal {
        OrderState::Completed => record.complete_time = Some(now),
        OrderState::Canceled => record.cancel_time = Some(now),
        OrderState::Failed => record.fail_time = Some(now),
        _ => {
            return Err(ServiceError::Db(
                format!("{} is not a terminal state", terminal.as_str()).into(),
            ));
        }
    }
    Ok(record)
}
