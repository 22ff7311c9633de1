//! Order Repository
//!
//! Active orders and their archive. The active → history move is always
//! performed by the caller inside one transaction.

use crate::error::ServiceResult;
use shared::models::order::{OrderTicket, TicketLine};
use shared::models::{ActiveOrder, OrderHistory, OrderLine, ShippingAddress, StateFilter, UserSummary};
use sqlx::{SqliteConnection, SqlitePool};

pub async fn items_of(conn: &mut SqliteConnection, order_id: i64) -> ServiceResult<Vec<OrderLine>> {
    let items = sqlx::query_as::<_, (i64, i64)>(
        "SELECT product_id, quantity FROM order_item WHERE order_id = ?",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?
    .into_iter()
    .map(|(product_id, quantity)| OrderLine {
        product_id,
        quantity,
    })
    .collect();
    Ok(items)
}

/// Load an active order with its line items populated
pub async fn find_active(
    conn: &mut SqliteConnection,
    id: i64,
) -> ServiceResult<Option<ActiveOrder>> {
    let order = sqlx::query_as::<_, ActiveOrder>("SELECT * FROM active_order WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match order {
        Some(mut order) => {
            order.items = items_of(conn, order.id).await?;
            Ok(Some(order))
        }
        None => Ok(None),
    }
}

pub async fn insert_active(conn: &mut SqliteConnection, order: &ActiveOrder) -> ServiceResult<()> {
    sqlx::query(
        "INSERT INTO active_order (id, order_code, user_id, ship_city, ship_contact, ship_street,
                                   state, ordered_on, verify_time, process_time, transit_time)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(order.id)
    .bind(&order.order_code)
    .bind(order.user_id)
    .bind(&order.ship_city)
    .bind(&order.ship_contact)
    .bind(&order.ship_street)
    .bind(order.state)
    .bind(order.ordered_on)
    .bind(order.verify_time)
    .bind(order.process_time)
    .bind(order.transit_time)
    .execute(&mut *conn)
    .await?;

    for item in &order.items {
        sqlx::query("INSERT INTO order_item (order_id, product_id, quantity) VALUES (?, ?, ?)")
            .bind(order.id)
            .bind(item.product_id)
            .bind(item.quantity)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// In-place state bump for non-terminal targets. The timestamp column is
/// written exactly once; later transitions never overwrite it.
pub async fn set_processing(conn: &mut SqliteConnection, id: i64, now: i64) -> ServiceResult<()> {
    sqlx::query("UPDATE active_order SET state = 'PROCESSING', process_time = ? WHERE id = ?")
        .bind(now)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn set_in_transit(conn: &mut SqliteConnection, id: i64, now: i64) -> ServiceResult<()> {
    sqlx::query("UPDATE active_order SET state = 'IN_TRANSIT', transit_time = ? WHERE id = ?")
        .bind(now)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Remove an active order and its line items. Part of the archive move.
pub async fn delete_active(conn: &mut SqliteConnection, id: i64) -> ServiceResult<()> {
    sqlx::query("DELETE FROM order_item WHERE order_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM active_order WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn insert_history(
    conn: &mut SqliteConnection,
    record: &OrderHistory,
) -> ServiceResult<()> {
    sqlx::query(
        "INSERT INTO order_history (id, order_code, user_id, ship_city, ship_contact, ship_street,
                                    state, ordered_on, verify_time, process_time, transit_time,
                                    complete_time, cancel_time, fail_time, items_json)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(record.id)
    .bind(&record.order_code)
    .bind(record.user_id)
    .bind(&record.ship_city)
    .bind(&record.ship_contact)
    .bind(&record.ship_street)
    .bind(record.state)
    .bind(record.ordered_on)
    .bind(record.verify_time)
    .bind(record.process_time)
    .bind(record.transit_time)
    .bind(record.complete_time)
    .bind(record.cancel_time)
    .bind(record.fail_time)
    .bind(&record.items_json)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn find_history(
    conn: &mut SqliteConnection,
    id: i64,
) -> ServiceResult<Option<OrderHistory>> {
    let record = sqlx::query_as::<_, OrderHistory>("SELECT * FROM order_history WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(record)
}

/// Dashboard projection: active orders with buyer, shipping snapshot and
/// product names dereferenced.
pub async fn tickets(pool: &SqlitePool, filter: StateFilter) -> ServiceResult<Vec<OrderTicket>> {
    let orders = match filter {
        StateFilter::All => {
            sqlx::query_as::<_, ActiveOrder>("SELECT * FROM active_order ORDER BY ordered_on")
                .fetch_all(pool)
                .await?
        }
        StateFilter::State(state) => sqlx::query_as::<_, ActiveOrder>(
            "SELECT * FROM active_order WHERE state = ? ORDER BY ordered_on",
        )
        .bind(state)
        .fetch_all(pool)
        .await?,
    };

    let mut result = Vec::with_capacity(orders.len());
    for order in orders {
        let buyer = sqlx::query_as::<_, UserSummary>(
            "SELECT id, email, first_name FROM user_account WHERE id = ?",
        )
        .bind(order.user_id)
        .fetch_optional(pool)
        .await?
        .unwrap_or(UserSummary {
            id: order.user_id,
            email: String::new(),
            first_name: String::new(),
        });

        let items = sqlx::query_as::<_, (i64, String, i64)>(
            "SELECT oi.product_id, p.name, oi.quantity
             FROM order_item oi JOIN product p ON p.id = oi.product_id
             WHERE oi.order_id = ?",
        )
        .bind(order.id)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|(product_id, product_name, quantity)| TicketLine {
            product_id,
            product_name,
            quantity,
        })
        .collect();

        result.push(OrderTicket {
            id: order.id,
            order_code: order.order_code,
            state: order.state,
            ordered_on: order.ordered_on,
            buyer,
            shipping: ShippingAddress {
                city: order.ship_city,
                contact: order.ship_contact,
                street: order.ship_street,
            },
            items,
        });
    }
    Ok(result)
}

/// A user's own orders, active side
pub async fn active_by_user(pool: &SqlitePool, user_id: i64) -> ServiceResult<Vec<ActiveOrder>> {
    let mut orders = sqlx::query_as::<_, ActiveOrder>(
        "SELECT * FROM active_order WHERE user_id = ? ORDER BY ordered_on DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    for order in &mut orders {
        order.items = sqlx::query_as::<_, (i64, i64)>(
            "SELECT product_id, quantity FROM order_item WHERE order_id = ?",
        )
        .bind(order.id)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|(product_id, quantity)| OrderLine {
            product_id,
            quantity,
        })
        .collect();
    }
    Ok(orders)
}

/// A user's own orders, archived side
pub async fn history_by_user(pool: &SqlitePool, user_id: i64) -> ServiceResult<Vec<OrderHistory>> {
    let records = sqlx::query_as::<_, OrderHistory>(
        "SELECT * FROM order_history WHERE user_id = ? ORDER BY ordered_on DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(records)
}
