use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::profile::{parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::{Order, OrderStatus};

pub fn insert_order(conn: &Connection, order: &Order) -> Result<(), DatabaseError> {
    let panel_ids = serde_json::to_string(&order.panel_ids)
        .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?;
    conn.execute(
        "INSERT INTO orders (id, profile_id, panel_ids, amount_cents, status, return_url, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            order.id.to_string(),
            order.profile_id.to_string(),
            panel_ids,
            order.amount_cents,
            order.status.as_str(),
            order.return_url,
            order.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_order(conn: &Connection, id: &Uuid) -> Result<Option<Order>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, profile_id, panel_ids, amount_cents, status, return_url, created_at
             FROM orders WHERE id = ?1",
            params![id.to_string()],
            order_row_from_rusqlite,
        )
        .optional()?;
    row.map(order_from_row).transpose()
}

/// Mark an order paid after the checkout redirect returns.
pub fn mark_order_paid(conn: &Connection, id: &Uuid) -> Result<Order, DatabaseError> {
    let order = get_order(conn, id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "order".into(),
        id: id.to_string(),
    })?;
    conn.execute(
        "UPDATE orders SET status = ?2 WHERE id = ?1",
        params![id.to_string(), OrderStatus::Paid.as_str()],
    )?;
    Ok(Order {
        status: OrderStatus::Paid,
        ..order
    })
}

struct OrderRow {
    id: String,
    profile_id: String,
    panel_ids: String,
    amount_cents: i64,
    status: String,
    return_url: String,
    created_at: String,
}

fn order_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<OrderRow, rusqlite::Error> {
    Ok(OrderRow {
        id: row.get(0)?,
        profile_id: row.get(1)?,
        panel_ids: row.get(2)?,
        amount_cents: row.get(3)?,
        status: row.get(4)?,
        return_url: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn order_from_row(row: OrderRow) -> Result<Order, DatabaseError> {
    let panel_ids: Vec<String> = serde_json::from_str(&row.panel_ids)
        .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?;
    Ok(Order {
        id: parse_uuid(&row.id)?,
        profile_id: parse_uuid(&row.profile_id)?,
        panel_ids,
        amount_cents: row.amount_cents,
        status: OrderStatus::from_str(&row.status)?,
        return_url: row.return_url,
        created_at: parse_timestamp(&row.created_at)?,
    })
}
