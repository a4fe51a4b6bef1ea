//! # Purchase Order Repository
//!
//! SQLite storage of purchase orders and their lines.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  insert ──► Pending ──► Approved ──► Shipped ──► Received               │
//! │                │            │           │                               │
//! │                └────────────┴───────────┴──────► Cancelled              │
//! │                                                                         │
//! │  update(): only while not Received / Cancelled                          │
//! │  set_status(): follows the arrows above                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use ferreteria_core::{LineItem, OrderHeader, OrderStatus, PurchaseOrder, Totals};

use super::rows;
use super::{build_order, ensure_order_editable, ensure_transition};
use crate::error::{DbError, DbResult};

const ORDER_COLUMNS: &str = "id, number, order_date, expected_delivery, supplier_id, status, \
     delivery_address, observations, \
     subtotal, total_discount, taxable_base, tax, grand_total, created_at, updated_at";

/// Repository for purchase-order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order with its lines.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<PurchaseOrder>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM purchase_orders WHERE id = ?1",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let lines = self.get_lines(id).await?;
                Ok(Some(order_from_row(&row, lines)?))
            }
            None => Ok(None),
        }
    }

    /// Lists all orders, newest first.
    pub async fn list(&self) -> DbResult<Vec<PurchaseOrder>> {
        let order_rows = sqlx::query(&format!(
            "SELECT {} FROM purchase_orders ORDER BY order_date DESC, number DESC",
            ORDER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(order_rows.len());
        for row in order_rows {
            let id: String = row.try_get("id")?;
            let lines = self.get_lines(&id).await?;
            orders.push(order_from_row(&row, lines)?);
        }

        debug!(count = orders.len(), "Listed purchase orders");
        Ok(orders)
    }

    /// Lists orders in one status (e.g. the "to receive" screen).
    pub async fn list_by_status(&self, status: OrderStatus) -> DbResult<Vec<PurchaseOrder>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|order| order.status == status)
            .collect())
    }

    /// Gets the lines of an order in display order.
    pub async fn get_lines(&self, order_id: &str) -> DbResult<Vec<LineItem>> {
        let line_rows = sqlx::query(
            r#"
            SELECT product_ref, product_name, quantity, unit_price
            FROM order_lines
            WHERE order_id = ?1
            ORDER BY position
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        line_rows
            .iter()
            .map(|row| rows::line_item(row, false))
            .collect()
    }

    /// All order numbers, for numbering.
    pub async fn numbers(&self) -> DbResult<Vec<String>> {
        let numbers: Vec<String> = sqlx::query_scalar("SELECT number FROM purchase_orders")
            .fetch_all(&self.pool)
            .await?;
        Ok(numbers)
    }

    /// Inserts a new order with its lines.
    pub async fn insert(
        &self,
        header: OrderHeader,
        lines: Vec<LineItem>,
        totals: Totals,
    ) -> DbResult<PurchaseOrder> {
        let now = Utc::now();
        let order = build_order(Uuid::new_v4().to_string(), header, lines, totals, now, now);

        debug!(id = %order.id, number = %order.number, "Inserting purchase order");

        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!(
            "INSERT INTO purchase_orders ({}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            ORDER_COLUMNS
        ))
        .bind(&order.id)
        .bind(&order.number)
        .bind(order.order_date)
        .bind(order.expected_delivery)
        .bind(&order.supplier_id)
        .bind(order.status)
        .bind(&order.delivery_address)
        .bind(&order.observations)
        .bind(rows::text(order.totals.subtotal.amount()))
        .bind(rows::text(order.totals.total_discount.amount()))
        .bind(rows::text(order.totals.taxable_base.amount()))
        .bind(rows::text(order.totals.tax.amount()))
        .bind(rows::text(order.totals.grand_total.amount()))
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| rows::number_conflict(e.into(), &order.number))?;

        insert_lines(&mut tx, &order.id, &order.lines).await?;
        tx.commit().await?;

        Ok(order)
    }

    /// Overwrites header, lines and totals of an open order.
    pub async fn update(
        &self,
        id: &str,
        header: OrderHeader,
        lines: Vec<LineItem>,
        totals: Totals,
    ) -> DbResult<PurchaseOrder> {
        let existing = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Purchase order", id))?;
        ensure_order_editable(&existing, header.status)?;

        let order = build_order(
            existing.id,
            header,
            lines,
            totals,
            existing.created_at,
            Utc::now(),
        );

        debug!(id = %order.id, number = %order.number, lines = order.lines.len(), "Updating purchase order");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE purchase_orders SET
                number = ?2, order_date = ?3, expected_delivery = ?4,
                supplier_id = ?5, status = ?6,
                delivery_address = ?7, observations = ?8,
                subtotal = ?9, total_discount = ?10, taxable_base = ?11,
                tax = ?12, grand_total = ?13,
                updated_at = ?14
            WHERE id = ?1 AND status NOT IN ('received', 'cancelled')
            "#,
        )
        .bind(&order.id)
        .bind(&order.number)
        .bind(order.order_date)
        .bind(order.expected_delivery)
        .bind(&order.supplier_id)
        .bind(order.status)
        .bind(&order.delivery_address)
        .bind(&order.observations)
        .bind(rows::text(order.totals.subtotal.amount()))
        .bind(rows::text(order.totals.total_discount.amount()))
        .bind(rows::text(order.totals.taxable_base.amount()))
        .bind(rows::text(order.totals.tax.amount()))
        .bind(rows::text(order.totals.grand_total.amount()))
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| rows::number_conflict(e.into(), &order.number))?;

        if result.rows_affected() == 0 {
            return Err(DbError::invalid_state(format!(
                "purchase order {} was closed while being edited",
                order.number
            )));
        }

        sqlx::query("DELETE FROM order_lines WHERE order_id = ?1")
            .bind(&order.id)
            .execute(&mut *tx)
            .await?;
        insert_lines(&mut tx, &order.id, &order.lines).await?;

        tx.commit().await?;
        Ok(order)
    }

    /// Moves an order to a new status.
    ///
    /// ## Rules
    /// - Received and Cancelled are final
    /// - only a Shipped order can be Received
    pub async fn set_status(&self, id: &str, status: OrderStatus) -> DbResult<PurchaseOrder> {
        let mut order = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Purchase order", id))?;
        ensure_transition(&order, status)?;

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE purchase_orders SET status = ?3, updated_at = ?4 WHERE id = ?1 AND status = ?2",
        )
        .bind(id)
        .bind(order.status)
        .bind(status)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::invalid_state(format!(
                "purchase order {} changed status concurrently",
                order.number
            )));
        }

        info!(id = %id, number = %order.number, from = %order.status, to = %status, "Order status changed");
        order.status = status;
        order.updated_at = now;
        Ok(order)
    }
}

async fn insert_lines(
    tx: &mut Transaction<'_, Sqlite>,
    order_id: &str,
    lines: &[LineItem],
) -> DbResult<()> {
    for (position, line) in lines.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO order_lines (
                order_id, position, product_ref, product_name, quantity, unit_price
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(order_id)
        .bind(position as i64)
        .bind(line.product_ref.as_str())
        .bind(&line.product_name)
        .bind(rows::text(line.quantity))
        .bind(rows::text(line.unit_price.amount()))
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

fn order_from_row(row: &SqliteRow, lines: Vec<LineItem>) -> DbResult<PurchaseOrder> {
    Ok(PurchaseOrder {
        id: row.try_get("id")?,
        number: row.try_get("number")?,
        order_date: row.try_get("order_date")?,
        expected_delivery: row.try_get("expected_delivery")?,
        supplier_id: row.try_get("supplier_id")?,
        status: row.try_get("status")?,
        delivery_address: row.try_get("delivery_address")?,
        observations: row.try_get("observations")?,
        lines,
        totals: rows::totals(row)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
