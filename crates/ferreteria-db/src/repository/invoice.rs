//! # Invoice Repository
//!
//! SQLite storage of invoices and their lines.
//!
//! ## Invoice Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. INSERT   insert(header, lines, totals) → Invoice { id: uuid }       │
//! │                                                                         │
//! │  2. EDIT     update(id, ...) → header + totals overwritten,             │
//! │              lines deleted and re-inserted in one transaction           │
//! │              (rejected once the invoice is voided)                      │
//! │                                                                         │
//! │  3. VOID     void(id) → status = voided, final                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tracing::debug;
use uuid::Uuid;

use ferreteria_core::{Invoice, InvoiceHeader, InvoiceStatus, LineItem, Totals};

use super::rows;
use super::{build_invoice, ensure_invoice_editable, ensure_voidable};
use crate::error::{DbError, DbResult};

const INVOICE_COLUMNS: &str = "id, number, date, client_id, status, payment_method, observations, \
     subtotal, total_discount, taxable_base, tax, grand_total, created_at, updated_at";

/// Repository for invoice database operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Gets an invoice with its lines.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        let row = sqlx::query(&format!("SELECT {} FROM invoices WHERE id = ?1", INVOICE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let lines = self.get_lines(id).await?;
                Ok(Some(invoice_from_row(&row, lines)?))
            }
            None => Ok(None),
        }
    }

    /// Lists all invoices, newest first.
    pub async fn list(&self) -> DbResult<Vec<Invoice>> {
        let invoice_rows = sqlx::query(&format!(
            "SELECT {} FROM invoices ORDER BY date DESC, number DESC",
            INVOICE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut invoices = Vec::with_capacity(invoice_rows.len());
        for row in invoice_rows {
            let id: String = row.try_get("id")?;
            let lines = self.get_lines(&id).await?;
            invoices.push(invoice_from_row(&row, lines)?);
        }

        debug!(count = invoices.len(), "Listed invoices");
        Ok(invoices)
    }

    /// Gets the lines of an invoice in display order.
    pub async fn get_lines(&self, invoice_id: &str) -> DbResult<Vec<LineItem>> {
        let line_rows = sqlx::query(
            r#"
            SELECT product_ref, product_name, quantity, unit_price, discount_percent
            FROM invoice_lines
            WHERE invoice_id = ?1
            ORDER BY position
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        line_rows
            .iter()
            .map(|row| rows::line_item(row, true))
            .collect()
    }

    /// All invoice numbers, for numbering.
    pub async fn numbers(&self) -> DbResult<Vec<String>> {
        let numbers: Vec<String> = sqlx::query_scalar("SELECT number FROM invoices")
            .fetch_all(&self.pool)
            .await?;
        Ok(numbers)
    }

    /// Inserts a new invoice with its lines.
    pub async fn insert(
        &self,
        header: InvoiceHeader,
        lines: Vec<LineItem>,
        totals: Totals,
    ) -> DbResult<Invoice> {
        let now = Utc::now();
        let invoice = build_invoice(Uuid::new_v4().to_string(), header, lines, totals, now, now);

        debug!(id = %invoice.id, number = %invoice.number, "Inserting invoice");

        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!(
            "INSERT INTO invoices ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            INVOICE_COLUMNS
        ))
        .bind(&invoice.id)
        .bind(&invoice.number)
        .bind(invoice.date)
        .bind(&invoice.client_id)
        .bind(invoice.status)
        .bind(invoice.payment_method)
        .bind(&invoice.observations)
        .bind(rows::text(invoice.totals.subtotal.amount()))
        .bind(rows::text(invoice.totals.total_discount.amount()))
        .bind(rows::text(invoice.totals.taxable_base.amount()))
        .bind(rows::text(invoice.totals.tax.amount()))
        .bind(rows::text(invoice.totals.grand_total.amount()))
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| rows::number_conflict(e.into(), &invoice.number))?;

        insert_lines(&mut tx, &invoice.id, &invoice.lines).await?;
        tx.commit().await?;

        Ok(invoice)
    }

    /// Overwrites header, lines and totals of an existing invoice.
    pub async fn update(
        &self,
        id: &str,
        header: InvoiceHeader,
        lines: Vec<LineItem>,
        totals: Totals,
    ) -> DbResult<Invoice> {
        let existing = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", id))?;
        ensure_invoice_editable(&existing)?;

        let invoice = build_invoice(
            existing.id,
            header,
            lines,
            totals,
            existing.created_at,
            Utc::now(),
        );

        debug!(id = %invoice.id, number = %invoice.number, lines = invoice.lines.len(), "Updating invoice");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE invoices SET
                number = ?2, date = ?3, client_id = ?4, status = ?5,
                payment_method = ?6, observations = ?7,
                subtotal = ?8, total_discount = ?9, taxable_base = ?10,
                tax = ?11, grand_total = ?12,
                updated_at = ?13
            WHERE id = ?1 AND status != 'voided'
            "#,
        )
        .bind(&invoice.id)
        .bind(&invoice.number)
        .bind(invoice.date)
        .bind(&invoice.client_id)
        .bind(invoice.status)
        .bind(invoice.payment_method)
        .bind(&invoice.observations)
        .bind(rows::text(invoice.totals.subtotal.amount()))
        .bind(rows::text(invoice.totals.total_discount.amount()))
        .bind(rows::text(invoice.totals.taxable_base.amount()))
        .bind(rows::text(invoice.totals.tax.amount()))
        .bind(rows::text(invoice.totals.grand_total.amount()))
        .bind(invoice.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| rows::number_conflict(e.into(), &invoice.number))?;

        if result.rows_affected() == 0 {
            return Err(DbError::invalid_state(format!(
                "invoice {} was closed while being edited",
                invoice.number
            )));
        }

        sqlx::query("DELETE FROM invoice_lines WHERE invoice_id = ?1")
            .bind(&invoice.id)
            .execute(&mut *tx)
            .await?;
        insert_lines(&mut tx, &invoice.id, &invoice.lines).await?;

        tx.commit().await?;
        Ok(invoice)
    }

    /// Voids an invoice. Voiding twice is rejected.
    pub async fn void(&self, id: &str) -> DbResult<Invoice> {
        let mut invoice = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", id))?;
        ensure_voidable(&invoice)?;

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE invoices SET status = ?2, updated_at = ?3 WHERE id = ?1 AND status != 'voided'",
        )
        .bind(id)
        .bind(InvoiceStatus::Voided)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::invalid_state(format!(
                "invoice {} is already voided",
                invoice.number
            )));
        }

        debug!(id = %id, number = %invoice.number, "Invoice voided");
        invoice.status = InvoiceStatus::Voided;
        invoice.updated_at = now;
        Ok(invoice)
    }
}

async fn insert_lines(
    tx: &mut Transaction<'_, Sqlite>,
    invoice_id: &str,
    lines: &[LineItem],
) -> DbResult<()> {
    for (position, line) in lines.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO invoice_lines (
                invoice_id, position, product_ref, product_name,
                quantity, unit_price, discount_percent
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(invoice_id)
        .bind(position as i64)
        .bind(line.product_ref.as_str())
        .bind(&line.product_name)
        .bind(rows::text(line.quantity))
        .bind(rows::text(line.unit_price.amount()))
        .bind(rows::text(line.discount_percent))
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

fn invoice_from_row(row: &SqliteRow, lines: Vec<LineItem>) -> DbResult<Invoice> {
    Ok(Invoice {
        id: row.try_get("id")?,
        number: row.try_get("number")?,
        date: row.try_get("date")?,
        client_id: row.try_get("client_id")?,
        status: row.try_get("status")?,
        payment_method: row.try_get("payment_method")?,
        observations: row.try_get("observations")?,
        lines,
        totals: rows::totals(row)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
