//! Row mapping helpers shared by the SQLite repositories.
//!
//! Decimals live in TEXT columns; reading one back goes through
//! `Decimal::from_str` so a corrupted value surfaces as `InvalidData`.

use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;

use ferreteria_core::{LineItem, Money, ProductRef, Totals};

use crate::error::{DbError, DbResult};

pub(crate) fn decimal(row: &SqliteRow, column: &str) -> DbResult<Decimal> {
    let raw: String = row.try_get(column)?;
    Decimal::from_str(&raw)
        .map_err(|e| DbError::invalid_data(format!("{} = '{}': {}", column, raw, e)))
}

pub(crate) fn money(row: &SqliteRow, column: &str) -> DbResult<Money> {
    decimal(row, column).map(Money::new)
}

pub(crate) fn totals(row: &SqliteRow) -> DbResult<Totals> {
    Ok(Totals {
        subtotal: money(row, "subtotal")?,
        total_discount: money(row, "total_discount")?,
        taxable_base: money(row, "taxable_base")?,
        tax: money(row, "tax")?,
        grand_total: money(row, "grand_total")?,
    })
}

/// Maps a line row. Order lines have no discount column.
pub(crate) fn line_item(row: &SqliteRow, has_discount: bool) -> DbResult<LineItem> {
    let product_ref: String = row.try_get("product_ref")?;
    Ok(LineItem {
        product_ref: ProductRef::from(product_ref),
        product_name: row.try_get("product_name")?,
        quantity: decimal(row, "quantity")?,
        unit_price: money(row, "unit_price")?,
        discount_percent: if has_discount {
            decimal(row, "discount_percent")?
        } else {
            Decimal::ZERO
        },
    })
}

/// TEXT representation of a decimal value.
pub(crate) fn text(value: Decimal) -> String {
    value.to_string()
}

/// Replaces the generic sqlx unique error with one naming the number.
pub(crate) fn number_conflict(err: DbError, number: &str) -> DbError {
    match err {
        DbError::UniqueViolation { .. } => DbError::duplicate("number", number),
        other => other,
    }
}
