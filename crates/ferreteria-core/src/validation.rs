//! # Validation Module
//!
//! Input parsing and validation for line items and document headers.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Web form (JavaScript)                                        │
//! │  └── Immediate feedback, but values arrive as raw strings              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Line fields  → LedgerError::InvalidLineInput                      │
//! │  └── Header fields → ValidationError                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  └── UNIQUE document numbers                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use ferreteria_core::validation::{parse_decimal, validate_quantity};
//!
//! let qty = parse_decimal("quantity", "2.5").unwrap();
//! assert!(validate_quantity(qty).is_ok());
//! assert!(parse_decimal("quantity", "abc").is_err());
//! ```

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{LedgerError, ValidationError};
use crate::money::Money;
use crate::types::ProductRef;
use crate::{MAX_LEDGER_LINES, MAX_LINE_QUANTITY, MAX_UNIT_PRICE};

/// Result type for header validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Date format used by HTML date inputs.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// Line Validators
// =============================================================================

/// Parses a raw numeric form field into a finite decimal.
///
/// ## Rules
/// - Blank → rejected as missing
/// - Plain (`12.50`) and scientific (`1.25e1`) notation accepted
/// - `NaN`, `inf` and anything else non-numeric → rejected
pub fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, LedgerError> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Err(LedgerError::invalid(field, "is required"));
    }

    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| LedgerError::invalid(field, "must be a number"))
}

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0). Fractions are fine (2.5 m of cable).
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Invoice form: Add product                                             │
/// │                                                                         │
/// │  User enters quantity: 0                                               │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(0) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       └── qty <= 0? → "quantity must be greater than 0"                │
/// │                       ledger untouched, form keeps its lines           │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(quantity: Decimal) -> Result<(), LedgerError> {
    if quantity <= Decimal::ZERO {
        return Err(LedgerError::invalid("quantity", "must be greater than 0"));
    }
    if quantity > Decimal::from(MAX_LINE_QUANTITY) {
        return Err(LedgerError::invalid(
            "quantity",
            format!("is too large (max {})", MAX_LINE_QUANTITY),
        ));
    }
    Ok(())
}

/// Validates a unit price.
///
/// A zero price is rejected along with negative ones: the form treats an
/// empty or zero price field as an incomplete line.
pub fn validate_unit_price(price: Money) -> Result<(), LedgerError> {
    if price.is_zero() || price.is_negative() {
        return Err(LedgerError::invalid("unit price", "must be greater than 0"));
    }
    if price.amount() > Decimal::from(MAX_UNIT_PRICE) {
        return Err(LedgerError::invalid(
            "unit price",
            format!("is too large (max {})", MAX_UNIT_PRICE),
        ));
    }
    Ok(())
}

/// Validates that a new product still fits in the document.
pub fn validate_line_count(current_lines: usize) -> Result<(), LedgerError> {
    if current_lines >= MAX_LEDGER_LINES {
        return Err(LedgerError::invalid(
            "product",
            format!("cannot be added: document already has {} lines", MAX_LEDGER_LINES),
        ));
    }
    Ok(())
}

/// Validates a discount percentage (0–100 inclusive).
pub fn validate_discount_percent(percent: Decimal) -> Result<(), LedgerError> {
    if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
        return Err(LedgerError::invalid("discount", "must be between 0 and 100"));
    }
    Ok(())
}

/// Validates that a product was selected.
pub fn validate_product_ref(product_ref: &ProductRef) -> Result<(), LedgerError> {
    if product_ref.is_blank() {
        return Err(LedgerError::invalid("product", "is required"));
    }
    Ok(())
}

// =============================================================================
// Header Validators
// =============================================================================

/// Validates a required text field and returns it trimmed.
///
/// ## Example
/// ```rust
/// use ferreteria_core::validation::required_text;
///
/// assert_eq!(required_text("number", " F000001 ", 20).unwrap(), "F000001");
/// assert!(required_text("number", "   ", 20).is_err());
/// ```
pub fn required_text(field: &str, raw: &str, max: usize) -> ValidationResult<String> {
    let value = raw.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    check_length(field, value, max)?;
    Ok(value.to_string())
}

/// Validates an optional text field; blank becomes `None`.
pub fn optional_text(field: &str, raw: &str, max: usize) -> ValidationResult<Option<String>> {
    let value = raw.trim();

    if value.is_empty() {
        return Ok(None);
    }

    check_length(field, value, max)?;
    Ok(Some(value.to_string()))
}

fn check_length(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    // chars, not bytes: "Dirección" is 9 characters
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// Parses a required `YYYY-MM-DD` date.
pub fn parse_date(field: &str, raw: &str) -> ValidationResult<NaiveDate> {
    let value = raw.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "expected a date as YYYY-MM-DD".to_string(),
    })
}

/// Parses a status or payment-method label; blank yields the default.
pub fn parse_label<T>(field: &str, raw: &str) -> ValidationResult<T>
where
    T: FromStr + Default,
    T::Err: std::fmt::Display,
{
    let value = raw.trim();

    if value.is_empty() {
        return Ok(T::default());
    }

    value.parse().map_err(|e: T::Err| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

/// Validates that `later` falls strictly after `earlier`.
pub fn validate_after(
    field: &str,
    later: NaiveDate,
    other: &str,
    earlier: NaiveDate,
) -> ValidationResult<()> {
    if later <= earlier {
        return Err(ValidationError::NotAfter {
            field: field.to_string(),
            other: other.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
