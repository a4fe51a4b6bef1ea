//! # Document Header Forms
//!
//! Typed form data for the invoice and purchase-order modals.
//!
//! The web form posts every field as a string. Each `*Form` struct mirrors
//! those fields one to one, and `parse()` is the single explicit mapping
//! step into a validated `*Header`.
//!
//! ```text
//! ┌──────────────┐   parse()   ┌────────────────┐   DocumentSession::submit
//! │ InvoiceForm  │ ──────────► │ InvoiceHeader  │ ─────────────────────────►
//! │ (raw strings)│             │ (typed, valid) │
//! └──────────────┘             └────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{DocumentKind, InvoiceStatus, OrderStatus, PaymentMethod};
use crate::validation::{
    optional_text, parse_date, parse_label, required_text, validate_after, ValidationResult,
};
use crate::{MAX_ADDRESS_LEN, MAX_NUMBER_LEN, MAX_OBSERVATIONS_LEN};

// =============================================================================
// Invoice
// =============================================================================

/// Raw invoice header fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct InvoiceForm {
    pub number: String,
    pub date: String,
    pub client_id: String,
    pub status: String,
    pub payment_method: String,
    pub observations: String,
}

/// Validated invoice header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceHeader {
    pub number: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub client_id: String,
    pub status: InvoiceStatus,
    pub payment_method: PaymentMethod,
    pub observations: Option<String>,
}

impl InvoiceForm {
    /// Maps and validates the raw fields.
    ///
    /// ## Rules
    /// - number, date and client are required
    /// - number ≤ 20 characters, observations ≤ 300 characters
    /// - blank status / payment method → Pending / Cash
    pub fn parse(&self) -> ValidationResult<InvoiceHeader> {
        Ok(InvoiceHeader {
            number: required_text("number", &self.number, MAX_NUMBER_LEN)?,
            date: parse_date("date", &self.date)?,
            client_id: required_text("client", &self.client_id, MAX_NUMBER_LEN)?,
            status: parse_label("status", &self.status)?,
            payment_method: parse_label("payment method", &self.payment_method)?,
            observations: optional_text("observations", &self.observations, MAX_OBSERVATIONS_LEN)?,
        })
    }
}

// =============================================================================
// Purchase Order
// =============================================================================

/// Raw purchase-order header fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct OrderForm {
    pub number: String,
    pub order_date: String,
    pub expected_delivery: String,
    pub supplier_id: String,
    pub status: String,
    pub delivery_address: String,
    pub observations: String,
}

/// Validated purchase-order header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderHeader {
    pub number: String,
    #[ts(as = "String")]
    pub order_date: NaiveDate,
    #[ts(as = "String")]
    pub expected_delivery: NaiveDate,
    pub supplier_id: String,
    pub status: OrderStatus,
    pub delivery_address: Option<String>,
    pub observations: Option<String>,
}

impl OrderForm {
    /// Maps and validates the raw fields.
    ///
    /// ## Rules
    /// - number, both dates and supplier are required
    /// - expected delivery strictly after the order date
    /// - delivery address ≤ 200, observations ≤ 300 characters
    pub fn parse(&self) -> ValidationResult<OrderHeader> {
        let number = required_text("number", &self.number, MAX_NUMBER_LEN)?;
        let order_date = parse_date("order date", &self.order_date)?;
        let expected_delivery = parse_date("expected delivery", &self.expected_delivery)?;
        let supplier_id = required_text("supplier", &self.supplier_id, MAX_NUMBER_LEN)?;

        validate_after("expected delivery", expected_delivery, "order date", order_date)?;

        Ok(OrderHeader {
            number,
            order_date,
            expected_delivery,
            supplier_id,
            status: parse_label("status", &self.status)?,
            delivery_address: optional_text(
                "delivery address",
                &self.delivery_address,
                MAX_ADDRESS_LEN,
            )?,
            observations: optional_text("observations", &self.observations, MAX_OBSERVATIONS_LEN)?,
        })
    }
}

// =============================================================================
// Either Kind
// =============================================================================

/// A header form of either document kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentForm {
    Invoice(InvoiceForm),
    PurchaseOrder(OrderForm),
}

impl DocumentForm {
    pub fn kind(&self) -> DocumentKind {
        match self {
            DocumentForm::Invoice(_) => DocumentKind::Invoice,
            DocumentForm::PurchaseOrder(_) => DocumentKind::PurchaseOrder,
        }
    }

    pub fn parse(&self) -> ValidationResult<DocumentHeader> {
        match self {
            DocumentForm::Invoice(form) => form.parse().map(DocumentHeader::Invoice),
            DocumentForm::PurchaseOrder(form) => form.parse().map(DocumentHeader::PurchaseOrder),
        }
    }
}

/// A validated header of either document kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentHeader {
    Invoice(InvoiceHeader),
    PurchaseOrder(OrderHeader),
}

impl DocumentHeader {
    pub fn kind(&self) -> DocumentKind {
        match self {
            DocumentHeader::Invoice(_) => DocumentKind::Invoice,
            DocumentHeader::PurchaseOrder(_) => DocumentKind::PurchaseOrder,
        }
    }

    /// The business number of the document.
    pub fn number(&self) -> &str {
        match self {
            DocumentHeader::Invoice(h) => &h.number,
            DocumentHeader::PurchaseOrder(h) => &h.number,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
