//! # Domain Types
//!
//! Core domain types shared by the ledger, the forms and the database layer.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    LineItem     │   │     Invoice     │   │  PurchaseOrder  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  product_ref    │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  product_name   │   │  number         │   │  number         │       │
//! │  │  quantity       │   │  client_id      │   │  supplier_id    │       │
//! │  │  unit_price     │   │  lines, totals  │   │  lines, totals  │       │
//! │  │  discount_pct   │   │  status         │   │  status         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │  InvoiceStatus  │   │   OrderStatus   │       │
//! │  │  0.21 (IVA)     │   │  Pending        │   │  Pending        │       │
//! │  └─────────────────┘   │  Paid           │   │  Approved       │       │
//! │                        │  Voided         │   │  Shipped        │       │
//! │  ┌─────────────────┐   └─────────────────┘   │  Received       │       │
//! │  │  PaymentMethod  │                         │  Cancelled      │       │
//! │  │  Cash / Card /  │                         └─────────────────┘       │
//! │  │  Transfer/Credit│                                                    │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Status Labels
//! The web UI sends statuses in Spanish (`pendiente`, `pagada`, `anulada`,
//! `efectivo`...). Every enum parses both those labels and the English
//! snake_case names, case-insensitively, and serializes to snake_case.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::ledger::Totals;
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate as a fraction of the taxable base (0.21 = 21 %).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct TaxRate(#[ts(as = "String")] Decimal);

impl TaxRate {
    /// IVA, the only rate applied to invoices and purchase orders.
    pub const IVA: TaxRate = TaxRate(Decimal::from_parts(21, 0, 0, false, 2));

    /// Creates a tax rate from a fraction (0.21 for 21 %).
    #[inline]
    pub const fn from_fraction(fraction: Decimal) -> Self {
        TaxRate(fraction)
    }

    /// Returns the rate as a fraction.
    #[inline]
    pub const fn fraction(&self) -> Decimal {
        self.0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::IVA
    }
}

// =============================================================================
// Product Reference
// =============================================================================

/// Opaque key of a catalog product.
///
/// The catalog API hands out numeric ids while older data uses strings, so
/// both are accepted and normalized to their string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct ProductRef(String);

impl ProductRef {
    /// Returns the reference as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the reference is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for ProductRef {
    fn from(value: &str) -> Self {
        ProductRef(value.trim().to_string())
    }
}

impl From<String> for ProductRef {
    fn from(value: String) -> Self {
        ProductRef::from(value.as_str())
    }
}

impl From<i64> for ProductRef {
    fn from(value: i64) -> Self {
        ProductRef(value.to_string())
    }
}

impl fmt::Display for ProductRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Catalog Product
// =============================================================================

/// A product as returned by the catalog lookup.
///
/// The ledger never fetches these itself; the form passes the selected
/// entry in when the user picks a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CatalogProduct {
    pub id: ProductRef,
    pub name: String,
    /// Sale price, pre-filled as the line's unit price.
    pub price: Money,
}

// =============================================================================
// Line Item
// =============================================================================

/// One product entry of an invoice or purchase order.
///
/// ## Invariants
/// - `quantity > 0`
/// - `unit_price > 0`
/// - `0 <= discount_percent <= 100`
///
/// These hold for every item inside a [`crate::ledger::Ledger`]; the
/// ledger rejects input that would break them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LineItem {
    pub product_ref: ProductRef,
    /// Denormalized product label, frozen when the line was added.
    pub product_name: String,
    #[ts(as = "String")]
    pub quantity: Decimal,
    pub unit_price: Money,
    #[ts(as = "String")]
    pub discount_percent: Decimal,
}

impl LineItem {
    /// quantity × unit price.
    pub fn subtotal(&self) -> Money {
        self.unit_price * self.quantity
    }

    /// subtotal × discount%.
    pub fn discount(&self) -> Money {
        self.subtotal().percentage(self.discount_percent)
    }

    /// subtotal − discount.
    pub fn total(&self) -> Money {
        self.subtotal() - self.discount()
    }
}

// =============================================================================
// Document Kind
// =============================================================================

/// The two documents built with a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Sale to a customer. Lines may carry a discount.
    Invoice,
    /// Purchase from a supplier. Lines never carry a discount.
    PurchaseOrder,
}

impl DocumentKind {
    /// Whether lines of this document may have a non-zero discount.
    pub const fn allows_discount(&self) -> bool {
        matches!(self, DocumentKind::Invoice)
    }

    /// Whether the document can be submitted without lines.
    pub const fn requires_lines(&self) -> bool {
        matches!(self, DocumentKind::PurchaseOrder)
    }

    /// Prefix used for generated document numbers.
    pub const fn number_prefix(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "F",
            DocumentKind::PurchaseOrder => "P",
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "invoice",
            DocumentKind::PurchaseOrder => "purchase order",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Status Enums
// =============================================================================

/// Error returned when a status or method label is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLabel(pub String);

impl fmt::Display for UnknownLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value '{}'", self.0)
    }
}

impl std::error::Error for UnknownLabel {}

/// The status of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Issued, not yet paid.
    #[default]
    Pending,
    Paid,
    /// Cancelled. A voided invoice can no longer be edited.
    Voided,
}

impl InvoiceStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Voided => "voided",
        }
    }
}

impl FromStr for InvoiceStatus {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" | "pendiente" => Ok(InvoiceStatus::Pending),
            "paid" | "pagada" => Ok(InvoiceStatus::Paid),
            "voided" | "anulada" => Ok(InvoiceStatus::Voided),
            _ => Err(UnknownLabel(s.to_string())),
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an invoice is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Transfer,
    /// Store credit, settled later.
    Credit,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Credit => "credit",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" | "efectivo" => Ok(PaymentMethod::Cash),
            "card" | "tarjeta" => Ok(PaymentMethod::Card),
            "transfer" | "transferencia" => Ok(PaymentMethod::Transfer),
            "credit" | "credito" | "crédito" => Ok(PaymentMethod::Credit),
            _ => Err(UnknownLabel(s.to_string())),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The status of a purchase order.
///
/// ## Lifecycle
/// ```text
/// Pending ──► Approved ──► Shipped ──► Received
///    │            │           │
///    └────────────┴───────────┴──────► Cancelled
/// ```
/// `Received` and `Cancelled` are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Approved,
    Shipped,
    Received,
    Cancelled,
}

impl OrderStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Approved => "approved",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Received => "received",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Final statuses accept no edits and no further transitions.
    pub const fn is_final(&self) -> bool {
        matches!(self, OrderStatus::Received | OrderStatus::Cancelled)
    }

    /// Checks whether an order may move from `self` to `next`.
    ///
    /// Only shipped orders can be received; anything not final can be
    /// cancelled or moved along the pending → approved → shipped path.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if self.is_final() || *self == next {
            return false;
        }
        match next {
            OrderStatus::Received => *self == OrderStatus::Shipped,
            OrderStatus::Cancelled => true,
            OrderStatus::Approved => *self == OrderStatus::Pending,
            OrderStatus::Shipped => {
                matches!(self, OrderStatus::Pending | OrderStatus::Approved)
            }
            OrderStatus::Pending => false,
        }
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" | "pendiente" => Ok(OrderStatus::Pending),
            "approved" | "aprobado" => Ok(OrderStatus::Approved),
            "shipped" | "enviado" => Ok(OrderStatus::Shipped),
            "received" | "recibido" | "entregado" => Ok(OrderStatus::Received),
            "cancelled" | "cancelado" => Ok(OrderStatus::Cancelled),
            _ => Err(UnknownLabel(s.to_string())),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// A persisted sales invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    /// Business number, unique (e.g. `F000042`).
    pub number: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub client_id: String,
    pub status: InvoiceStatus,
    pub payment_method: PaymentMethod,
    pub observations: Option<String>,
    pub lines: Vec<LineItem>,
    /// Totals as persisted, rounded to 2 decimals.
    pub totals: Totals,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Purchase Order
// =============================================================================

/// A persisted purchase order to a supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PurchaseOrder {
    pub id: String,
    pub number: String,
    #[ts(as = "String")]
    pub order_date: NaiveDate,
    #[ts(as = "String")]
    pub expected_delivery: NaiveDate,
    pub supplier_id: String,
    pub status: OrderStatus,
    pub delivery_address: Option<String>,
    pub observations: Option<String>,
    pub lines: Vec<LineItem>,
    pub totals: Totals,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
