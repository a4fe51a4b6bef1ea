//! # Repository Module
//!
//! Persistence of submitted invoices and purchase orders.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One trait, two stores                                │
//! │                                                                         │
//! │  DocumentSession::submit(form)                                         │
//! │       │                                                                 │
//! │       │  DocumentSubmission { target, header, lines, totals }          │
//! │       ▼                                                                 │
//! │  dyn DocumentRepository                                                │
//! │  ├── save(submission)          insert or overwrite                     │
//! │  ├── invoice / invoices / void_invoice                                 │
//! │  ├── order / orders / set_order_status                                 │
//! │  └── next_number(kind)                                                 │
//! │       │                                   │                             │
//! │       ▼                                   ▼                             │
//! │  Database (SQLite)                  MemoryRepository                   │
//! │  InvoiceRepository                  RwLock<HashMap<..>>                │
//! │  OrderRepository                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Status rules shared by both stores live at the bottom of this module so
//! the two implementations cannot drift apart.
//!
//! ## Available Repositories
//!
//! - [`InvoiceRepository`](invoice::InvoiceRepository) - SQLite invoices
//! - [`OrderRepository`](order::OrderRepository) - SQLite purchase orders
//! - [`MemoryRepository`](memory::MemoryRepository) - in-process store

pub mod invoice;
pub mod memory;
pub mod order;
mod rows;
mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use ferreteria_core::{
    DocumentKind, DocumentSubmission, Invoice, InvoiceHeader, InvoiceStatus, LineItem, OrderHeader,
    OrderStatus, PurchaseOrder, Totals,
};

use crate::error::{DbError, DbResult};

// =============================================================================
// Trait
// =============================================================================

/// Storage of invoices and purchase orders.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Persists a submission.
    ///
    /// - `target == None`: inserts a new document with a fresh id
    /// - `target == Some(id)`: replaces header, lines and totals of `id`
    ///
    /// Fails with `UniqueViolation` if another document of the same kind
    /// already uses the number, and with `InvalidState` when the stored
    /// document may no longer be edited.
    async fn save(&self, submission: DocumentSubmission) -> DbResult<SavedDocument>;

    async fn invoice(&self, id: &str) -> DbResult<Invoice>;

    /// All invoices, newest date first.
    async fn invoices(&self) -> DbResult<Vec<Invoice>>;

    /// Marks an invoice as voided.
    async fn void_invoice(&self, id: &str) -> DbResult<Invoice>;

    async fn order(&self, id: &str) -> DbResult<PurchaseOrder>;

    /// All purchase orders, newest order date first.
    async fn orders(&self) -> DbResult<Vec<PurchaseOrder>>;

    /// Moves an order to `status`, following the order lifecycle.
    async fn set_order_status(&self, id: &str, status: OrderStatus) -> DbResult<PurchaseOrder>;

    /// The number to pre-fill in a new document form.
    async fn next_number(&self, kind: DocumentKind) -> DbResult<String>;
}

/// A document as stored by [`DocumentRepository::save`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SavedDocument {
    Invoice(Invoice),
    PurchaseOrder(PurchaseOrder),
}

impl SavedDocument {
    pub fn kind(&self) -> DocumentKind {
        match self {
            SavedDocument::Invoice(_) => DocumentKind::Invoice,
            SavedDocument::PurchaseOrder(_) => DocumentKind::PurchaseOrder,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            SavedDocument::Invoice(inv) => &inv.id,
            SavedDocument::PurchaseOrder(order) => &order.id,
        }
    }

    pub fn number(&self) -> &str {
        match self {
            SavedDocument::Invoice(inv) => &inv.number,
            SavedDocument::PurchaseOrder(order) => &order.number,
        }
    }

    pub fn totals(&self) -> &Totals {
        match self {
            SavedDocument::Invoice(inv) => &inv.totals,
            SavedDocument::PurchaseOrder(order) => &order.totals,
        }
    }
}

// =============================================================================
// Shared Rules
// =============================================================================

/// A voided invoice cannot be saved over.
pub(crate) fn ensure_invoice_editable(existing: &Invoice) -> DbResult<()> {
    if existing.status == InvoiceStatus::Voided {
        warn!(id = %existing.id, number = %existing.number, "Rejected edit of voided invoice");
        return Err(DbError::invalid_state(format!(
            "invoice {} is voided and cannot be edited",
            existing.number
        )));
    }
    Ok(())
}

/// Received or cancelled orders cannot be saved over; a status change made
/// from the edit form must follow the lifecycle.
pub(crate) fn ensure_order_editable(existing: &PurchaseOrder, next: OrderStatus) -> DbResult<()> {
    if existing.status.is_final() {
        warn!(id = %existing.id, status = %existing.status, "Rejected edit of closed order");
        return Err(DbError::invalid_state(format!(
            "purchase order {} is {} and cannot be edited",
            existing.number, existing.status
        )));
    }
    if next != existing.status {
        ensure_transition(existing, next)?;
    }
    Ok(())
}

pub(crate) fn ensure_voidable(existing: &Invoice) -> DbResult<()> {
    if existing.status == InvoiceStatus::Voided {
        warn!(id = %existing.id, "Invoice already voided");
        return Err(DbError::invalid_state(format!(
            "invoice {} is already voided",
            existing.number
        )));
    }
    Ok(())
}

pub(crate) fn ensure_transition(existing: &PurchaseOrder, next: OrderStatus) -> DbResult<()> {
    if !existing.status.can_transition_to(next) {
        warn!(
            id = %existing.id,
            from = %existing.status,
            to = %next,
            "Rejected order status transition"
        );
        return Err(DbError::invalid_state(format!(
            "purchase order {} cannot go from {} to {}",
            existing.number, existing.status, next
        )));
    }
    Ok(())
}

pub(crate) fn build_invoice(
    id: String,
    header: InvoiceHeader,
    lines: Vec<LineItem>,
    totals: Totals,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Invoice {
    Invoice {
        id,
        number: header.number,
        date: header.date,
        client_id: header.client_id,
        status: header.status,
        payment_method: header.payment_method,
        observations: header.observations,
        lines,
        totals,
        created_at,
        updated_at,
    }
}

pub(crate) fn build_order(
    id: String,
    header: OrderHeader,
    lines: Vec<LineItem>,
    totals: Totals,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> PurchaseOrder {
    PurchaseOrder {
        id,
        number: header.number,
        order_date: header.order_date,
        expected_delivery: header.expected_delivery,
        supplier_id: header.supplier_id,
        status: header.status,
        delivery_address: header.delivery_address,
        observations: header.observations,
        lines,
        totals,
        created_at,
        updated_at,
    }
}
