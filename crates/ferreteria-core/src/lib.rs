//! # ferreteria-core: Document Ledger Logic for Ferreteria
//!
//! This crate holds the business logic behind the invoice and purchase-order
//! forms: the line-item ledger, its totals, header validation and the
//! per-form editing session. Pure functions, zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Ferreteria Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web forms (invoice / order modal)            │   │
//! │  │    Pick product ──► Add line ──► Review totals ──► Save         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ LineForm / InvoiceForm / OrderForm     │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ ferreteria-core (THIS CRATE) ★                  │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  ledger   │  │   money   │  │  session  │  │   form    │  │   │
//! │  │   │  Ledger   │  │   Money   │  │ Document  │  │  headers  │  │   │
//! │  │   │  Totals   │  │  TaxRate  │  │  Session  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ DocumentSubmission                     │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 ferreteria-db (Database Layer)                  │   │
//! │  │          SQLite / in-memory document repositories               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`ledger`] - Line items and totals
//! - [`session`] - One form's editing session and its submission
//! - [`form`] - Header forms and their validated headers
//! - [`money`] - Decimal money type
//! - [`types`] - Domain types (LineItem, Invoice, PurchaseOrder, statuses)
//! - [`numbering`] - Next document number
//! - [`validation`] - Field parsing and rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use ferreteria_core::ledger::LineInput;
//! use ferreteria_core::money::Money;
//! use ferreteria_core::session::DocumentSession;
//! use ferreteria_core::types::DocumentKind;
//! use rust_decimal::Decimal;
//!
//! let mut session = DocumentSession::new(DocumentKind::Invoice);
//! session
//!     .add_line(LineInput::new("1", "Martillo", Decimal::new(3, 0), Money::from_cents(1000)))
//!     .unwrap();
//!
//! // 30 + 21% IVA
//! assert_eq!(session.totals().grand_total.to_string(), "$36.30");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod form;
pub mod ledger;
pub mod money;
pub mod numbering;
pub mod session;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, LedgerError, ValidationError};
pub use form::{DocumentForm, DocumentHeader, InvoiceForm, InvoiceHeader, OrderForm, OrderHeader};
pub use ledger::{Ledger, LineForm, LineInput, LineTotals, Totals};
pub use money::Money;
pub use session::{DocumentSession, DocumentSubmission, SubmitRejected};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of a document number (`F000001`, `P000042`).
pub const MAX_NUMBER_LEN: usize = 20;

/// Maximum length of the free-text observations field.
pub const MAX_OBSERVATIONS_LEN: usize = 300;

/// Maximum length of a purchase order's delivery address.
pub const MAX_ADDRESS_LEN: usize = 200;

/// Largest quantity a single line may hold, merges included.
pub const MAX_LINE_QUANTITY: i64 = 1_000_000;

/// Largest unit price accepted for a line.
pub const MAX_UNIT_PRICE: i64 = 1_000_000_000;

/// Maximum number of lines in one document.
///
/// With the two limits above, every line subtotal stays below 1e15 and a
/// full ledger below 1e18, far inside `Decimal`'s range, so totals cannot
/// overflow.
pub const MAX_LEDGER_LINES: usize = 500;
