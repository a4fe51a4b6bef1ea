//! # Document Session
//!
//! One open invoice or purchase-order form: the ledger being edited plus the
//! identity of the document it will be saved over.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  new(kind) / edit_invoice(&inv) / edit_order(&order)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  add_line / remove_line / totals   (any number of times)                │
//! │       │                                                                 │
//! │       ├── close()  ─────────────────────► dropped, nothing saved        │
//! │       │                                                                 │
//! │       └── submit(form)                                                  │
//! │              ├── Ok(DocumentSubmission) ─► repository.save(...)         │
//! │              └── Err(SubmitRejected) ───► session handed back,          │
//! │                                           form stays open              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A session owns its ledger outright; nothing is shared between forms.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::error::{CoreError, CoreResult, LedgerError};
use crate::form::{DocumentForm, DocumentHeader};
use crate::ledger::{Ledger, LineInput, LineTotals, Totals};
use crate::types::{DocumentKind, Invoice, InvoiceStatus, LineItem, PurchaseOrder};

// =============================================================================
// Session
// =============================================================================

/// The editing state of one document form.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSession {
    kind: DocumentKind,
    /// Id of the persisted document being edited; `None` for a new one.
    target: Option<String>,
    ledger: Ledger,
}

impl DocumentSession {
    /// Opens a form for a new document with an empty ledger.
    pub fn new(kind: DocumentKind) -> Self {
        DocumentSession {
            kind,
            target: None,
            ledger: Ledger::new(),
        }
    }

    /// Opens the edit form of an existing invoice, preloaded with its lines.
    ///
    /// Voided invoices cannot be edited.
    pub fn edit_invoice(invoice: &Invoice) -> CoreResult<Self> {
        if invoice.status == InvoiceStatus::Voided {
            return Err(CoreError::NotEditable {
                kind: DocumentKind::Invoice.to_string(),
                number: invoice.number.clone(),
                status: invoice.status.to_string(),
            });
        }

        Ok(DocumentSession {
            kind: DocumentKind::Invoice,
            target: Some(invoice.id.clone()),
            ledger: Ledger::from_lines(invoice.lines.iter().cloned())?,
        })
    }

    /// Opens the edit form of an existing purchase order.
    ///
    /// Received and cancelled orders cannot be edited.
    pub fn edit_order(order: &PurchaseOrder) -> CoreResult<Self> {
        if order.status.is_final() {
            return Err(CoreError::NotEditable {
                kind: DocumentKind::PurchaseOrder.to_string(),
                number: order.number.clone(),
                status: order.status.to_string(),
            });
        }

        Ok(DocumentSession {
            kind: DocumentKind::PurchaseOrder,
            target: Some(order.id.clone()),
            ledger: Ledger::from_lines(order.lines.iter().cloned())?,
        })
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Id of the document being edited, if any.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Adds a line (or merges into an existing one).
    ///
    /// Purchase-order lines carry no discount, so a non-zero discount is
    /// rejected for them.
    pub fn add_line(&mut self, input: LineInput) -> Result<(), LedgerError> {
        if !self.kind.allows_discount() && !input.discount_percent.is_zero() {
            debug!(kind = %self.kind, product = %input.product_ref, "Rejected discounted line");
            return Err(LedgerError::invalid(
                "discount",
                format!("is not allowed on a {}", self.kind),
            ));
        }

        match self.ledger.add_line(input) {
            Ok(()) => {
                debug!(kind = %self.kind, lines = self.ledger.len(), "Line added");
                Ok(())
            }
            Err(e) => {
                debug!(kind = %self.kind, error = %e, "Line rejected");
                Err(e)
            }
        }
    }

    /// Removes the line at `index`.
    pub fn remove_line(&mut self, index: usize) -> Result<LineItem, LedgerError> {
        let removed = self.ledger.remove_line(index)?;
        debug!(kind = %self.kind, index, product = %removed.product_ref, "Line removed");
        Ok(removed)
    }

    /// Current totals at full precision.
    pub fn totals(&self) -> Totals {
        self.ledger.compute_totals()
    }

    pub fn line_totals(&self) -> Vec<LineTotals> {
        self.ledger.line_totals()
    }

    pub fn lines(&self) -> &[LineItem] {
        self.ledger.lines()
    }

    /// Validates the header and turns the session into a submission.
    ///
    /// ## Checks, in order
    /// 1. the form is for the same document kind as the session
    /// 2. the header parses
    /// 3. purchase orders have at least one line
    ///
    /// On failure the untouched session comes back inside the error.
    pub fn submit(self, form: DocumentForm) -> Result<DocumentSubmission, SubmitRejected> {
        if form.kind() != self.kind {
            let error = CoreError::KindMismatch {
                expected: self.kind.to_string(),
                submitted: form.kind().to_string(),
            };
            return Err(SubmitRejected::new(self, error));
        }

        let header = match form.parse() {
            Ok(header) => header,
            Err(e) => return Err(SubmitRejected::new(self, e.into())),
        };

        if self.kind.requires_lines() && self.ledger.is_empty() {
            let error = CoreError::EmptyDocument(capitalize(self.kind.as_str()));
            return Err(SubmitRejected::new(self, error));
        }

        let totals = self.ledger.compute_totals().rounded();
        debug!(
            kind = %self.kind,
            number = header.number(),
            lines = self.ledger.len(),
            grand_total = %totals.grand_total,
            "Document submitted"
        );

        Ok(DocumentSubmission {
            target: self.target,
            header,
            lines: self.ledger.into_lines(),
            totals,
        })
    }

    /// Discards the session without saving.
    pub fn close(self) {
        debug!(kind = %self.kind, lines = self.ledger.len(), "Session closed");
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// =============================================================================
// Submission
// =============================================================================

/// A validated document, ready to be saved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSubmission {
    /// Id of the document to overwrite; `None` inserts a new one.
    pub target: Option<String>,
    pub header: DocumentHeader,
    pub lines: Vec<LineItem>,
    /// Rounded to 2 decimals.
    pub totals: Totals,
}

impl DocumentSubmission {
    pub fn kind(&self) -> DocumentKind {
        self.header.kind()
    }
}

/// A failed submit. Holds the session so the form can keep editing.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct SubmitRejected {
    pub session: DocumentSession,
    pub error: CoreError,
}

impl SubmitRejected {
    fn new(session: DocumentSession, error: CoreError) -> Self {
        debug!(kind = %session.kind, error = %error, "Submit rejected");
        SubmitRejected { session, error }
    }

    /// Returns the session for further editing.
    pub fn into_session(self) -> DocumentSession {
        self.session
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{InvoiceForm, OrderForm};
    use crate::money::Money;
    use crate::types::{OrderStatus, PaymentMethod, ProductRef};
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;

    fn input(product: &str, qty: i64, price_cents: i64) -> LineInput {
        LineInput::new(product, product, Decimal::new(qty, 0), Money::from_cents(price_cents))
    }

    fn invoice_form() -> DocumentForm {
        DocumentForm::Invoice(InvoiceForm {
            number: "F000001".to_string(),
            date: "2024-05-02".to_string(),
            client_id: "15".to_string(),
            ..InvoiceForm::default()
        })
    }

    fn order_form() -> DocumentForm {
        DocumentForm::PurchaseOrder(OrderForm {
            number: "P000001".to_string(),
            order_date: "2024-05-02".to_string(),
            expected_delivery: "2024-05-10".to_string(),
            supplier_id: "4".to_string(),
            ..OrderForm::default()
        })
    }

    fn stored_line() -> LineItem {
        LineItem {
            product_ref: ProductRef::from(1),
            product_name: "Martillo".to_string(),
            quantity: Decimal::new(3, 0),
            unit_price: Money::from_cents(1000),
            discount_percent: Decimal::ZERO,
        }
    }

    fn invoice(status: InvoiceStatus) -> Invoice {
        Invoice {
            id: "inv-1".to_string(),
            number: "F000009".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            client_id: "15".to_string(),
            status,
            payment_method: PaymentMethod::Cash,
            observations: None,
            lines: vec![stored_line()],
            totals: Totals::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn order(status: OrderStatus) -> PurchaseOrder {
        PurchaseOrder {
            id: "ord-1".to_string(),
            number: "P000003".to_string(),
            order_date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            expected_delivery: NaiveDate::from_ymd_opt(2024, 5, 9).unwrap(),
            supplier_id: "4".to_string(),
            status,
            delivery_address: None,
            observations: None,
            lines: vec![stored_line()],
            totals: Totals::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_new_invoice_submit() {
        let mut session = DocumentSession::new(DocumentKind::Invoice);
        session.add_line(input("1", 2, 10000)).unwrap();
        session
            .add_line(input("2", 1, 5000).with_discount(Decimal::new(10, 0)))
            .unwrap();

        let submission = session.submit(invoice_form()).unwrap();

        assert_eq!(submission.target, None);
        assert_eq!(submission.kind(), DocumentKind::Invoice);
        assert_eq!(submission.lines.len(), 2);
        assert_eq!(submission.totals.grand_total, Money::from_cents(29645));
    }

    #[test]
    fn test_empty_invoice_can_be_submitted() {
        let session = DocumentSession::new(DocumentKind::Invoice);
        let submission = session.submit(invoice_form()).unwrap();
        assert!(submission.lines.is_empty());
        assert!(submission.totals.grand_total.is_zero());
    }

    #[test]
    fn test_empty_order_is_rejected_and_session_returned() {
        let session = DocumentSession::new(DocumentKind::PurchaseOrder);

        let rejected = session.submit(order_form()).unwrap_err();
        assert!(matches!(rejected.error, CoreError::EmptyDocument(_)));
        assert_eq!(
            rejected.to_string(),
            "Purchase order must contain at least one product"
        );

        // the form stays open and can still be completed
        let mut session = rejected.into_session();
        session.add_line(input("1", 1, 100)).unwrap();
        assert!(session.submit(order_form()).is_ok());
    }

    #[test]
    fn test_invalid_header_keeps_lines() {
        let mut session = DocumentSession::new(DocumentKind::Invoice);
        session.add_line(input("1", 1, 100)).unwrap();

        let form = DocumentForm::Invoice(InvoiceForm::default());
        let rejected = session.submit(form).unwrap_err();

        assert!(matches!(rejected.error, CoreError::Validation(_)));
        assert_eq!(rejected.session.lines().len(), 1);
    }

    #[test]
    fn test_kind_mismatch() {
        let mut session = DocumentSession::new(DocumentKind::PurchaseOrder);
        session.add_line(input("1", 1, 100)).unwrap();

        let rejected = session.submit(invoice_form()).unwrap_err();
        assert!(matches!(rejected.error, CoreError::KindMismatch { .. }));
    }

    #[test]
    fn test_order_rejects_discount() {
        let mut session = DocumentSession::new(DocumentKind::PurchaseOrder);
        let err = session
            .add_line(input("1", 1, 100).with_discount(Decimal::new(5, 0)))
            .unwrap_err();

        assert!(matches!(err, LedgerError::InvalidLineInput { .. }));
        assert!(session.lines().is_empty());
    }

    #[test]
    fn test_order_totals_tax_the_subtotal() {
        let mut session = DocumentSession::new(DocumentKind::PurchaseOrder);
        session.add_line(input("1", 3, 1000)).unwrap();

        let totals = session.totals();
        assert_eq!(totals.taxable_base, totals.subtotal);
        assert_eq!(totals.grand_total, Money::from_cents(3630));
    }

    #[test]
    fn test_edit_invoice_preloads_lines() {
        let mut session = DocumentSession::edit_invoice(&invoice(InvoiceStatus::Pending)).unwrap();
        assert_eq!(session.target(), Some("inv-1"));
        assert_eq!(session.lines().len(), 1);

        session.remove_line(0).unwrap();
        session.add_line(input("5", 1, 250)).unwrap();

        let submission = session.submit(invoice_form()).unwrap();
        assert_eq!(submission.target.as_deref(), Some("inv-1"));
        assert_eq!(submission.lines[0].product_ref, ProductRef::from("5"));
    }

    #[test]
    fn test_voided_invoice_is_not_editable() {
        let err = DocumentSession::edit_invoice(&invoice(InvoiceStatus::Voided)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invoice F000009 is voided and cannot be edited"
        );
    }

    #[test]
    fn test_final_orders_are_not_editable() {
        assert!(DocumentSession::edit_order(&order(OrderStatus::Received)).is_err());
        assert!(DocumentSession::edit_order(&order(OrderStatus::Cancelled)).is_err());

        let session = DocumentSession::edit_order(&order(OrderStatus::Shipped)).unwrap();
        assert_eq!(session.kind(), DocumentKind::PurchaseOrder);
        assert_eq!(session.target(), Some("ord-1"));
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut session = DocumentSession::new(DocumentKind::Invoice);
        assert_eq!(
            session.remove_line(0),
            Err(LedgerError::IndexOutOfRange { index: 0, len: 0 })
        );
    }

    #[test]
    fn test_submitted_totals_are_rounded() {
        let mut session = DocumentSession::new(DocumentKind::Invoice);
        session
            .add_line(LineInput::new(
                "cable",
                "Cable",
                Decimal::new(25, 1),
                Money::from_cents(399),
            ))
            .unwrap();

        // 9.975 at full precision
        assert_eq!(session.totals().subtotal.amount(), Decimal::new(9975, 3));

        let submission = session.submit(invoice_form()).unwrap();
        assert_eq!(submission.totals.subtotal, Money::from_cents(998));
    }

    #[test]
    fn test_close_discards() {
        let mut session = DocumentSession::new(DocumentKind::Invoice);
        session.add_line(input("1", 1, 100)).unwrap();
        session.close();
    }
}
