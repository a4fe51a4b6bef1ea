//! [`DocumentRepository`] over the SQLite [`Database`].

use async_trait::async_trait;
use tracing::debug;

use ferreteria_core::numbering::next_document_number;
use ferreteria_core::{
    DocumentHeader, DocumentKind, DocumentSubmission, Invoice, OrderStatus, PurchaseOrder,
};

use super::{DocumentRepository, SavedDocument};
use crate::error::{DbError, DbResult};
use crate::pool::Database;

#[async_trait]
impl DocumentRepository for Database {
    async fn save(&self, submission: DocumentSubmission) -> DbResult<SavedDocument> {
        let DocumentSubmission {
            target,
            header,
            lines,
            totals,
        } = submission;

        debug!(number = header.number(), target = ?target, "Saving document");

        match (header, target) {
            (DocumentHeader::Invoice(header), None) => self
                .invoices()
                .insert(header, lines, totals)
                .await
                .map(SavedDocument::Invoice),
            (DocumentHeader::Invoice(header), Some(id)) => self
                .invoices()
                .update(&id, header, lines, totals)
                .await
                .map(SavedDocument::Invoice),
            (DocumentHeader::PurchaseOrder(header), None) => self
                .orders()
                .insert(header, lines, totals)
                .await
                .map(SavedDocument::PurchaseOrder),
            (DocumentHeader::PurchaseOrder(header), Some(id)) => self
                .orders()
                .update(&id, header, lines, totals)
                .await
                .map(SavedDocument::PurchaseOrder),
        }
    }

    async fn invoice(&self, id: &str) -> DbResult<Invoice> {
        self.invoices()
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", id))
    }

    async fn invoices(&self) -> DbResult<Vec<Invoice>> {
        Database::invoices(self).list().await
    }

    async fn void_invoice(&self, id: &str) -> DbResult<Invoice> {
        Database::invoices(self).void(id).await
    }

    async fn order(&self, id: &str) -> DbResult<PurchaseOrder> {
        self.orders()
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Purchase order", id))
    }

    async fn orders(&self) -> DbResult<Vec<PurchaseOrder>> {
        Database::orders(self).list().await
    }

    async fn set_order_status(&self, id: &str, status: OrderStatus) -> DbResult<PurchaseOrder> {
        Database::orders(self).set_status(id, status).await
    }

    async fn next_number(&self, kind: DocumentKind) -> DbResult<String> {
        let numbers = match kind {
            DocumentKind::Invoice => Database::invoices(self).numbers().await?,
            DocumentKind::PurchaseOrder => Database::orders(self).numbers().await?,
        };
        Ok(next_document_number(kind.number_prefix(), numbers))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;
    use ferreteria_core::{
        DocumentForm, DocumentSession, InvoiceForm, InvoiceStatus, LineInput, Money, OrderForm,
    };
    use rust_decimal::Decimal;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn invoice_form(number: &str) -> DocumentForm {
        DocumentForm::Invoice(InvoiceForm {
            number: number.to_string(),
            date: "2024-05-02".to_string(),
            client_id: "15".to_string(),
            payment_method: "tarjeta".to_string(),
            observations: "Entregar en obra".to_string(),
            ..InvoiceForm::default()
        })
    }

    fn order_form(number: &str, status: &str) -> DocumentForm {
        DocumentForm::PurchaseOrder(OrderForm {
            number: number.to_string(),
            order_date: "2024-05-02".to_string(),
            expected_delivery: "2024-05-10".to_string(),
            supplier_id: "4".to_string(),
            status: status.to_string(),
            ..OrderForm::default()
        })
    }

    fn invoice_submission(number: &str) -> DocumentSubmission {
        let mut session = DocumentSession::new(DocumentKind::Invoice);
        session
            .add_line(LineInput::new("1", "Taladro", Decimal::new(2, 0), Money::from_cents(10000)))
            .unwrap();
        session
            .add_line(
                LineInput::new("2", "Brocas", Decimal::ONE, Money::from_cents(5000))
                    .with_discount(Decimal::new(10, 0)),
            )
            .unwrap();
        session.submit(invoice_form(number)).unwrap()
    }

    fn order_submission(number: &str) -> DocumentSubmission {
        let mut session = DocumentSession::new(DocumentKind::PurchaseOrder);
        session
            .add_line(LineInput::new("9", "Cemento", Decimal::new(3, 0), Money::from_cents(1000)))
            .unwrap();
        session.submit(order_form(number, "")).unwrap()
    }

    #[tokio::test]
    async fn test_invoice_round_trip() {
        let db = db().await;

        let saved = db.save(invoice_submission("F000001")).await.unwrap();
        assert_eq!(saved.kind(), DocumentKind::Invoice);

        let invoice = db.invoice(saved.id()).await.unwrap();
        assert_eq!(invoice.number, "F000001");
        assert_eq!(invoice.payment_method, ferreteria_core::PaymentMethod::Card);
        assert_eq!(invoice.observations.as_deref(), Some("Entregar en obra"));
        assert_eq!(invoice.lines.len(), 2);
        assert_eq!(invoice.lines[0].product_name, "Taladro");
        assert_eq!(invoice.lines[1].discount_percent, Decimal::new(10, 0));
        assert_eq!(invoice.totals.taxable_base, Money::from_cents(24500));
        assert_eq!(invoice.totals.tax, Money::from_cents(5145));
        assert_eq!(invoice.totals.grand_total, Money::from_cents(29645));
    }

    #[tokio::test]
    async fn test_edit_replaces_lines() {
        let db = db().await;
        let saved = db.save(invoice_submission("F000001")).await.unwrap();
        let invoice = db.invoice(saved.id()).await.unwrap();

        let mut session = DocumentSession::edit_invoice(&invoice).unwrap();
        session.remove_line(0).unwrap();
        let submission = session.submit(invoice_form("F000001")).unwrap();
        db.save(submission).await.unwrap();

        let reloaded = db.invoice(saved.id()).await.unwrap();
        assert_eq!(reloaded.lines.len(), 1);
        assert_eq!(reloaded.lines[0].product_name, "Brocas");
        assert_eq!(reloaded.totals.grand_total, Money::from_cents(5445));
        assert_eq!(reloaded.created_at, invoice.created_at);
        assert_eq!(Database::invoices(&db).list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_number_is_rejected() {
        let db = db().await;
        db.save(invoice_submission("F000001")).await.unwrap();

        let err = db.save(invoice_submission("F000001")).await.unwrap_err();
        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "number");
                assert_eq!(value, "F000001");
            }
            other => panic!("expected UniqueViolation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_void_invoice() {
        let db = db().await;
        let saved = db.save(invoice_submission("F000001")).await.unwrap();

        let voided = db.void_invoice(saved.id()).await.unwrap();
        assert_eq!(voided.status, InvoiceStatus::Voided);

        let err = db.void_invoice(saved.id()).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidState(_)));

        // and it can no longer be saved over
        let mut edit = invoice_submission("F000001");
        edit.target = Some(saved.id().to_string());
        assert!(matches!(db.save(edit).await, Err(DbError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_unknown_ids() {
        let db = db().await;
        assert!(matches!(db.invoice("nope").await, Err(DbError::NotFound { .. })));
        assert!(matches!(db.order("nope").await, Err(DbError::NotFound { .. })));
        assert!(matches!(db.void_invoice("nope").await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_order_round_trip_and_lifecycle() {
        let db = db().await;
        let saved = db.save(order_submission("P000001")).await.unwrap();

        let order = db.order(saved.id()).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.lines.len(), 1);
        assert!(order.lines[0].discount_percent.is_zero());
        assert_eq!(order.totals.grand_total, Money::from_cents(3630));

        // only shipped orders can be received
        let err = db
            .set_order_status(saved.id(), OrderStatus::Received)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidState(_)));

        db.set_order_status(saved.id(), OrderStatus::Shipped)
            .await
            .unwrap();
        let received = db
            .set_order_status(saved.id(), OrderStatus::Received)
            .await
            .unwrap();
        assert_eq!(received.status, OrderStatus::Received);

        // final
        assert!(db
            .set_order_status(saved.id(), OrderStatus::Cancelled)
            .await
            .is_err());

        let shipped = Database::orders(&db)
            .list_by_status(OrderStatus::Received)
            .await
            .unwrap();
        assert_eq!(shipped.len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_order_cannot_be_edited() {
        let db = db().await;
        let saved = db.save(order_submission("P000001")).await.unwrap();
        db.set_order_status(saved.id(), OrderStatus::Cancelled)
            .await
            .unwrap();

        let mut edit = order_submission("P000001");
        edit.target = Some(saved.id().to_string());
        assert!(matches!(db.save(edit).await, Err(DbError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_next_number() {
        let db = db().await;
        assert_eq!(
            db.next_number(DocumentKind::PurchaseOrder).await.unwrap(),
            "P000001"
        );

        db.save(order_submission("P000041")).await.unwrap();
        assert_eq!(
            db.next_number(DocumentKind::PurchaseOrder).await.unwrap(),
            "P000042"
        );
        assert_eq!(db.next_number(DocumentKind::Invoice).await.unwrap(), "F000001");
    }

    #[tokio::test]
    async fn test_fractional_quantities_survive_storage() {
        let db = db().await;
        let mut session = DocumentSession::new(DocumentKind::Invoice);
        session
            .add_line(LineInput::new("cable", "Cable 2.5mm", Decimal::new(25, 1), Money::from_cents(399)))
            .unwrap();
        let saved = db.save(session.submit(invoice_form("F000001")).unwrap()).await.unwrap();

        let invoice = db.invoice(saved.id()).await.unwrap();
        assert_eq!(invoice.lines[0].quantity, Decimal::new(25, 1));
        assert_eq!(invoice.totals.subtotal, Money::from_cents(998));
    }
}
