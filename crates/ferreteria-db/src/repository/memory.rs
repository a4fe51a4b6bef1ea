//! # In-Memory Repository
//!
//! A [`DocumentRepository`] kept entirely in process memory.
//!
//! Used by tests and demos that don't want a database file. Same rules as
//! the SQLite store: unique numbers per document kind, voided invoices and
//! closed orders are read-only, order status follows the lifecycle.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use ferreteria_core::numbering::next_document_number;
use ferreteria_core::{
    DocumentHeader, DocumentKind, DocumentSubmission, Invoice, InvoiceStatus, OrderStatus,
    PurchaseOrder,
};

use super::{
    build_invoice, build_order, ensure_invoice_editable, ensure_order_editable, ensure_transition,
    ensure_voidable, DocumentRepository, SavedDocument,
};
use crate::error::{DbError, DbResult};

/// Shareable in-memory document store.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    invoices: RwLock<HashMap<String, Invoice>>,
    orders: RwLock<HashMap<String, PurchaseOrder>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentRepository for MemoryRepository {
    async fn save(&self, submission: DocumentSubmission) -> DbResult<SavedDocument> {
        let DocumentSubmission {
            target,
            header,
            lines,
            totals,
        } = submission;
        let now = Utc::now();

        debug!(number = header.number(), target = ?target, "Saving document in memory");

        match header {
            DocumentHeader::Invoice(header) => {
                let mut invoices = self.invoices.write().await;

                let taken = invoices.values().any(|inv| {
                    inv.number == header.number && Some(inv.id.as_str()) != target.as_deref()
                });
                if taken {
                    return Err(DbError::duplicate("number", header.number));
                }

                let invoice = match target {
                    None => build_invoice(Uuid::new_v4().to_string(), header, lines, totals, now, now),
                    Some(id) => {
                        let existing = invoices
                            .get(&id)
                            .ok_or_else(|| DbError::not_found("Invoice", id.as_str()))?;
                        ensure_invoice_editable(existing)?;
                        build_invoice(id, header, lines, totals, existing.created_at, now)
                    }
                };

                invoices.insert(invoice.id.clone(), invoice.clone());
                Ok(SavedDocument::Invoice(invoice))
            }
            DocumentHeader::PurchaseOrder(header) => {
                let mut orders = self.orders.write().await;

                let taken = orders.values().any(|order| {
                    order.number == header.number && Some(order.id.as_str()) != target.as_deref()
                });
                if taken {
                    return Err(DbError::duplicate("number", header.number));
                }

                let order = match target {
                    None => build_order(Uuid::new_v4().to_string(), header, lines, totals, now, now),
                    Some(id) => {
                        let existing = orders
                            .get(&id)
                            .ok_or_else(|| DbError::not_found("Purchase order", id.as_str()))?;
                        ensure_order_editable(existing, header.status)?;
                        build_order(id, header, lines, totals, existing.created_at, now)
                    }
                };

                orders.insert(order.id.clone(), order.clone());
                Ok(SavedDocument::PurchaseOrder(order))
            }
        }
    }

    async fn invoice(&self, id: &str) -> DbResult<Invoice> {
        self.invoices
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| DbError::not_found("Invoice", id))
    }

    async fn invoices(&self) -> DbResult<Vec<Invoice>> {
        let mut invoices: Vec<Invoice> = self.invoices.read().await.values().cloned().collect();
        invoices.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.number.cmp(&a.number)));
        Ok(invoices)
    }

    async fn void_invoice(&self, id: &str) -> DbResult<Invoice> {
        let mut invoices = self.invoices.write().await;
        let invoice = invoices
            .get_mut(id)
            .ok_or_else(|| DbError::not_found("Invoice", id))?;
        ensure_voidable(invoice)?;

        invoice.status = InvoiceStatus::Voided;
        invoice.updated_at = Utc::now();
        debug!(id = %id, number = %invoice.number, "Invoice voided");
        Ok(invoice.clone())
    }

    async fn order(&self, id: &str) -> DbResult<PurchaseOrder> {
        self.orders
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| DbError::not_found("Purchase order", id))
    }

    async fn orders(&self) -> DbResult<Vec<PurchaseOrder>> {
        let mut orders: Vec<PurchaseOrder> = self.orders.read().await.values().cloned().collect();
        orders.sort_by(|a, b| {
            b.order_date
                .cmp(&a.order_date)
                .then_with(|| b.number.cmp(&a.number))
        });
        Ok(orders)
    }

    async fn set_order_status(&self, id: &str, status: OrderStatus) -> DbResult<PurchaseOrder> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(id)
            .ok_or_else(|| DbError::not_found("Purchase order", id))?;
        ensure_transition(order, status)?;

        order.status = status;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn next_number(&self, kind: DocumentKind) -> DbResult<String> {
        let prefix = kind.number_prefix();
        let next = match kind {
            DocumentKind::Invoice => {
                let invoices = self.invoices.read().await;
                next_document_number(prefix, invoices.values().map(|inv| inv.number.as_str()))
            }
            DocumentKind::PurchaseOrder => {
                let orders = self.orders.read().await;
                next_document_number(prefix, orders.values().map(|order| order.number.as_str()))
            }
        };
        Ok(next)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ferreteria_core::{
        DocumentForm, DocumentSession, InvoiceForm, LineInput, Money, OrderForm,
    };
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn invoice_submission(number: &str, date: &str) -> DocumentSubmission {
        let mut session = DocumentSession::new(DocumentKind::Invoice);
        session
            .add_line(LineInput::new("1", "Martillo", Decimal::new(3, 0), Money::from_cents(1000)))
            .unwrap();
        session
            .submit(DocumentForm::Invoice(InvoiceForm {
                number: number.to_string(),
                date: date.to_string(),
                client_id: "7".to_string(),
                ..InvoiceForm::default()
            }))
            .unwrap()
    }

    fn order_submission(number: &str) -> DocumentSubmission {
        let mut session = DocumentSession::new(DocumentKind::PurchaseOrder);
        session
            .add_line(LineInput::new("9", "Arena", Decimal::new(2, 0), Money::from_cents(2500)))
            .unwrap();
        session
            .submit(DocumentForm::PurchaseOrder(OrderForm {
                number: number.to_string(),
                order_date: "2024-05-02".to_string(),
                expected_delivery: "2024-05-06".to_string(),
                supplier_id: "2".to_string(),
                status: "aprobado".to_string(),
                ..OrderForm::default()
            }))
            .unwrap()
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let repo = MemoryRepository::new();
        let saved = repo
            .save(invoice_submission("F000001", "2024-05-02"))
            .await
            .unwrap();

        let invoice = repo.invoice(saved.id()).await.unwrap();
        assert_eq!(invoice.number, "F000001");
        assert_eq!(invoice.totals.grand_total, Money::from_cents(3630));
        assert_eq!(saved.totals(), &invoice.totals);
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let repo = MemoryRepository::new();
        repo.save(invoice_submission("F000001", "2024-05-01"))
            .await
            .unwrap();
        repo.save(invoice_submission("F000002", "2024-06-01"))
            .await
            .unwrap();

        let numbers: Vec<String> = repo
            .invoices()
            .await
            .unwrap()
            .into_iter()
            .map(|inv| inv.number)
            .collect();
        assert_eq!(numbers, vec!["F000002", "F000001"]);
    }

    #[tokio::test]
    async fn test_duplicate_number_per_kind() {
        let repo = MemoryRepository::new();
        repo.save(invoice_submission("F000001", "2024-05-02"))
            .await
            .unwrap();

        let err = repo
            .save(invoice_submission("F000001", "2024-05-03"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        // numbers are unique per kind only
        repo.save(order_submission("F000001")).await.unwrap();
    }

    #[tokio::test]
    async fn test_edit_keeps_id_and_number() {
        let repo = MemoryRepository::new();
        let saved = repo
            .save(invoice_submission("F000001", "2024-05-02"))
            .await
            .unwrap();

        let mut edit = invoice_submission("F000001", "2024-05-09");
        edit.target = Some(saved.id().to_string());
        let edited = repo.save(edit).await.unwrap();

        assert_eq!(edited.id(), saved.id());
        assert_eq!(repo.invoices().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_edit_unknown_target() {
        let repo = MemoryRepository::new();
        let mut edit = invoice_submission("F000001", "2024-05-02");
        edit.target = Some("missing".to_string());
        assert!(matches!(repo.save(edit).await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_void_twice() {
        let repo = MemoryRepository::new();
        let saved = repo
            .save(invoice_submission("F000001", "2024-05-02"))
            .await
            .unwrap();

        repo.void_invoice(saved.id()).await.unwrap();
        assert!(matches!(
            repo.void_invoice(saved.id()).await,
            Err(DbError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_order_transitions() {
        let repo = MemoryRepository::new();
        let saved = repo.save(order_submission("P000001")).await.unwrap();
        assert_eq!(repo.order(saved.id()).await.unwrap().status, OrderStatus::Approved);

        assert!(repo
            .set_order_status(saved.id(), OrderStatus::Received)
            .await
            .is_err());
        repo.set_order_status(saved.id(), OrderStatus::Shipped)
            .await
            .unwrap();
        repo.set_order_status(saved.id(), OrderStatus::Received)
            .await
            .unwrap();

        let mut edit = order_submission("P000001");
        edit.target = Some(saved.id().to_string());
        assert!(matches!(repo.save(edit).await, Err(DbError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_next_number() {
        let repo = MemoryRepository::new();
        repo.save(invoice_submission("F000009", "2024-05-02"))
            .await
            .unwrap();

        assert_eq!(repo.next_number(DocumentKind::Invoice).await.unwrap(), "F000010");
        assert_eq!(
            repo.next_number(DocumentKind::PurchaseOrder).await.unwrap(),
            "P000001"
        );
    }

    #[tokio::test]
    async fn test_shared_between_tasks() {
        let repo: Arc<dyn DocumentRepository> = Arc::new(MemoryRepository::new());

        let mut handles = Vec::new();
        for i in 1..=5 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                repo.save(invoice_submission(&format!("F{:06}", i), "2024-05-02"))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(repo.invoices().await.unwrap().len(), 5);
        assert_eq!(repo.next_number(DocumentKind::Invoice).await.unwrap(), "F000006");
    }
}
