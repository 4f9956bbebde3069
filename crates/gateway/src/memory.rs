//! In-memory gateway.
//!
//! Intended for tests/dev. Writes are serialized per process behind one
//! lock, which trivially satisfies the per-aggregate serialization the
//! contract demands. Receipt idempotency keys are honored: a replayed key
//! returns the previously committed order without re-applying quantities.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::NaiveDate;
use uuid::Uuid;

use ledgerline_core::{EngineError, EngineResult, Session};
use ledgerline_invoicing::{
    self as invoicing, Invoice, InvoiceId, InvoiceStore, PaymentCommit, PaymentDraft, PaymentId,
    PaymentPatch,
};
use ledgerline_purchasing::{
    PurchaseOrder, PurchaseOrderId, PurchaseOrderStore, ReceiptSubmission, apply_receipt,
};

#[derive(Debug, Default)]
struct State {
    orders: HashMap<PurchaseOrderId, PurchaseOrder>,
    invoices: HashMap<InvoiceId, Invoice>,
    payment_index: HashMap<PaymentId, InvoiceId>,
    committed_receipts: HashMap<Uuid, PurchaseOrder>,
}

/// In-memory store implementing both gateway contracts.
#[derive(Debug)]
pub struct InMemoryGateway {
    state: RwLock<State>,
    /// Fixed clock for deterministic status derivation.
    today: NaiveDate,
}

impl InMemoryGateway {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            state: RwLock::new(State::default()),
            today,
        }
    }

    pub fn seed_order(&self, order: PurchaseOrder) {
        let mut state = self.state.write().unwrap();
        state.orders.insert(order.id_typed(), order);
    }

    pub fn seed_invoice(&self, invoice: Invoice) {
        let mut state = self.state.write().unwrap();
        for payment in invoice.payments() {
            state.payment_index.insert(payment.id, invoice.id_typed());
        }
        state.invoices.insert(invoice.id_typed(), invoice);
    }

    fn invoice_for_payment(state: &State, payment_id: PaymentId) -> EngineResult<InvoiceId> {
        state
            .payment_index
            .get(&payment_id)
            .copied()
            .ok_or_else(|| EngineError::not_found(format!("payment {payment_id}")))
    }
}

impl PurchaseOrderStore for InMemoryGateway {
    async fn fetch(
        &self,
        _session: &Session,
        id: PurchaseOrderId,
    ) -> EngineResult<PurchaseOrder> {
        let state = self.state.read().unwrap();
        state
            .orders
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::not_found(format!("purchase order {id}")))
    }

    async fn submit_receipt(
        &self,
        _session: &Session,
        id: PurchaseOrderId,
        submission: &ReceiptSubmission,
    ) -> EngineResult<PurchaseOrder> {
        let mut state = self.state.write().unwrap();

        if let Some(previous) = state.committed_receipts.get(&submission.idempotency_key) {
            tracing::debug!(key = %submission.idempotency_key, "replayed receipt key");
            return Ok(previous.clone());
        }

        let order = state
            .orders
            .get(&id)
            .ok_or_else(|| EngineError::not_found(format!("purchase order {id}")))?;
        let updated = apply_receipt(order, &submission.lines)?;

        state.orders.insert(id, updated.clone());
        state
            .committed_receipts
            .insert(submission.idempotency_key, updated.clone());
        Ok(updated)
    }
}

impl InvoiceStore for InMemoryGateway {
    async fn fetch(&self, _session: &Session, id: InvoiceId) -> EngineResult<Invoice> {
        let state = self.state.read().unwrap();
        state
            .invoices
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::not_found(format!("invoice {id}")))
    }

    async fn create_payment(
        &self,
        _session: &Session,
        invoice_id: InvoiceId,
        draft: &PaymentDraft,
    ) -> EngineResult<PaymentCommit> {
        let mut state = self.state.write().unwrap();
        let invoice = state
            .invoices
            .get(&invoice_id)
            .ok_or_else(|| EngineError::not_found(format!("invoice {invoice_id}")))?;

        let (updated, payment) = invoicing::record_payment(invoice, draft, self.today)?;
        state.payment_index.insert(payment.id, invoice_id);
        state.invoices.insert(invoice_id, updated.clone());
        Ok(PaymentCommit {
            payment,
            updated_invoice: updated,
        })
    }

    async fn update_payment(
        &self,
        _session: &Session,
        payment_id: PaymentId,
        patch: &PaymentPatch,
    ) -> EngineResult<PaymentCommit> {
        let mut state = self.state.write().unwrap();
        let invoice_id = Self::invoice_for_payment(&state, payment_id)?;
        let invoice = state
            .invoices
            .get(&invoice_id)
            .ok_or_else(|| EngineError::not_found(format!("invoice {invoice_id}")))?;

        let (updated, payment) = invoicing::update_payment(invoice, payment_id, patch, self.today)?;
        state.invoices.insert(invoice_id, updated.clone());
        Ok(PaymentCommit {
            payment,
            updated_invoice: updated,
        })
    }

    async fn delete_payment(
        &self,
        _session: &Session,
        payment_id: PaymentId,
    ) -> EngineResult<Invoice> {
        let mut state = self.state.write().unwrap();
        let invoice_id = Self::invoice_for_payment(&state, payment_id)?;
        let invoice = state
            .invoices
            .get(&invoice_id)
            .ok_or_else(|| EngineError::not_found(format!("invoice {invoice_id}")))?;

        let updated = invoicing::delete_payment(invoice, payment_id, self.today)?;
        state.payment_index.remove(&payment_id);
        state.invoices.insert(invoice_id, updated.clone());
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerline_core::{AggregateId, ProductRef, UserId};
    use ledgerline_purchasing::{PurchaseOrderLineItem, ReceiptLine, SupplierRef};
    use ledgerline_status::PurchaseOrderStatus;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        "2026-03-15".parse().unwrap()
    }

    fn seeded_order(gateway: &InMemoryGateway) -> PurchaseOrder {
        let mut order = PurchaseOrder::draft(
            "PO-3001",
            SupplierRef::new(AggregateId::new()),
            "2026-03-01".parse().unwrap(),
        );
        order
            .add_line(PurchaseOrderLineItem::new(ProductRef::new(), "Widget", 10, dec!(1.00)))
            .unwrap();
        order.place().unwrap();
        gateway.seed_order(order.clone());
        order
    }

    #[tokio::test]
    async fn replayed_idempotency_key_does_not_double_apply() {
        let gateway = InMemoryGateway::new(today());
        let order = seeded_order(&gateway);
        let session = Session::new(UserId::new());
        let line = order.line_items()[0].id;

        let submission = ReceiptSubmission::new(vec![ReceiptLine {
            line_item_id: line,
            quantity_newly_received: 4,
        }]);

        let first = gateway
            .submit_receipt(&session, order.id_typed(), &submission)
            .await
            .unwrap();
        let replay = gateway
            .submit_receipt(&session, order.id_typed(), &submission)
            .await
            .unwrap();

        assert_eq!(first, replay);
        let current = PurchaseOrderStore::fetch(&gateway, &session, order.id_typed())
            .await
            .unwrap();
        assert_eq!(current.line_items()[0].quantity_received, 4);
        assert_eq!(current.status(), PurchaseOrderStatus::PartiallyReceived);
    }

    #[tokio::test]
    async fn fresh_key_applies_again() {
        let gateway = InMemoryGateway::new(today());
        let order = seeded_order(&gateway);
        let session = Session::new(UserId::new());
        let line = order.line_items()[0].id;

        for _ in 0..2 {
            let submission = ReceiptSubmission::new(vec![ReceiptLine {
                line_item_id: line,
                quantity_newly_received: 5,
            }]);
            gateway
                .submit_receipt(&session, order.id_typed(), &submission)
                .await
                .unwrap();
        }

        let current = PurchaseOrderStore::fetch(&gateway, &session, order.id_typed())
            .await
            .unwrap();
        assert_eq!(current.line_items()[0].quantity_received, 10);
        assert_eq!(current.status(), PurchaseOrderStatus::Received);
    }

    #[tokio::test]
    async fn unknown_aggregates_are_not_found() {
        let gateway = InMemoryGateway::new(today());
        let session = Session::new(UserId::new());

        let err = PurchaseOrderStore::fetch(
            &gateway,
            &session,
            PurchaseOrderId::new(AggregateId::new()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));

        let err = InvoiceStore::fetch(&gateway, &session, InvoiceId::new(AggregateId::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }
}
