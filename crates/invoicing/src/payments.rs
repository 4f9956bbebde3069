//! Payment engine: records, edits, and deletes payments against an invoice.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ledgerline_core::{AggregateId, EngineError, EngineResult, Session};

use crate::invoice::{Invoice, InvoiceId};
use crate::payment::{Payment, PaymentDraft, PaymentId, PaymentPatch};

/// Record a payment against an invoice.
///
/// The returned invoice carries the appended payment, a total_paid
/// recomputed fresh from the complete payment set, the re-derived status,
/// and a bumped version. The input invoice is never mutated.
///
/// Overpayment is accepted and simply yields a negative balance due.
pub fn record_payment(
    invoice: &Invoice,
    draft: &PaymentDraft,
    today: NaiveDate,
) -> EngineResult<(Invoice, Payment)> {
    if !invoice.accepts_payments() {
        return Err(EngineError::state(format!(
            "cannot record a payment against void invoice {}",
            invoice.invoice_number(),
        )));
    }
    if draft.amount_paid <= Decimal::ZERO {
        return Err(EngineError::validation("payment amount must be positive"));
    }

    let payment = Payment {
        id: PaymentId::new(AggregateId::new()),
        invoice_ref: invoice.id_typed(),
        amount_paid: draft.amount_paid,
        payment_date: draft.payment_date,
        payment_method: draft.payment_method,
        transaction_id: draft.transaction_id.clone(),
        notes: draft.notes.clone(),
    };

    let mut updated = invoice.clone();
    updated.payments_mut().push(payment.clone());
    updated.reconcile(today);
    updated.bump_version();
    Ok((updated, payment))
}

/// Replace fields of an existing payment, then reconcile from the complete,
/// current payment set (never by adjusting a running delta).
pub fn update_payment(
    invoice: &Invoice,
    payment_id: PaymentId,
    patch: &PaymentPatch,
    today: NaiveDate,
) -> EngineResult<(Invoice, Payment)> {
    if let Some(amount) = patch.amount_paid {
        if amount <= Decimal::ZERO {
            return Err(EngineError::validation("payment amount must be positive"));
        }
    }

    let mut updated = invoice.clone();
    let payment = updated
        .payments_mut()
        .iter_mut()
        .find(|p| p.id == payment_id)
        .ok_or_else(|| EngineError::not_found(format!("payment {payment_id}")))?;
    patch.apply_to(payment);
    let payment = payment.clone();

    updated.reconcile(today);
    updated.bump_version();
    Ok((updated, payment))
}

/// Remove a payment and reconcile from the remaining set.
pub fn delete_payment(
    invoice: &Invoice,
    payment_id: PaymentId,
    today: NaiveDate,
) -> EngineResult<Invoice> {
    let mut updated = invoice.clone();
    let before = updated.payments_mut().len();
    updated.payments_mut().retain(|p| p.id != payment_id);
    if updated.payments_mut().len() == before {
        return Err(EngineError::not_found(format!("payment {payment_id}")));
    }

    updated.reconcile(today);
    updated.bump_version();
    Ok(updated)
}

/// A confirmed payment mutation: the payment as stored plus the canonical
/// updated invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCommit {
    pub payment: Payment,
    pub updated_invoice: Invoice,
}

/// Durable store contract for invoices and their payments.
pub trait InvoiceStore {
    fn fetch(
        &self,
        session: &Session,
        id: InvoiceId,
    ) -> impl Future<Output = EngineResult<Invoice>> + Send;

    fn create_payment(
        &self,
        session: &Session,
        invoice_id: InvoiceId,
        draft: &PaymentDraft,
    ) -> impl Future<Output = EngineResult<PaymentCommit>> + Send;

    fn update_payment(
        &self,
        session: &Session,
        payment_id: PaymentId,
        patch: &PaymentPatch,
    ) -> impl Future<Output = EngineResult<PaymentCommit>> + Send;

    fn delete_payment(
        &self,
        session: &Session,
        payment_id: PaymentId,
    ) -> impl Future<Output = EngineResult<Invoice>> + Send;
}

/// Payment engine: validates locally, commits through the store, and only
/// ever exposes the store-confirmed canonical invoice.
pub struct PaymentEngine<S> {
    store: S,
}

impl<S: InvoiceStore> PaymentEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Fetch the current canonical invoice (required before any retry).
    pub async fn refresh(&self, session: &Session, id: InvoiceId) -> EngineResult<Invoice> {
        self.store.fetch(session, id).await
    }

    pub async fn record(
        &self,
        session: &Session,
        invoice: &Invoice,
        draft: PaymentDraft,
        today: NaiveDate,
    ) -> EngineResult<PaymentCommit> {
        // Preflight: reject bad input locally, before any write.
        let _ = record_payment(invoice, &draft, today)?;

        tracing::info!(
            invoice = %invoice.id_typed(),
            user = %session.user_id,
            amount = %draft.amount_paid,
            "recording payment",
        );
        self.store
            .create_payment(session, invoice.id_typed(), &draft)
            .await
    }

    pub async fn update(
        &self,
        session: &Session,
        invoice: &Invoice,
        payment_id: PaymentId,
        patch: PaymentPatch,
        today: NaiveDate,
    ) -> EngineResult<PaymentCommit> {
        let _ = update_payment(invoice, payment_id, &patch, today)?;

        tracing::info!(
            invoice = %invoice.id_typed(),
            payment = %payment_id,
            user = %session.user_id,
            "updating payment",
        );
        self.store.update_payment(session, payment_id, &patch).await
    }

    pub async fn delete(
        &self,
        session: &Session,
        invoice: &Invoice,
        payment_id: PaymentId,
        today: NaiveDate,
    ) -> EngineResult<Invoice> {
        let _ = delete_payment(invoice, payment_id, today)?;

        tracing::info!(
            invoice = %invoice.id_typed(),
            payment = %payment_id,
            user = %session.user_id,
            "deleting payment",
        );
        self.store.delete_payment(session, payment_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerline_core::UserId;
    use ledgerline_status::InvoiceStatus;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    use crate::invoice::{CustomerRef, InvoiceLineItem};
    use crate::payment::PaymentMethod;

    fn today() -> NaiveDate {
        "2026-02-15".parse().unwrap()
    }

    /// Sent invoice: subtotal 100.00, tax 18% → grand total 118.00.
    fn sent_invoice() -> Invoice {
        let mut invoice = Invoice::draft(
            "INV-2001",
            CustomerRef::new(AggregateId::new()),
            "2026-02-01".parse().unwrap(),
            dec!(18),
        );
        invoice
            .add_item(InvoiceLineItem::new(None, "Consulting", dec!(4), dec!(25.00)))
            .unwrap();
        invoice.mark_sent().unwrap();
        invoice
    }

    fn cash(amount: Decimal) -> PaymentDraft {
        PaymentDraft {
            amount_paid: amount,
            payment_date: today(),
            payment_method: PaymentMethod::Cash,
            transaction_id: None,
            notes: None,
        }
    }

    #[test]
    fn two_payments_settle_the_invoice() {
        let invoice = sent_invoice();
        assert_eq!(invoice.grand_total(), dec!(118.00));

        let (invoice, _) = record_payment(&invoice, &cash(dec!(50.00)), today()).unwrap();
        assert_eq!(invoice.total_paid(), dec!(50.00));
        assert_eq!(invoice.balance_due(), dec!(68.00));
        assert_eq!(invoice.status(), InvoiceStatus::PartiallyPaid);

        let (invoice, _) = record_payment(&invoice, &cash(dec!(68.00)), today()).unwrap();
        assert_eq!(invoice.total_paid(), dec!(118.00));
        assert_eq!(invoice.balance_due(), dec!(0.00));
        assert_eq!(invoice.status(), InvoiceStatus::Paid);
    }

    #[test]
    fn overpayment_is_accepted_with_negative_balance() {
        let invoice = sent_invoice();
        let (invoice, _) = record_payment(&invoice, &cash(dec!(150.00)), today()).unwrap();

        assert_eq!(invoice.status(), InvoiceStatus::Paid);
        assert_eq!(invoice.balance_due(), dec!(-32.00));
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        let invoice = sent_invoice();
        for amount in [dec!(0), dec!(-5.00)] {
            let err = record_payment(&invoice, &cash(amount), today()).unwrap_err();
            assert!(matches!(err, EngineError::Validation(_)));
        }
    }

    #[test]
    fn void_invoice_rejects_payments() {
        let mut invoice = sent_invoice();
        invoice.mark_void().unwrap();

        let err = record_payment(&invoice, &cash(dec!(10.00)), today()).unwrap_err();
        assert!(matches!(err, EngineError::State(_)));
    }

    #[test]
    fn update_reconciles_from_the_complete_set() {
        let invoice = sent_invoice();
        let (invoice, first) = record_payment(&invoice, &cash(dec!(50.00)), today()).unwrap();
        let (invoice, _) = record_payment(&invoice, &cash(dec!(30.00)), today()).unwrap();
        assert_eq!(invoice.total_paid(), dec!(80.00));

        let (invoice, updated) =
            update_payment(&invoice, first.id, &PaymentPatch::amount(dec!(88.00)), today())
                .unwrap();
        assert_eq!(updated.amount_paid, dec!(88.00));
        assert_eq!(invoice.total_paid(), dec!(118.00));
        assert_eq!(invoice.status(), InvoiceStatus::Paid);
    }

    #[test]
    fn update_unknown_payment_is_not_found() {
        let invoice = sent_invoice();
        let err = update_payment(
            &invoice,
            PaymentId::new(AggregateId::new()),
            &PaymentPatch::amount(dec!(1.00)),
            today(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[test]
    fn delete_then_re_add_restores_total_and_status() {
        let invoice = sent_invoice();
        let (invoice, payment) = record_payment(&invoice, &cash(dec!(118.00)), today()).unwrap();
        assert_eq!(invoice.status(), InvoiceStatus::Paid);

        let after_delete = delete_payment(&invoice, payment.id, today()).unwrap();
        assert_eq!(after_delete.total_paid(), dec!(0.00));
        assert_eq!(after_delete.status(), InvoiceStatus::Sent);

        let (restored, _) = record_payment(&after_delete, &cash(dec!(118.00)), today()).unwrap();
        assert_eq!(restored.total_paid(), invoice.total_paid());
        assert_eq!(restored.status(), invoice.status());
    }

    #[test]
    fn deleting_one_of_two_payments_demotes_to_partially_paid() {
        let invoice = sent_invoice();
        let (invoice, first) = record_payment(&invoice, &cash(dec!(50.00)), today()).unwrap();
        let (invoice, _) = record_payment(&invoice, &cash(dec!(68.00)), today()).unwrap();
        assert_eq!(invoice.status(), InvoiceStatus::Paid);

        let after = delete_payment(&invoice, first.id, today()).unwrap();
        assert_eq!(after.total_paid(), dec!(68.00));
        assert_eq!(after.status(), InvoiceStatus::PartiallyPaid);
    }

    #[test]
    fn deleting_the_only_payment_past_due_goes_overdue() {
        let mut invoice = sent_invoice();
        invoice.set_due_date(Some("2026-02-10".parse().unwrap()));
        let (invoice, payment) = record_payment(&invoice, &cash(dec!(118.00)), today()).unwrap();

        let after_delete = delete_payment(&invoice, payment.id, today()).unwrap();
        assert_eq!(after_delete.status(), InvoiceStatus::Overdue);
    }

    /// Store double that applies the pure cores under a mutex.
    struct RecordingStore {
        state: Mutex<Invoice>,
        writes: Mutex<usize>,
    }

    impl RecordingStore {
        fn new(invoice: Invoice) -> Self {
            Self {
                state: Mutex::new(invoice),
                writes: Mutex::new(0),
            }
        }
    }

    impl InvoiceStore for RecordingStore {
        async fn fetch(&self, _session: &Session, _id: InvoiceId) -> EngineResult<Invoice> {
            Ok(self.state.lock().unwrap().clone())
        }

        async fn create_payment(
            &self,
            _session: &Session,
            _invoice_id: InvoiceId,
            draft: &PaymentDraft,
        ) -> EngineResult<PaymentCommit> {
            let mut state = self.state.lock().unwrap();
            let (updated, payment) = record_payment(&state, draft, today())?;
            *state = updated.clone();
            *self.writes.lock().unwrap() += 1;
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
            let mut state = self.state.lock().unwrap();
            let (updated, payment) = update_payment(&state, payment_id, patch, today())?;
            *state = updated.clone();
            *self.writes.lock().unwrap() += 1;
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
            let mut state = self.state.lock().unwrap();
            let updated = delete_payment(&state, payment_id, today())?;
            *state = updated.clone();
            *self.writes.lock().unwrap() += 1;
            Ok(updated)
        }
    }

    #[tokio::test]
    async fn engine_round_trip_record_update_delete() {
        let invoice = sent_invoice();
        let engine = PaymentEngine::new(RecordingStore::new(invoice.clone()));
        let session = Session::new(UserId::new());

        let commit = engine
            .record(&session, &invoice, cash(dec!(50.00)), today())
            .await
            .unwrap();
        assert_eq!(commit.updated_invoice.status(), InvoiceStatus::PartiallyPaid);

        let invoice = commit.updated_invoice;
        let commit = engine
            .update(
                &session,
                &invoice,
                commit.payment.id,
                PaymentPatch::amount(dec!(118.00)),
                today(),
            )
            .await
            .unwrap();
        assert_eq!(commit.updated_invoice.status(), InvoiceStatus::Paid);

        let invoice = commit.updated_invoice;
        let after_delete = engine
            .delete(&session, &invoice, commit.payment.id, today())
            .await
            .unwrap();
        assert_eq!(after_delete.status(), InvoiceStatus::Sent);
        assert_eq!(after_delete.total_paid(), dec!(0.00));
        assert_eq!(*engine.store.writes.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn invalid_draft_never_reaches_the_store() {
        let invoice = sent_invoice();
        let engine = PaymentEngine::new(RecordingStore::new(invoice.clone()));
        let session = Session::new(UserId::new());

        let err = engine
            .record(&session, &invoice, cash(dec!(0)), today())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(*engine.store.writes.lock().unwrap(), 0);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: total_paid always equals the sum of the currently
            /// linked payments, under any add/delete interleaving.
            #[test]
            fn total_paid_matches_linked_payments(ops in proptest::collection::vec((any::<bool>(), 1u32..10_000), 1..25)) {
                let mut invoice = sent_invoice();
                for (add, cents) in ops {
                    if add || invoice.payments().is_empty() {
                        let amount = Decimal::new(cents as i64, 2);
                        let (next, _) = record_payment(&invoice, &cash(amount), today()).unwrap();
                        invoice = next;
                    } else {
                        let id = invoice.payments()[0].id;
                        invoice = delete_payment(&invoice, id, today()).unwrap();
                    }
                    let expected: Decimal =
                        invoice.payments().iter().map(|p| p.amount_paid).sum();
                    prop_assert_eq!(invoice.total_paid(), expected);
                }
            }

            /// Property: paid is reported iff total_paid reaches the grand
            /// total minus the one-cent tolerance.
            #[test]
            fn paid_matches_tolerance_rule(cents in 1u32..30_000) {
                let invoice = sent_invoice();
                let amount = Decimal::new(cents as i64, 2);
                let (updated, _) = record_payment(&invoice, &cash(amount), today()).unwrap();
                let paid = updated.status() == InvoiceStatus::Paid;
                let expected = updated.total_paid() >= updated.grand_total() - Decimal::new(1, 2);
                prop_assert_eq!(paid, expected);
            }
        }
    }
}
