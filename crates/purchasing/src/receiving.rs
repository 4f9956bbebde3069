//! Receiving engine: applies delivery-receipt batches to a purchase order.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ledgerline_core::{EngineError, EngineResult, Session};

use crate::order::{LineItemId, PurchaseOrder, PurchaseOrderId};

/// One entry of a delivery receipt: newly received quantity for a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    #[serde(rename = "itemId")]
    pub line_item_id: LineItemId,
    pub quantity_newly_received: u32,
}

/// A receipt batch as submitted to the store.
///
/// The idempotency key is generated per submission on the client side; a
/// store that sees the same key twice must return the previously committed
/// order instead of applying the quantities again. Receipts are otherwise
/// not idempotent: a resubmission with a fresh key applies the quantities
/// again, so retries must re-fetch the aggregate first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptSubmission {
    pub idempotency_key: Uuid,
    pub lines: Vec<ReceiptLine>,
}

impl ReceiptSubmission {
    pub fn new(lines: Vec<ReceiptLine>) -> Self {
        Self {
            idempotency_key: Uuid::now_v7(),
            lines,
        }
    }
}

/// Apply a delivery-receipt batch to a purchase order.
///
/// All-or-nothing: the whole batch is validated before anything changes, and
/// the input order is never mutated. On success the returned order carries
/// the increased received quantities, the re-derived status, and a bumped
/// version.
pub fn apply_receipt(
    order: &PurchaseOrder,
    lines: &[ReceiptLine],
) -> EngineResult<PurchaseOrder> {
    if !order.is_receivable() {
        return Err(EngineError::state(format!(
            "purchase order {} is not receivable in status {}",
            order.po_number(),
            order.status().as_str(),
        )));
    }
    if lines.is_empty() {
        return Err(EngineError::validation("receipt batch is empty"));
    }

    // Validate the entire batch against running outstanding quantities, so a
    // line referenced twice in one batch cannot sneak past the cap.
    let mut pending: Vec<(LineItemId, u32)> = Vec::with_capacity(lines.len());
    for entry in lines {
        let line = order.line_item(entry.line_item_id).ok_or_else(|| {
            EngineError::validation(format!("unknown line item {}", entry.line_item_id))
        })?;
        if entry.quantity_newly_received == 0 {
            return Err(EngineError::validation(format!(
                "received quantity for {} must be at least 1",
                line.product_name,
            )));
        }
        let already_pending: u32 = pending
            .iter()
            .filter(|(id, _)| *id == entry.line_item_id)
            .map(|(_, q)| *q)
            .sum();
        let outstanding = line.outstanding() - already_pending;
        if entry.quantity_newly_received > outstanding {
            return Err(EngineError::validation(format!(
                "cannot receive {} of {}: only {} outstanding",
                entry.quantity_newly_received, line.product_name, outstanding,
            )));
        }
        pending.push((entry.line_item_id, entry.quantity_newly_received));
    }

    let mut updated = order.clone();
    for (line_item_id, quantity) in pending {
        let line = updated
            .line_item_mut(line_item_id)
            .ok_or_else(|| EngineError::validation(format!("unknown line item {line_item_id}")))?;
        line.quantity_received += quantity;
    }
    updated.set_status(updated.derived_status());
    updated.bump_version();
    Ok(updated)
}

/// Durable store contract for purchase orders.
///
/// The store serializes writes per aggregate; the engine holds no locks and
/// assumes it validates against the current aggregate state.
pub trait PurchaseOrderStore {
    fn fetch(
        &self,
        session: &Session,
        id: PurchaseOrderId,
    ) -> impl Future<Output = EngineResult<PurchaseOrder>> + Send;

    fn submit_receipt(
        &self,
        session: &Session,
        id: PurchaseOrderId,
        submission: &ReceiptSubmission,
    ) -> impl Future<Output = EngineResult<PurchaseOrder>> + Send;
}

/// Receiving engine: validates locally, commits through the store.
///
/// No locally computed state is exposed until the store confirms the write;
/// the store's response is the new canonical aggregate, so a failed or
/// cancelled round trip leaves the caller's view unchanged.
pub struct ReceivingEngine<S> {
    store: S,
}

impl<S: PurchaseOrderStore> ReceivingEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Fetch the current canonical order (required before any retry).
    pub async fn refresh(
        &self,
        session: &Session,
        id: PurchaseOrderId,
    ) -> EngineResult<PurchaseOrder> {
        self.store.fetch(session, id).await
    }

    /// Apply a receipt batch and persist it.
    pub async fn receive(
        &self,
        session: &Session,
        order: &PurchaseOrder,
        lines: Vec<ReceiptLine>,
    ) -> EngineResult<PurchaseOrder> {
        // Preflight: reject invalid batches locally, before any write.
        let _ = apply_receipt(order, &lines)?;

        let submission = ReceiptSubmission::new(lines);
        tracing::info!(
            order = %order.id_typed(),
            user = %session.user_id,
            idempotency_key = %submission.idempotency_key,
            entries = submission.lines.len(),
            "submitting delivery receipt",
        );
        self.store
            .submit_receipt(session, order.id_typed(), &submission)
            .await
    }
}
