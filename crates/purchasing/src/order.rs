use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ledgerline_core::money::line_total;
use ledgerline_core::{AggregateId, AggregateRoot, EngineError, EngineResult, ProductRef};
use ledgerline_status::{LineProgress, PurchaseOrderStatus, derive_purchase_order_status};

/// Purchase order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseOrderId(pub AggregateId);

impl PurchaseOrderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PurchaseOrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Purchase order line item identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineItemId(pub AggregateId);

impl LineItemId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for LineItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Reference to a supplier managed outside this core.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupplierRef(pub AggregateId);

impl SupplierRef {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for SupplierRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Purchase order line item.
///
/// Invariant: `quantity_received` is monotonically non-decreasing over the
/// life of the line and never exceeds `quantity_ordered`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderLineItem {
    pub id: LineItemId,
    pub product_ref: ProductRef,
    pub product_name: String,
    pub quantity_ordered: u32,
    pub quantity_received: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
}

impl PurchaseOrderLineItem {
    pub fn new(
        product_ref: ProductRef,
        product_name: impl Into<String>,
        quantity_ordered: u32,
        unit_price: Decimal,
    ) -> Self {
        Self {
            id: LineItemId::new(AggregateId::new()),
            product_ref,
            product_name: product_name.into(),
            quantity_ordered,
            quantity_received: 0,
            unit_price,
            total_price: line_total(quantity_ordered, unit_price),
        }
    }

    /// quantity_ordered − quantity_received.
    pub fn outstanding(&self) -> u32 {
        self.quantity_ordered - self.quantity_received
    }

    pub fn fully_received(&self) -> bool {
        self.quantity_received == self.quantity_ordered
    }

    pub fn progress(&self) -> LineProgress {
        LineProgress::new(self.quantity_ordered, self.quantity_received)
    }
}

/// Aggregate root: PurchaseOrder.
///
/// Mutated only by the receiving engine (and the lifecycle transitions
/// below); one consistency boundary together with its line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    id: PurchaseOrderId,
    po_number: String,
    supplier_ref: SupplierRef,
    order_date: NaiveDate,
    expected_delivery_date: Option<NaiveDate>,
    status: PurchaseOrderStatus,
    line_items: Vec<PurchaseOrderLineItem>,
    #[serde(with = "rust_decimal::serde::float")]
    sub_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    grand_total: Decimal,
    notes: Option<String>,
    version: u64,
}

impl PurchaseOrder {
    /// Create a freely-editable draft order.
    pub fn draft(
        po_number: impl Into<String>,
        supplier_ref: SupplierRef,
        order_date: NaiveDate,
    ) -> Self {
        Self {
            id: PurchaseOrderId::new(AggregateId::new()),
            po_number: po_number.into(),
            supplier_ref,
            order_date,
            expected_delivery_date: None,
            status: PurchaseOrderStatus::Draft,
            line_items: Vec::new(),
            sub_total: Decimal::ZERO,
            grand_total: Decimal::ZERO,
            notes: None,
            version: 0,
        }
    }

    pub fn id_typed(&self) -> PurchaseOrderId {
        self.id
    }

    pub fn po_number(&self) -> &str {
        &self.po_number
    }

    pub fn supplier_ref(&self) -> SupplierRef {
        self.supplier_ref
    }

    pub fn order_date(&self) -> NaiveDate {
        self.order_date
    }

    pub fn expected_delivery_date(&self) -> Option<NaiveDate> {
        self.expected_delivery_date
    }

    pub fn set_expected_delivery_date(&mut self, date: Option<NaiveDate>) {
        self.expected_delivery_date = date;
    }

    pub fn status(&self) -> PurchaseOrderStatus {
        self.status
    }

    pub fn line_items(&self) -> &[PurchaseOrderLineItem] {
        &self.line_items
    }

    pub fn line_item(&self, id: LineItemId) -> Option<&PurchaseOrderLineItem> {
        self.line_items.iter().find(|l| l.id == id)
    }

    pub fn sub_total(&self) -> Decimal {
        self.sub_total
    }

    pub fn grand_total(&self) -> Decimal {
        self.grand_total
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes;
    }

    /// Receipts may only be applied to placed, not-yet-complete orders.
    pub fn is_receivable(&self) -> bool {
        matches!(
            self.status,
            PurchaseOrderStatus::Ordered | PurchaseOrderStatus::PartiallyReceived
        )
    }

    /// Only drafts and cancelled orders may be removed by administration.
    pub fn deletable(&self) -> bool {
        matches!(
            self.status,
            PurchaseOrderStatus::Draft | PurchaseOrderStatus::Cancelled
        )
    }

    /// Add a line to a draft order. Lines are locked once the order is placed.
    pub fn add_line(&mut self, line: PurchaseOrderLineItem) -> EngineResult<()> {
        if self.status != PurchaseOrderStatus::Draft {
            return Err(EngineError::state(
                "line items are locked once the purchase order is placed",
            ));
        }
        if line.quantity_ordered == 0 {
            return Err(EngineError::validation("quantity ordered must be positive"));
        }
        self.line_items.push(line);
        self.recompute_totals();
        Ok(())
    }

    /// Draft → Ordered: line items lock, the order becomes receivable.
    pub fn place(&mut self) -> EngineResult<()> {
        if self.status != PurchaseOrderStatus::Draft {
            return Err(EngineError::state(
                "only draft purchase orders can be placed",
            ));
        }
        if self.line_items.is_empty() {
            return Err(EngineError::validation(
                "cannot place a purchase order without line items",
            ));
        }
        self.status = PurchaseOrderStatus::Ordered;
        self.version += 1;
        Ok(())
    }

    /// Cancel the order. Not reachable from Received; already-received
    /// quantities are not reversed.
    pub fn cancel(&mut self) -> EngineResult<()> {
        match self.status {
            PurchaseOrderStatus::Received => Err(EngineError::state(
                "a fully received purchase order cannot be cancelled",
            )),
            PurchaseOrderStatus::Cancelled => {
                Err(EngineError::state("purchase order is already cancelled"))
            }
            _ => {
                self.status = PurchaseOrderStatus::Cancelled;
                self.version += 1;
                Ok(())
            }
        }
    }

    /// Re-derive the canonical status from current line progress.
    pub fn derived_status(&self) -> PurchaseOrderStatus {
        derive_purchase_order_status(
            self.line_items.iter().map(PurchaseOrderLineItem::progress),
            self.status,
        )
    }

    pub(crate) fn recompute_totals(&mut self) {
        for line in &mut self.line_items {
            line.total_price = line_total(line.quantity_ordered, line.unit_price);
        }
        self.sub_total = self.line_items.iter().map(|l| l.total_price).sum();
        self.grand_total = self.sub_total;
    }

    pub(crate) fn line_item_mut(&mut self, id: LineItemId) -> Option<&mut PurchaseOrderLineItem> {
        self.line_items.iter_mut().find(|l| l.id == id)
    }

    pub(crate) fn set_status(&mut self, status: PurchaseOrderStatus) {
        self.status = status;
    }

    pub(crate) fn bump_version(&mut self) {
        self.version += 1;
    }
}

impl AggregateRoot for PurchaseOrder {
    type Id = PurchaseOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
