//! Purchase-order fulfillment status.

use serde::{Deserialize, Serialize};

/// Purchase order status lifecycle.
///
/// Draft orders are freely editable; placing the order locks its lines and
/// makes it receivable. Receipts drive PartiallyReceived/Received. Cancelled
/// is terminal and reachable from every status except Received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseOrderStatus {
    Draft,
    Ordered,
    PartiallyReceived,
    Received,
    Cancelled,
}

impl PurchaseOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseOrderStatus::Draft => "Draft",
            PurchaseOrderStatus::Ordered => "Ordered",
            PurchaseOrderStatus::PartiallyReceived => "PartiallyReceived",
            PurchaseOrderStatus::Received => "Received",
            PurchaseOrderStatus::Cancelled => "Cancelled",
        }
    }
}

/// Per-line fulfillment progress, decoupled from the purchasing aggregate so
/// this crate stays dependency-free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineProgress {
    pub ordered: u32,
    pub received: u32,
}

impl LineProgress {
    pub fn new(ordered: u32, received: u32) -> Self {
        Self { ordered, received }
    }

    pub fn fully_received(&self) -> bool {
        self.received == self.ordered
    }
}

/// Derive the canonical status of a purchase order from its line progress.
///
/// Cancelled is terminal and overrides quantities. Otherwise: every line
/// fully received means Received; any received quantity means
/// PartiallyReceived; an untouched order keeps its explicit status
/// (Draft or Ordered).
pub fn derive_purchase_order_status(
    lines: impl IntoIterator<Item = LineProgress>,
    explicit: PurchaseOrderStatus,
) -> PurchaseOrderStatus {
    if explicit == PurchaseOrderStatus::Cancelled {
        return PurchaseOrderStatus::Cancelled;
    }

    let mut any_lines = false;
    let mut all_full = true;
    let mut any_received = false;
    for line in lines {
        any_lines = true;
        all_full &= line.fully_received();
        any_received |= line.received > 0;
    }

    // An order with no lines has nothing to receive; keep the explicit status.
    if any_lines && all_full {
        PurchaseOrderStatus::Received
    } else if any_received {
        PurchaseOrderStatus::PartiallyReceived
    } else {
        explicit
    }
}
