//! `ledgerline-purchasing` — purchase orders and the receiving engine.
//!
//! The aggregate tracks partial deliveries against purchase-order line items;
//! the engine applies whole-batch delivery receipts and re-derives the
//! aggregate status through `ledgerline-status`.

pub mod order;
pub mod receiving;

pub use order::{
    LineItemId, PurchaseOrder, PurchaseOrderId, PurchaseOrderLineItem, SupplierRef,
};
pub use receiving::{
    PurchaseOrderStore, ReceiptLine, ReceiptSubmission, ReceivingEngine, apply_receipt,
};
