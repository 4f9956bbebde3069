//! `ledgerline-status` — canonical status derivation.
//!
//! Pure, side-effect-free functions: the single source of truth for both the
//! purchase-order fulfillment status and the invoice settlement status.
//! Every consumer (engines, stores, read paths) must derive status through
//! this crate so displayed status never diverges from reconciled state.

pub mod invoice;
pub mod purchase_order;

pub use invoice::{InvoiceStatus, derive_invoice_status};
pub use purchase_order::{LineProgress, PurchaseOrderStatus, derive_purchase_order_status};
