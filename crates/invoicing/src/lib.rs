//! `ledgerline-invoicing` — invoices, payments, and the payment engine.
//!
//! The aggregate tracks one-or-many payments against an invoice; the engine
//! records, edits, and deletes payments, always recomputing the settled total
//! from the complete payment set and re-deriving the settlement status
//! through `ledgerline-status`.

pub mod invoice;
pub mod payment;
pub mod payments;

pub use invoice::{CustomerRef, Invoice, InvoiceId, InvoiceLineItem};
pub use payment::{Payment, PaymentDraft, PaymentId, PaymentMethod, PaymentPatch};
pub use payments::{
    InvoiceStore, PaymentCommit, PaymentEngine, delete_payment, record_payment, update_payment,
};
