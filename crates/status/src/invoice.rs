//! Invoice settlement status.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ledgerline_core::money::settlement_tolerance;

/// Invoice status lifecycle.
///
/// draft → sent; payments drive partially_paid → paid; overdue is derived
/// from an unpaid balance past the due date; void is an explicit terminal
/// override regardless of payment history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    PartiallyPaid,
    Paid,
    Overdue,
    Void,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::PartiallyPaid => "partially_paid",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Void => "void",
        }
    }
}

/// Derive the canonical status of an invoice from its settlement state.
///
/// void is terminal. An invoice counts as paid once total_paid reaches the
/// grand total minus a one-cent tolerance (wire amounts arrive as floats
/// rendered to two decimals). Overdue applies only to invoices that were
/// actually issued (explicit status != draft) with a due date in the past.
pub fn derive_invoice_status(
    grand_total: Decimal,
    total_paid: Decimal,
    due_date: Option<NaiveDate>,
    explicit: InvoiceStatus,
    today: NaiveDate,
) -> InvoiceStatus {
    if explicit == InvoiceStatus::Void {
        return InvoiceStatus::Void;
    }
    if total_paid >= grand_total - settlement_tolerance() {
        return InvoiceStatus::Paid;
    }
    if total_paid > Decimal::ZERO {
        return InvoiceStatus::PartiallyPaid;
    }
    if let Some(due) = due_date {
        if due < today && explicit != InvoiceStatus::Draft {
            return InvoiceStatus::Overdue;
        }
    }
    explicit
}
