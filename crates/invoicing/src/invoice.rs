use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ledgerline_core::money::{decimal_line_total, tax_amount};
use ledgerline_core::{AggregateId, AggregateRoot, EngineError, EngineResult, ProductRef};
use ledgerline_status::{InvoiceStatus, derive_invoice_status};

use crate::payment::Payment;

/// Invoice identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub AggregateId);

impl InvoiceId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Reference to a customer managed outside this core.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerRef(pub AggregateId);

impl CustomerRef {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for CustomerRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Invoice line item. Quantities may be fractional (hours, weights).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLineItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_ref: Option<ProductRef>,
    pub product_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
}

impl InvoiceLineItem {
    pub fn new(
        product_ref: Option<ProductRef>,
        product_name: impl Into<String>,
        quantity: Decimal,
        unit_price: Decimal,
    ) -> Self {
        Self {
            product_ref,
            product_name: product_name.into(),
            description: None,
            quantity,
            unit_price,
            total_price: decimal_line_total(quantity, unit_price),
        }
    }
}

/// Aggregate root: Invoice, together with its currently linked payments.
///
/// `total_paid` is always recomputed fresh from the full payment set, never
/// accumulated incrementally, so repeated edits cannot introduce drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    id: InvoiceId,
    invoice_number: String,
    customer_ref: CustomerRef,
    invoice_date: NaiveDate,
    due_date: Option<NaiveDate>,
    items: Vec<InvoiceLineItem>,
    #[serde(with = "rust_decimal::serde::float")]
    tax_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    sub_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    tax_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    grand_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    total_paid: Decimal,
    status: InvoiceStatus,
    payments: Vec<Payment>,
    version: u64,
}

impl Invoice {
    /// Create a draft invoice.
    pub fn draft(
        invoice_number: impl Into<String>,
        customer_ref: CustomerRef,
        invoice_date: NaiveDate,
        tax_rate: Decimal,
    ) -> Self {
        Self {
            id: InvoiceId::new(AggregateId::new()),
            invoice_number: invoice_number.into(),
            customer_ref,
            invoice_date,
            due_date: None,
            items: Vec::new(),
            tax_rate,
            sub_total: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            grand_total: Decimal::ZERO,
            total_paid: Decimal::ZERO,
            status: InvoiceStatus::Draft,
            payments: Vec::new(),
            version: 0,
        }
    }

    pub fn id_typed(&self) -> InvoiceId {
        self.id
    }

    pub fn invoice_number(&self) -> &str {
        &self.invoice_number
    }

    pub fn customer_ref(&self) -> CustomerRef {
        self.customer_ref
    }

    pub fn invoice_date(&self) -> NaiveDate {
        self.invoice_date
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    pub fn set_due_date(&mut self, due_date: Option<NaiveDate>) {
        self.due_date = due_date;
    }

    pub fn items(&self) -> &[InvoiceLineItem] {
        &self.items
    }

    pub fn tax_rate(&self) -> Decimal {
        self.tax_rate
    }

    pub fn sub_total(&self) -> Decimal {
        self.sub_total
    }

    pub fn tax_amount(&self) -> Decimal {
        self.tax_amount
    }

    pub fn grand_total(&self) -> Decimal {
        self.grand_total
    }

    pub fn total_paid(&self) -> Decimal {
        self.total_paid
    }

    /// grand_total − total_paid. Negative when overpaid.
    pub fn balance_due(&self) -> Decimal {
        self.grand_total - self.total_paid
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    pub fn payment(&self, id: crate::payment::PaymentId) -> Option<&Payment> {
        self.payments.iter().find(|p| p.id == id)
    }

    /// Payments may be recorded against anything but a void invoice.
    pub fn accepts_payments(&self) -> bool {
        self.status != InvoiceStatus::Void
    }

    /// Add a line item to a draft invoice.
    pub fn add_item(&mut self, item: InvoiceLineItem) -> EngineResult<()> {
        if self.status != InvoiceStatus::Draft {
            return Err(EngineError::state(
                "line items are locked once the invoice is issued",
            ));
        }
        if item.quantity <= Decimal::ZERO {
            return Err(EngineError::validation("item quantity must be positive"));
        }
        if item.unit_price < Decimal::ZERO {
            return Err(EngineError::validation("unit price cannot be negative"));
        }
        self.items.push(item);
        self.recompute_totals();
        Ok(())
    }

    /// draft → sent.
    pub fn mark_sent(&mut self) -> EngineResult<()> {
        if self.status != InvoiceStatus::Draft {
            return Err(EngineError::state("only draft invoices can be sent"));
        }
        if self.items.is_empty() {
            return Err(EngineError::validation(
                "cannot send an invoice without line items",
            ));
        }
        self.status = InvoiceStatus::Sent;
        self.version += 1;
        Ok(())
    }

    /// Explicit terminal override, regardless of payment history.
    pub fn mark_void(&mut self) -> EngineResult<()> {
        if self.status == InvoiceStatus::Void {
            return Err(EngineError::state("invoice is already void"));
        }
        self.status = InvoiceStatus::Void;
        self.version += 1;
        Ok(())
    }

    /// Recompute sub_total, tax_amount and grand_total from the items.
    pub(crate) fn recompute_totals(&mut self) {
        for item in &mut self.items {
            item.total_price = decimal_line_total(item.quantity, item.unit_price);
        }
        self.sub_total = self.items.iter().map(|i| i.total_price).sum();
        self.tax_amount = tax_amount(self.sub_total, self.tax_rate);
        self.grand_total = self.sub_total + self.tax_amount;
    }

    /// The lifecycle status beneath any payment-derived status. paid,
    /// partially_paid and overdue all imply the invoice was issued, so they
    /// normalize back to sent; draft, sent and void pass through.
    fn explicit_status(&self) -> InvoiceStatus {
        match self.status {
            InvoiceStatus::Paid | InvoiceStatus::PartiallyPaid | InvoiceStatus::Overdue => {
                InvoiceStatus::Sent
            }
            other => other,
        }
    }

    /// Recompute total_paid from the complete current payment set and
    /// re-derive the settlement status. Derivation starts from the lifecycle
    /// status, not the previously derived one, so removing payments demotes
    /// the invoice again.
    pub(crate) fn reconcile(&mut self, today: NaiveDate) {
        self.total_paid = self.payments.iter().map(|p| p.amount_paid).sum();
        self.status = derive_invoice_status(
            self.grand_total,
            self.total_paid,
            self.due_date,
            self.explicit_status(),
            today,
        );
    }

    pub(crate) fn payments_mut(&mut self) -> &mut Vec<Payment> {
        &mut self.payments
    }

    pub(crate) fn bump_version(&mut self) {
        self.version += 1;
    }
}

impl AggregateRoot for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_customer() -> CustomerRef {
        CustomerRef::new(AggregateId::new())
    }

    fn test_date() -> NaiveDate {
        "2026-02-01".parse().unwrap()
    }

    #[test]
    fn totals_follow_the_tax_invariants() {
        let mut invoice = Invoice::draft("INV-1001", test_customer(), test_date(), dec!(18));
        invoice
            .add_item(InvoiceLineItem::new(None, "Consulting", dec!(4), dec!(25.00)))
            .unwrap();

        assert_eq!(invoice.sub_total(), dec!(100.00));
        assert_eq!(invoice.tax_amount(), dec!(18.00));
        assert_eq!(invoice.grand_total(), dec!(118.00));
        assert_eq!(invoice.balance_due(), dec!(118.00));
    }

    #[test]
    fn fractional_quantities_are_allowed() {
        let mut invoice = Invoice::draft("INV-1002", test_customer(), test_date(), dec!(0));
        invoice
            .add_item(InvoiceLineItem::new(None, "Labour", dec!(2.5), dec!(40.00)))
            .unwrap();
        assert_eq!(invoice.grand_total(), dec!(100.00));
    }

    #[test]
    fn items_lock_once_sent() {
        let mut invoice = Invoice::draft("INV-1003", test_customer(), test_date(), dec!(0));
        invoice
            .add_item(InvoiceLineItem::new(None, "Widget", dec!(1), dec!(10.00)))
            .unwrap();
        invoice.mark_sent().unwrap();

        let err = invoice
            .add_item(InvoiceLineItem::new(None, "Gadget", dec!(1), dec!(5.00)))
            .unwrap_err();
        assert!(matches!(err, EngineError::State(_)));
    }

    #[test]
    fn void_is_terminal() {
        let mut invoice = Invoice::draft("INV-1004", test_customer(), test_date(), dec!(0));
        invoice
            .add_item(InvoiceLineItem::new(None, "Widget", dec!(1), dec!(10.00)))
            .unwrap();
        invoice.mark_sent().unwrap();
        invoice.mark_void().unwrap();

        assert!(!invoice.accepts_payments());
        assert!(matches!(invoice.mark_void().unwrap_err(), EngineError::State(_)));
    }

    #[test]
    fn wire_shape_is_camel_case_with_float_amounts() {
        let mut invoice = Invoice::draft("INV-1005", test_customer(), test_date(), dec!(18));
        invoice
            .add_item(InvoiceLineItem::new(None, "Consulting", dec!(4), dec!(25.00)))
            .unwrap();

        let json = serde_json::to_value(&invoice).unwrap();
        assert_eq!(json["invoiceNumber"], "INV-1005");
        assert_eq!(json["status"], "draft");
        assert_eq!(json["taxAmount"], 18.0);
        assert_eq!(json["grandTotal"], 118.0);
        assert_eq!(json["items"][0]["totalPrice"], 100.0);

        let back: Invoice = serde_json::from_value(json).unwrap();
        assert_eq!(back, invoice);
    }
}
