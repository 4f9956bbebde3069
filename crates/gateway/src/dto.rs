//! Wire DTOs for the persistence gateway (JSON over HTTP).

use serde::{Deserialize, Serialize};

use ledgerline_invoicing::{Invoice, InvoiceId, Payment, PaymentDraft};
use ledgerline_purchasing::ReceiptLine;

/// Response envelope: `{ success, data?, message? }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Payment mutation envelope: the stored payment plus the canonical
/// re-reconciled invoice. `data` is absent on deletes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Payment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_invoice: Option<Invoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body of `POST /purchase-orders/:id/receive`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveRequest {
    pub items_to_receive: Vec<ReceiptLine>,
}

/// Body of `POST /payments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentRequest {
    pub invoice_id: InvoiceId,
    #[serde(flatten)]
    pub payment: PaymentDraft,
}
