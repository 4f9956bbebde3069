//! HTTP implementation of the store contracts.
//!
//! Transport failures, timeouts, and 5xx responses surface as
//! `EngineError::Network`; the caller decides whether to retry, and a retry
//! must re-fetch the aggregate rather than resubmit a stale one.

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::instrument;

use ledgerline_core::{EngineError, EngineResult, Session};
use ledgerline_invoicing::{
    Invoice, InvoiceId, InvoiceStore, PaymentCommit, PaymentDraft, PaymentId, PaymentPatch,
};
use ledgerline_purchasing::{
    PurchaseOrder, PurchaseOrderId, PurchaseOrderStore, ReceiptSubmission,
};

use crate::dto::{Envelope, PaymentEnvelope, ReceiveRequest, RecordPaymentRequest};

/// Header carrying the client-generated receipt idempotency token.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Explicit gateway configuration; nothing is read from ambient state.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Reqwest-backed gateway client.
pub struct HttpGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> EngineResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| EngineError::network(format!("failed to build http client: {e}")))?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authed(&self, builder: RequestBuilder, session: &Session) -> RequestBuilder {
        match &session.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> EngineResult<Response> {
        builder
            .send()
            .await
            .map_err(|e| EngineError::network(format!("gateway request failed: {e}")))
    }

    /// Map a non-success response onto the error taxonomy.
    fn map_failure(status: StatusCode, message: Option<String>) -> EngineError {
        let message = message.unwrap_or_else(|| format!("gateway returned {status}"));
        match status {
            StatusCode::NOT_FOUND => EngineError::not_found(message),
            StatusCode::BAD_REQUEST => EngineError::validation(message),
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                EngineError::state(message)
            }
            _ => EngineError::network(message),
        }
    }

    async fn read_envelope<T: DeserializeOwned>(&self, response: Response) -> EngineResult<T> {
        let status = response.status();
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| EngineError::network(format!("malformed gateway response: {e}")))?;

        if !envelope.success || !status.is_success() {
            return Err(Self::map_failure(status, envelope.message));
        }
        envelope
            .data
            .ok_or_else(|| EngineError::network("gateway response missing data"))
    }

    async fn read_payment_envelope(
        &self,
        response: Response,
    ) -> EngineResult<PaymentEnvelope> {
        let status = response.status();
        let envelope: PaymentEnvelope = response
            .json()
            .await
            .map_err(|e| EngineError::network(format!("malformed gateway response: {e}")))?;

        if !envelope.success || !status.is_success() {
            return Err(Self::map_failure(status, envelope.message));
        }
        Ok(envelope)
    }

    fn updated_invoice(envelope: PaymentEnvelope) -> EngineResult<Invoice> {
        envelope
            .updated_invoice
            .ok_or_else(|| EngineError::network("gateway response missing updatedInvoice"))
    }
}

impl PurchaseOrderStore for HttpGateway {
    async fn fetch(
        &self,
        session: &Session,
        id: PurchaseOrderId,
    ) -> EngineResult<PurchaseOrder> {
        let builder = self.client.get(self.url(&format!("/purchase-orders/{id}")));
        let response = self.send(self.authed(builder, session)).await?;
        self.read_envelope(response).await
    }

    #[instrument(
        skip(self, session, submission),
        fields(order = %id, key = %submission.idempotency_key),
        err
    )]
    async fn submit_receipt(
        &self,
        session: &Session,
        id: PurchaseOrderId,
        submission: &ReceiptSubmission,
    ) -> EngineResult<PurchaseOrder> {
        let body = ReceiveRequest {
            items_to_receive: submission.lines.clone(),
        };
        let builder = self
            .client
            .post(self.url(&format!("/purchase-orders/{id}/receive")))
            .header(IDEMPOTENCY_KEY_HEADER, submission.idempotency_key.to_string())
            .json(&body);
        let response = self.send(self.authed(builder, session)).await?;
        self.read_envelope(response).await
    }
}

impl InvoiceStore for HttpGateway {
    async fn fetch(&self, session: &Session, id: InvoiceId) -> EngineResult<Invoice> {
        let builder = self.client.get(self.url(&format!("/invoices/{id}")));
        let response = self.send(self.authed(builder, session)).await?;
        self.read_envelope(response).await
    }

    #[instrument(skip(self, session, draft), fields(invoice = %invoice_id), err)]
    async fn create_payment(
        &self,
        session: &Session,
        invoice_id: InvoiceId,
        draft: &PaymentDraft,
    ) -> EngineResult<PaymentCommit> {
        let body = RecordPaymentRequest {
            invoice_id,
            payment: draft.clone(),
        };
        let builder = self.client.post(self.url("/payments")).json(&body);
        let response = self.send(self.authed(builder, session)).await?;
        let envelope = self.read_payment_envelope(response).await?;

        let payment = envelope
            .data
            .clone()
            .ok_or_else(|| EngineError::network("gateway response missing payment"))?;
        Ok(PaymentCommit {
            payment,
            updated_invoice: Self::updated_invoice(envelope)?,
        })
    }

    #[instrument(skip(self, session, patch), fields(payment = %payment_id), err)]
    async fn update_payment(
        &self,
        session: &Session,
        payment_id: PaymentId,
        patch: &PaymentPatch,
    ) -> EngineResult<PaymentCommit> {
        let builder = self
            .client
            .put(self.url(&format!("/payments/{payment_id}")))
            .json(patch);
        let response = self.send(self.authed(builder, session)).await?;
        let envelope = self.read_payment_envelope(response).await?;

        let payment = envelope
            .data
            .clone()
            .ok_or_else(|| EngineError::network("gateway response missing payment"))?;
        Ok(PaymentCommit {
            payment,
            updated_invoice: Self::updated_invoice(envelope)?,
        })
    }

    #[instrument(skip(self, session), fields(payment = %payment_id), err)]
    async fn delete_payment(
        &self,
        session: &Session,
        payment_id: PaymentId,
    ) -> EngineResult<Invoice> {
        let builder = self.client.delete(self.url(&format!("/payments/{payment_id}")));
        let response = self.send(self.authed(builder, session)).await?;
        let envelope = self.read_payment_envelope(response).await?;
        Self::updated_invoice(envelope)
    }
}
