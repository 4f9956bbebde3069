//! `ledgerline-gateway` — the persistence gateway contract.
//!
//! The engines read current aggregate state from the gateway and write
//! results back through it; the gateway's confirmed response is the new
//! canonical state. This crate carries the JSON wire envelope, an HTTP
//! implementation of the store traits the engines define, and an in-memory
//! implementation for tests and development.

pub mod dto;
pub mod http;
pub mod memory;

pub use dto::{Envelope, PaymentEnvelope, ReceiveRequest, RecordPaymentRequest};
pub use http::{GatewayConfig, HttpGateway};
pub use memory::InMemoryGateway;
