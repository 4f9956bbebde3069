//! `ledgerline-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod aggregate;
pub mod error;
pub mod id;
pub mod money;
pub mod session;

pub use aggregate::AggregateRoot;
pub use error::{EngineError, EngineResult};
pub use id::{AggregateId, ProductRef, UserId};
pub use session::Session;
