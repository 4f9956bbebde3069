//! Reconciliation error model.

use thiserror::Error;

/// Result type used across the reconciliation core.
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine-level error.
///
/// Validation and state errors are detected locally, before anything is
/// written; they are never retried automatically. Network errors are
/// transient: the caller may retry, but must re-fetch the aggregate first.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Bad input (over-receipt, non-positive amount, unknown line id,
    /// empty batch).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Operation not permitted given the aggregate's current status
    /// (e.g. receiving against a cancelled order, paying a void invoice).
    #[error("invalid state: {0}")]
    State(String),

    /// Unknown aggregate, line item, or payment.
    #[error("not found: {0}")]
    NotFound(String),

    /// Gateway unreachable, timed out, or returned a malformed response.
    #[error("network error: {0}")]
    Network(String),
}

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// True for failures the caller may retry after re-fetching the aggregate.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// The human-readable message without the variant prefix. This is what
    /// goes into a wire envelope; the receiving side re-wraps it in the
    /// variant matching the response status.
    pub fn message(&self) -> &str {
        match self {
            Self::Validation(m) | Self::State(m) | Self::NotFound(m) | Self::Network(m) => m,
        }
    }
}
