//! Explicit session/context value.
//!
//! Engines never read ambient process-wide authentication state; the caller
//! passes the session into every engine call, which keeps the engines pure
//! and independently testable.

use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// The acting user plus the credential the gateway should present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    /// Bearer token forwarded on gateway requests, when the store requires one.
    pub bearer_token: Option<String>,
}

impl Session {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            bearer_token: None,
        }
    }

    pub fn with_token(user_id: UserId, token: impl Into<String>) -> Self {
        Self {
            user_id,
            bearer_token: Some(token.into()),
        }
    }
}
