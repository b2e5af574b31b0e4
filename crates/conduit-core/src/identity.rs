//! The authenticated caller.

use serde::{Deserialize, Serialize};

/// Identity attached to a call once its bearer credential verifies.
///
/// Produced by the auth gate, read by handlers, never persisted by the
/// dispatch layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// The user the credential was issued for.
    pub user_id: u64,
    /// Issue time (seconds since the epoch), when the credential carries one.
    pub issued_at: Option<i64>,
    /// Expiry (seconds since the epoch), when the credential carries one.
    pub expires_at: Option<i64>,
}

impl Identity {
    /// Creates an identity with no time claims.
    #[must_use]
    pub const fn new(user_id: u64) -> Self {
        Self {
            user_id,
            issued_at: None,
            expires_at: None,
        }
    }

    /// Returns a string identifier suitable for logging.
    #[must_use]
    pub fn log_id(&self) -> String {
        format!("user:{}", self.user_id)
    }
}
