//! Password hashing.

use conduit_core::{CallResult, StandardError};

/// The lowest cost bcrypt accepts. Only worth using in tests.
pub const MIN_COST: u32 = 4;

/// bcrypt hashing off the async runtime.
///
/// Hashing is CPU-bound, so both directions run on the blocking pool.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher {
    /// Creates a hasher with the given bcrypt cost.
    #[must_use]
    pub const fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Returns the bcrypt cost.
    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    /// Hashes `password`.
    pub async fn hash(&self, password: &str) -> CallResult<String> {
        let password = password.to_owned();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| StandardError::internal_with_cause("password hashing aborted", e))?
            .map_err(|e| StandardError::internal_with_cause("failed to hash password", e))
    }

    /// Checks `password` against a stored hash. A malformed hash never matches.
    pub async fn verify(&self, password: &str, hash: &str) -> CallResult<bool> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| StandardError::internal_with_cause("password check aborted", e))?;
        match outcome {
            Ok(matched) => Ok(matched),
            Err(err) => {
                tracing::warn!(error = %err, "stored password hash is unreadable");
                Ok(false)
            }
        }
    }
}
