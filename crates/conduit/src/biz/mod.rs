//! Business rules for the RealWorld operations.
//!
//! Usecases take already-bound requests plus the caller's identity and
//! return reply payloads or a [`StandardError`](conduit_core::StandardError)
//! that goes to the wire unchanged.

mod social;
mod user;

pub use social::SocialUsecase;
pub use user::UserUsecase;

use conduit_core::{CallResult, StandardError};

/// Page size when a listing does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

fn require_non_empty(field: &'static str, value: &str) -> CallResult<()> {
    if value.trim().is_empty() {
        return Err(StandardError::malformed_request(field, "cannot be empty"));
    }
    Ok(())
}

fn require_present(field: &'static str, value: Option<&str>) -> CallResult<()> {
    value.map_or(Ok(()), |v| require_non_empty(field, v))
}
