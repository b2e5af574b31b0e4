//! The wire-level error model.
//!
//! Every failure that leaves the service is a [`StandardError`]: a numeric
//! code, a domain naming the area that failed, a human-readable reason and an
//! optional set of per-field messages. Business logic, the binder and the auth
//! gate all build one, the middleware chain passes it along untouched and only
//! the encoder turns it into bytes.
//!
//! | `ErrorKind` | Code |
//! |---|---|
//! | `MalformedRequest` | 422 |
//! | `Unauthenticated` | 401 |
//! | `Forbidden` | 403 |
//! | `NotFound` | 404 |
//! | `Conflict` | 422 |
//! | `Internal` | 500 |

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Result type alias using [`StandardError`].
pub type CallResult<T> = Result<T, StandardError>;

/// Error kinds with their default wire codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Binder or input validation failure.
    MalformedRequest,
    /// Missing or invalid credential.
    Unauthenticated,
    /// Authenticated, but not allowed to touch the resource.
    Forbidden,
    /// No route, or the resource does not exist.
    NotFound,
    /// Uniqueness violation such as a taken email.
    Conflict,
    /// Panic or unexpected downstream failure.
    Internal,
}

impl ErrorKind {
    /// Returns the code used when a [`StandardError`] of this kind is built.
    #[must_use]
    pub const fn default_code(self) -> i32 {
        match self {
            Self::MalformedRequest | Self::Conflict => 422,
            Self::Unauthenticated => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Internal => 500,
        }
    }

    /// Returns the symbolic name, e.g. `UNAUTHENTICATED`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MalformedRequest => "MALFORMED_REQUEST",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::Internal => "INTERNAL",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-specific messages, ordered by field name.
///
/// Ordering keeps the encoded form byte-stable for equal errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors {
    /// Map of field name to its messages.
    pub fields: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a message for a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Returns the messages recorded for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    /// Returns `true` if no field has a message.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the number of fields with messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

/// The error value every operation reports.
///
/// The serialized form is exactly `{code, domain, reason, field_errors}`.
/// An internal cause may be attached for logging; it is never serialized.
///
/// # Example
///
/// ```
/// use conduit_core::StandardError;
///
/// let err = StandardError::unauthenticated("user", "login failed");
/// assert_eq!(err.code, 401);
/// assert_eq!(err.status_code().as_u16(), 401);
/// ```
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{domain}: {reason} (code {code})")]
pub struct StandardError {
    /// Numeric code, normally an HTTP status.
    pub code: i32,
    /// The area that failed, e.g. `user` or `email`.
    pub domain: String,
    /// Human-readable explanation.
    pub reason: String,
    /// Per-field messages.
    #[serde(default)]
    pub field_errors: FieldErrors,
    #[serde(skip)]
    cause: Option<Arc<anyhow::Error>>,
}

impl StandardError {
    /// Creates an error with an explicit code.
    #[must_use]
    pub fn new(code: i32, domain: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code,
            domain: domain.into(),
            reason: reason.into(),
            field_errors: FieldErrors::new(),
            cause: None,
        }
    }

    /// Creates an error using the kind's default code.
    #[must_use]
    pub fn from_kind(kind: ErrorKind, domain: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(kind.default_code(), domain, reason)
    }

    /// Creates a `MALFORMED_REQUEST` error (422).
    #[must_use]
    pub fn malformed_request(domain: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::from_kind(ErrorKind::MalformedRequest, domain, reason)
    }

    /// Creates an `UNAUTHENTICATED` error (401).
    #[must_use]
    pub fn unauthenticated(domain: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::from_kind(ErrorKind::Unauthenticated, domain, reason)
    }

    /// Creates a `FORBIDDEN` error (403).
    #[must_use]
    pub fn forbidden(domain: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::from_kind(ErrorKind::Forbidden, domain, reason)
    }

    /// Creates a `NOT_FOUND` error (404).
    #[must_use]
    pub fn not_found(domain: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::from_kind(ErrorKind::NotFound, domain, reason)
    }

    /// Creates a `CONFLICT` error (422).
    #[must_use]
    pub fn conflict(domain: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::from_kind(ErrorKind::Conflict, domain, reason)
    }

    /// Creates an `INTERNAL` error (500) in the `server` domain.
    #[must_use]
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::from_kind(ErrorKind::Internal, "server", reason)
    }

    /// Creates an `INTERNAL` error that keeps the underlying failure for logs.
    ///
    /// The cause never reaches the client; only `reason` does.
    pub fn internal_with_cause(reason: impl Into<String>, cause: impl Into<anyhow::Error>) -> Self {
        Self::internal(reason).with_cause(cause)
    }

    /// Attaches an internal cause.
    pub fn with_cause(mut self, cause: impl Into<anyhow::Error>) -> Self {
        self.cause = Some(Arc::new(cause.into()));
        self
    }

    /// Adds a per-field message.
    #[must_use]
    pub fn with_field_error(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.field_errors.add(field, message);
        self
    }

    /// Returns the internal cause, if one was attached.
    #[must_use]
    pub fn cause(&self) -> Option<&anyhow::Error> {
        self.cause.as_deref()
    }

    /// Returns the HTTP status for this error.
    ///
    /// Codes outside 100–599 map to 500.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        u16::try_from(self.code)
            .ok()
            .filter(|code| (100..600).contains(code))
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Returns `true` if the code is the default code of `kind`.
    #[must_use]
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.code == kind.default_code()
    }
}

impl PartialEq for StandardError {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
            && self.domain == other.domain
            && self.reason == other.reason
            && self.field_errors == other.field_errors
    }
}

impl Eq for StandardError {}

impl From<anyhow::Error> for StandardError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("internal error").with_cause(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_default_codes() {
        assert_eq!(ErrorKind::MalformedRequest.default_code(), 422);
        assert_eq!(ErrorKind::Unauthenticated.default_code(), 401);
        assert_eq!(ErrorKind::Forbidden.default_code(), 403);
        assert_eq!(ErrorKind::NotFound.default_code(), 404);
        assert_eq!(ErrorKind::Conflict.default_code(), 422);
        assert_eq!(ErrorKind::Internal.default_code(), 500);
    }

    #[test]
    fn test_serialized_shape() {
        let err = StandardError::unauthenticated("user", "login failed");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "code": 401,
                "domain": "user",
                "reason": "login failed",
                "field_errors": {}
            })
        );
    }

    #[test]
    fn test_cause_is_not_serialized() {
        let err = StandardError::internal_with_cause("db down", anyhow::anyhow!("connection refused"));
        let json = serde_json::to_string(&err).unwrap();
        assert!(!json.contains("connection refused"));
        assert_eq!(err.cause().unwrap().to_string(), "connection refused");
    }

    #[test]
    fn test_field_errors_are_ordered() {
        let err = StandardError::malformed_request("body", "invalid")
            .with_field_error("zeta", "bad")
            .with_field_error("alpha", "bad")
            .with_field_error("alpha", "worse");
        let json = serde_json::to_string(&err).unwrap();
        let alpha = json.find("alpha").unwrap();
        let zeta = json.find("zeta").unwrap();
        assert!(alpha < zeta);
        assert_eq!(err.field_errors.get("alpha").unwrap().len(), 2);
        assert_eq!(err.field_errors.len(), 2);
    }

    #[test]
    fn test_status_code_range() {
        assert_eq!(StandardError::new(404, "x", "y").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(StandardError::new(100, "x", "y").status_code().as_u16(), 100);
        assert_eq!(StandardError::new(599, "x", "y").status_code().as_u16(), 599);
        assert_eq!(StandardError::new(99, "x", "y").status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(StandardError::new(600, "x", "y").status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(StandardError::new(-1, "x", "y").status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_equality_ignores_cause() {
        let a = StandardError::internal("boom");
        let b = StandardError::internal("boom").with_cause(anyhow::anyhow!("hidden"));
        assert_eq!(a, b);
        assert!(a.is(ErrorKind::Internal));
    }

    #[test]
    fn test_deserialize_without_field_errors() {
        let err: StandardError =
            serde_json::from_str(r#"{"code":404,"domain":"article","reason":"not found"}"#).unwrap();
        assert!(err.field_errors.is_empty());
        assert_eq!(err, StandardError::not_found("article", "not found"));
    }

    #[test]
    fn test_display() {
        let err = StandardError::forbidden("article", "not the author");
        assert_eq!(err.to_string(), "article: not the author (code 403)");
        assert_eq!(ErrorKind::Forbidden.to_string(), "FORBIDDEN");
    }
}
