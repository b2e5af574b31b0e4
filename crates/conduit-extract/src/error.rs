//! Binding error types.

use conduit_core::{ErrorKind, StandardError};
use std::fmt;
use thiserror::Error;

/// Where the offending data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionSource {
    /// Path variables (e.g. `/api/article/{slug}`).
    Path,
    /// Query string.
    Query,
    /// JSON body.
    Body,
    /// The merged request as a whole (e.g. a missing required field).
    Request,
}

impl fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path => write!(f, "path"),
            Self::Query => write!(f, "query"),
            Self::Body => write!(f, "body"),
            Self::Request => write!(f, "request"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtractionErrorKind {
    Missing,
    InvalidType,
    DeserializationFailed,
}

/// A request that could not be bound.
///
/// Converts into a `MALFORMED_REQUEST` [`StandardError`] whose domain is the
/// source name and whose field errors name the offending field.
///
/// # Example
///
/// ```rust
/// use conduit_core::StandardError;
/// use conduit_extract::{ExtractionError, ExtractionSource};
///
/// let err = ExtractionError::invalid_type(ExtractionSource::Path, "id", "invalid digit found in string");
/// let std_err = StandardError::from(err);
/// assert_eq!(std_err.code, 422);
/// assert_eq!(std_err.domain, "path");
/// assert!(std_err.field_errors.get("id").is_some());
/// ```
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ExtractionError {
    extraction_source: ExtractionSource,
    kind: ExtractionErrorKind,
    field: Option<String>,
    message: String,
}

impl ExtractionError {
    /// A required field is absent from every source.
    #[must_use]
    pub fn missing(source: ExtractionSource, field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            extraction_source: source,
            kind: ExtractionErrorKind::Missing,
            message: format!("missing required field: {field}"),
            field: Some(field),
        }
    }

    /// A value does not convert to its field's type.
    #[must_use]
    pub fn invalid_type(
        source: ExtractionSource,
        field: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        let field = field.into();
        let details = details.into();
        Self {
            extraction_source: source,
            kind: ExtractionErrorKind::InvalidType,
            message: format!("invalid {source} value for '{field}': {details}"),
            field: Some(field),
        }
    }

    /// A source as a whole could not be decoded.
    #[must_use]
    pub fn deserialization_failed(source: ExtractionSource, error: impl fmt::Display) -> Self {
        Self {
            extraction_source: source,
            kind: ExtractionErrorKind::DeserializationFailed,
            message: format!("failed to decode {source}: {error}"),
            field: None,
        }
    }

    /// Returns the source the error is attributed to.
    #[must_use]
    pub fn extraction_source(&self) -> ExtractionSource {
        self.extraction_source
    }

    /// Returns the field name if applicable.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns `true` for a missing required field.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        self.kind == ExtractionErrorKind::Missing
    }

    /// Returns a machine-readable code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self.kind {
            ExtractionErrorKind::Missing => "MISSING_FIELD",
            ExtractionErrorKind::InvalidType => "INVALID_FIELD",
            ExtractionErrorKind::DeserializationFailed => "UNDECODABLE",
        }
    }
}

impl From<ExtractionError> for StandardError {
    fn from(err: ExtractionError) -> Self {
        let mut std_err = StandardError::from_kind(
            ErrorKind::MalformedRequest,
            err.extraction_source.to_string(),
            err.message.clone(),
        );
        if let Some(field) = err.field {
            std_err = std_err.with_field_error(field, err.message);
        }
        std_err
    }
}
