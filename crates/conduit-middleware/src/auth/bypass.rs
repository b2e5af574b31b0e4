//! Operations exempt from authentication.

use std::collections::HashSet;

/// A fixed set of operation ids the auth gate lets through unchecked.
///
/// Membership is an exact string match; there is no prefix or wildcard form.
///
/// ```
/// use conduit_middleware::BypassSet;
///
/// let bypass = BypassSet::from_iter(["/realworld.v1.RealWorld/Login"]);
/// assert!(bypass.contains("/realworld.v1.RealWorld/Login"));
/// assert!(!bypass.contains("/realworld.v1.RealWorld/Log"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BypassSet {
    operations: HashSet<String>,
}

impl BypassSet {
    /// Creates an empty set; every operation requires a credential.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an operation id.
    #[must_use]
    pub fn with(mut self, operation_id: impl Into<String>) -> Self {
        self.operations.insert(operation_id.into());
        self
    }

    /// Returns `true` if `operation_id` is exempt.
    #[must_use]
    pub fn contains(&self, operation_id: &str) -> bool {
        self.operations.contains(operation_id)
    }

    /// Returns the number of exempt operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns `true` if no operation is exempt.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for BypassSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            operations: iter.into_iter().map(Into::into).collect(),
        }
    }
}
