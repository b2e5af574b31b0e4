//! Route table construction errors.

use http::Method;
use thiserror::Error;

/// A template that cannot be added without making routing ambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The same method and template shape is already registered.
    #[error("{method} {path} is already routed to {existing}")]
    Duplicate {
        /// Method of the rejected route.
        method: Method,
        /// Template of the rejected route.
        path: String,
        /// Operation that already owns the route.
        existing: String,
    },

    /// A variable at this position already has a different name.
    #[error("{path}: variable {{{name}}} conflicts with {{{existing}}} at the same position")]
    ParamConflict {
        /// Template of the rejected route.
        path: String,
        /// Name used by the rejected route.
        name: String,
        /// Name already registered at that position.
        existing: String,
    },

    /// The template has a malformed segment.
    #[error("{path}: invalid segment {segment:?}")]
    InvalidSegment {
        /// Template of the rejected route.
        path: String,
        /// The offending segment.
        segment: String,
    },
}
