//! Static description of remote operations.
//!
//! Each operation is declared once as a constant and never mutated. The
//! registry pairs it with a handler; the router matches its method and path
//! template; the binder reads the sources its [`BinderRule`] names.

use http::Method;

/// Which parts of a request feed the typed request value.
///
/// Precedence is always path variables over body over query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinderRule {
    /// JSON body, then query values for fields the body did not set.
    BodyAndQuery,
    /// Query string only.
    QueryOnly,
    /// JSON body, query string and path variables.
    BodyQueryAndPath,
    /// Query string and path variables.
    QueryAndPath,
}

impl BinderRule {
    /// Returns `true` if the body is decoded.
    #[must_use]
    pub const fn reads_body(self) -> bool {
        matches!(self, Self::BodyAndQuery | Self::BodyQueryAndPath)
    }

    /// Returns `true` if path variables are bound.
    #[must_use]
    pub const fn reads_path(self) -> bool {
        matches!(self, Self::BodyQueryAndPath | Self::QueryAndPath)
    }
}

/// An operation: `{id, http method, path template, binder rule}`.
///
/// # Example
///
/// ```
/// use conduit_core::{BinderRule, Operation};
/// use http::Method;
///
/// const GET_TAGS: Operation =
///     Operation::new("/realworld.v1.RealWorld/GetTags", Method::GET, "/api/tags", BinderRule::QueryOnly);
///
/// assert_eq!(GET_TAGS.name(), "GetTags");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// Globally unique operation id.
    pub id: &'static str,
    /// HTTP method the operation is served on.
    pub method: Method,
    /// Path template with `{name}` placeholders.
    pub path_template: &'static str,
    /// Sources the binder reads.
    pub binder_rule: BinderRule,
}

impl Operation {
    /// Declares an operation.
    #[must_use]
    pub const fn new(
        id: &'static str,
        method: Method,
        path_template: &'static str,
        binder_rule: BinderRule,
    ) -> Self {
        Self {
            id,
            method,
            path_template,
            binder_rule,
        }
    }

    /// Returns the short name: the id's last `/`-separated segment.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.id.rsplit('/').next().unwrap_or(self.id)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.method, self.path_template, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELETE_COMMENT: Operation = Operation::new(
        "/realworld.v1.RealWorld/DeleteComment",
        Method::DELETE,
        "/api/articles/{slug}/comments/{id}",
        BinderRule::QueryAndPath,
    );

    #[test]
    fn test_rule_sources() {
        assert!(BinderRule::BodyAndQuery.reads_body());
        assert!(!BinderRule::BodyAndQuery.reads_path());
        assert!(!BinderRule::QueryOnly.reads_body());
        assert!(!BinderRule::QueryOnly.reads_path());
        assert!(BinderRule::BodyQueryAndPath.reads_body());
        assert!(BinderRule::BodyQueryAndPath.reads_path());
        assert!(!BinderRule::QueryAndPath.reads_body());
        assert!(BinderRule::QueryAndPath.reads_path());
    }

    #[test]
    fn test_name() {
        assert_eq!(DELETE_COMMENT.name(), "DeleteComment");
        assert_eq!(
            Operation::new("Bare", Method::GET, "/", BinderRule::QueryOnly).name(),
            "Bare"
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(
            DELETE_COMMENT.to_string(),
            "DELETE /api/articles/{slug}/comments/{id} (/realworld.v1.RealWorld/DeleteComment)"
        );
    }
}
