//! High-level router API.

use http::Method;

use crate::error::RouteError;
use crate::method_table::MethodTable;
use crate::node::Node;
use crate::params::Params;
use crate::RouteMatch;

/// Operation router over a radix tree.
///
/// # Route Priority
///
/// 1. **Static segments** (e.g. `/api/articles/feed`)
/// 2. **Variable segments** (e.g. `/api/articles/{slug}`)
///
/// Two templates that differ only in variable names, or that reuse a
/// method on the same shape, are rejected by [`Router::insert`].
///
/// # Example
///
/// ```rust
/// use conduit_router::{RouteError, Router};
/// use http::Method;
///
/// let mut router = Router::new();
/// router.insert(&Method::GET, "/api/article/{slug}", "GetArticle").unwrap();
///
/// let err = router.insert(&Method::PUT, "/api/article/{id}", "UpdateArticle").unwrap_err();
/// assert!(matches!(err, RouteError::ParamConflict { .. }));
/// ```
#[derive(Debug, Clone)]
pub struct Router {
    root: Node,
    route_count: usize,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            route_count: 0,
        }
    }

    /// Routes `method` + `path` to `operation_id`.
    pub fn insert(
        &mut self,
        method: &Method,
        path: &str,
        operation_id: impl AsRef<str>,
    ) -> Result<(), RouteError> {
        self.root.insert(method, path, operation_id.as_ref())?;
        self.route_count += 1;
        Ok(())
    }

    /// Matches a method and concrete path.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        let (methods, params) = self.root.match_path(path)?;
        let operation_id = methods.get(method)?;
        Some(RouteMatch::new(operation_id, params))
    }

    /// Matches a path regardless of method.
    ///
    /// Useful for telling "no such path" apart from "method not served here".
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodTable, Params)> {
        self.root.match_path(path)
    }

    /// Returns the number of routes registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn realworld() -> Router {
        let mut router = Router::new();
        let routes = [
            (Method::POST, "/api/users/login", "Login"),
            (Method::POST, "/api/users", "Register"),
            (Method::GET, "/api/user", "GetCurrentUser"),
            (Method::PUT, "/api/user", "UpdateUser"),
            (Method::GET, "/api/profile/{username}", "GetProfile"),
            (Method::POST, "/api/profile/{username}/follow", "FollowUser"),
            (Method::DELETE, "/api/profile/{username}/follow", "UnFollowUser"),
            (Method::GET, "/api/articles", "ListArticles"),
            (Method::GET, "/api/articles/feed", "FeedListArticles"),
            (Method::GET, "/api/article/{slug}", "GetArticle"),
            (Method::POST, "/api/article", "CreateArticle"),
            (Method::PUT, "/api/article/{slug}", "UpdateArticle"),
            (Method::DELETE, "/api/article/{slug}", "DeleteArticle"),
            (Method::POST, "/api/articles/{slug}/comments", "AddComment"),
            (Method::GET, "/api/articles/{slug}/comments", "GetComments"),
            (Method::DELETE, "/api/articles/{slug}/comments/{id}", "DeleteComment"),
            (Method::POST, "/api/articles/{slug}/favorite", "FavoriteArticle"),
            (Method::DELETE, "/api/articles/{slug}/favorite", "UnFavoriteArticle"),
            (Method::GET, "/api/tags", "GetTags"),
        ];
        for (method, path, op) in routes {
            router.insert(&method, path, op).unwrap();
        }
        router
    }

    #[test]
    fn test_new_router_is_empty() {
        let router = Router::new();
        assert!(router.is_empty());
        assert_eq!(router.len(), 0);
    }

    #[test]
    fn test_realworld_table_resolves() {
        let router = realworld();
        assert_eq!(router.len(), 19);

        let m = router
            .match_route(&Method::DELETE, "/api/articles/my-post/comments/3")
            .unwrap();
        assert_eq!(m.operation_id, "DeleteComment");
        assert_eq!(m.params.get("slug"), Some("my-post"));
        assert_eq!(m.params.get("id"), Some("3"));

        let m = router.match_route(&Method::PUT, "/api/user").unwrap();
        assert_eq!(m.operation_id, "UpdateUser");
        assert!(m.params.is_empty());
    }

    #[test]
    fn test_static_beats_variable() {
        let mut router = Router::new();
        router.insert(&Method::GET, "/api/articles/{slug}", "BySlug").unwrap();
        router.insert(&Method::GET, "/api/articles/feed", "Feed").unwrap();

        assert_eq!(
            router.match_route(&Method::GET, "/api/articles/feed").unwrap().operation_id,
            "Feed"
        );
        assert_eq!(
            router.match_route(&Method::GET, "/api/articles/other").unwrap().operation_id,
            "BySlug"
        );
    }

    #[test]
    fn test_trailing_and_repeated_slashes_are_ignored() {
        let router = realworld();
        assert_eq!(
            router.match_route(&Method::GET, "/api/tags/").unwrap().operation_id,
            "GetTags"
        );
        assert_eq!(
            router.match_route(&Method::GET, "//api//tags").unwrap().operation_id,
            "GetTags"
        );
    }

    #[test]
    fn test_unknown_path_and_method() {
        let router = realworld();
        assert!(router.match_route(&Method::GET, "/api/nothing").is_none());
        assert!(router.match_route(&Method::PATCH, "/api/user").is_none());

        let (methods, _) = router.match_path("/api/user").unwrap();
        assert_eq!(methods.allowed_methods(), vec![Method::GET, Method::PUT]);
    }

    #[test]
    fn test_duplicate_route_rejected() {
        let mut router = realworld();
        let err = router
            .insert(&Method::GET, "/api/tags", "GetTagsAgain")
            .unwrap_err();
        assert_eq!(
            err,
            RouteError::Duplicate {
                method: Method::GET,
                path: "/api/tags".to_string(),
                existing: "GetTags".to_string(),
            }
        );
        assert_eq!(router.len(), 19);
    }

    #[test]
    fn test_same_shape_different_names_rejected() {
        let mut router = realworld();
        let err = router
            .insert(&Method::PATCH, "/api/profile/{name}", "PatchProfile")
            .unwrap_err();
        assert!(matches!(err, RouteError::ParamConflict { .. }));
        assert!(err.to_string().contains("{name}"));
    }
}
