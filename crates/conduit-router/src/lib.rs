//! Radix tree router mapping `(method, path)` to an operation id.
//!
//! Paths are split on `/` and stored one segment per node. Static segments
//! are matched before `{param}` segments, so the most specific template
//! wins. Ambiguous templates are rejected when they are inserted rather than
//! resolved at match time.
//!
//! # Example
//!
//! ```rust
//! use conduit_router::Router;
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.insert(&Method::GET, "/api/articles/feed", "FeedListArticles").unwrap();
//! router.insert(&Method::GET, "/api/articles/{slug}/comments", "GetComments").unwrap();
//!
//! let found = router.match_route(&Method::GET, "/api/articles/hello/comments").unwrap();
//! assert_eq!(found.operation_id, "GetComments");
//! assert_eq!(found.params.get("slug"), Some("hello"));
//! ```
//!
//! ```text
//!                 (root)
//!                   │
//!                 "api"
//!                   │
//!               "articles"
//!              ┌────┴─────┐
//!           "feed"     "{slug}"
//!            [GET]        │
//!                    "comments"
//!                       [GET]
//! ```

#![doc(html_root_url = "https://docs.rs/conduit-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod method_table;
mod node;
mod params;
mod router;

pub use error::RouteError;
pub use method_table::MethodTable;
pub use params::Params;
pub use router::Router;

/// A matched route with its operation id and captured path variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    /// The operation registered for the method and template.
    pub operation_id: &'a str,
    /// Captured path variables, in template order.
    pub params: Params,
}

impl<'a> RouteMatch<'a> {
    /// Creates a new route match.
    #[must_use]
    pub fn new(operation_id: &'a str, params: Params) -> Self {
        Self {
            operation_id,
            params,
        }
    }
}
