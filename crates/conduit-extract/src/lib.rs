//! Request binder for Conduit.
//!
//! [`bind`] turns one HTTP request into one typed request value. The
//! operation's [`BinderRule`](conduit_core::BinderRule) names which sources
//! are read; when several supply the same field the precedence is always
//! **path variables > body > query**.
//!
//! ```rust
//! use conduit_core::BinderRule;
//! use conduit_extract::{bind, ExtractionContextBuilder};
//! use http::Method;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct DeleteComment {
//!     slug: String,
//!     id: u64,
//! }
//!
//! let ctx = ExtractionContextBuilder::new()
//!     .method(Method::DELETE)
//!     .uri("/api/articles/my-post/comments/3".parse().unwrap())
//!     .path_param("slug", "my-post")
//!     .path_param("id", "3")
//!     .build();
//!
//! let req: DeleteComment = bind(BinderRule::QueryAndPath, &ctx).unwrap();
//! assert_eq!(req.slug, "my-post");
//! assert_eq!(req.id, 3);
//! ```
//!
//! Binding is total: it either produces a complete value or fails with an
//! [`ExtractionError`], which converts into a `MALFORMED_REQUEST`
//! [`StandardError`](conduit_core::StandardError).

#![doc(html_root_url = "https://docs.rs/conduit-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod binder;
mod bound;
mod context;
mod error;

pub use binder::bind;
pub use context::{ExtractionContext, ExtractionContextBuilder};
pub use error::{ExtractionError, ExtractionSource};
