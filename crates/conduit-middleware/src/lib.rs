//! # Conduit Middleware
//!
//! The interceptor chain wrapped around every handler invocation.
//!
//! ```text
//! ┌ Recovery ─────────────────────────────────────┐
//! │ ┌ AuthGate ─────────────────────────────────┐ │
//! │ │ ┌ Logging ──────────────────────────────┐ │ │
//! │ │ │             Handler                   │ │ │
//! │ │ └───────────────────────────────────────┘ │ │
//! │ └───────────────────────────────────────────┘ │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! The order is fixed when the [`Chain`] is built. A stage that returns an
//! error without calling [`Next::run`] stops the call there; stages outward
//! of it still see the error on the way out.
//!
//! ## Example
//!
//! ```
//! use conduit_middleware::{AuthGate, BypassSet, CallContext, Chain, Stage, TokenCodec};
//! use http::HeaderMap;
//!
//! # tokio_test::block_on(async {
//! let codec = TokenCodec::new("realworld_demo_secret_key");
//! let chain = Chain::standard(AuthGate::new(codec, BypassSet::new()));
//! assert_eq!(chain.len(), Stage::all().len());
//!
//! let mut ctx = CallContext::new("/realworld.v1.RealWorld/GetCurrentUser", HeaderMap::new());
//! let outcome = chain
//!     .run(&mut ctx, |_| Box::pin(async { Ok(serde_json::Value::Null) }))
//!     .await;
//! assert_eq!(outcome.unwrap_err().code, 401);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/conduit-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod chain;
pub mod context;
pub mod interceptor;
pub mod stages;

pub use auth::{AuthError, BypassSet, Claims, TokenCodec};
pub use chain::{BoxedInterceptor, Chain, ChainBuilder, Stage};
pub use context::{AuthState, CallContext};
pub use interceptor::{BoxFuture, Interceptor, Next, Terminal};
pub use stages::{AuthGate, CallRecord, Logging, Recovery};
