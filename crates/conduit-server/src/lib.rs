//! # Conduit Server
//!
//! Request dispatch and the HTTP transport for Conduit.
//!
//! - [`OperationRegistry`] - operation id → route, binder rule and handler
//! - [`Dispatcher`] - resolve, bind, run the chain, encode
//! - [`Encoder`] - replies and [`StandardError`](conduit_core::StandardError)s on the wire
//! - [`HttpService`] / [`Server`] - CORS, `/debug/health`, deadlines, hyper accept loop
//! - [`ShutdownSignal`] - graceful shutdown
//!
//! ## Example
//!
//! ```
//! use bytes::Bytes;
//! use conduit_core::{BinderRule, CallResult, Empty, Operation, RequestContext};
//! use conduit_middleware::{AuthGate, BypassSet, Chain, TokenCodec};
//! use conduit_server::{Dispatcher, OperationRegistry};
//! use http::{Method, Request};
//!
//! const GET_TAGS: Operation =
//!     Operation::new("/realworld.v1.RealWorld/GetTags", Method::GET, "/api/tags", BinderRule::QueryOnly);
//!
//! async fn get_tags(_ctx: RequestContext, _req: Empty) -> CallResult<Vec<String>> {
//!     Ok(vec!["rust".into()])
//! }
//!
//! # tokio_test::block_on(async {
//! let mut registry = OperationRegistry::new();
//! registry.register(GET_TAGS, get_tags).unwrap();
//!
//! let gate = AuthGate::new(TokenCodec::new("secret"), BypassSet::from_iter([GET_TAGS.id]));
//! let dispatcher = Dispatcher::new(registry, Chain::standard(gate));
//!
//! let request = Request::get("/api/tags").body(Bytes::new()).unwrap();
//! let response = dispatcher.dispatch(request).await;
//! assert_eq!(response.status().as_u16(), 200);
//! assert_eq!(response.body().as_ref(), br#"["rust"]"#);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/conduit-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod cors;
pub mod dispatcher;
pub mod encoder;
pub mod error;
pub mod health;
pub mod registry;
pub mod server;
pub mod shutdown;

pub use config::{ServerConfig, ServerConfigBuilder, DEFAULT_MAX_BODY_BYTES};
pub use cors::CorsPolicy;
pub use dispatcher::Dispatcher;
pub use encoder::{Codec, Encoder, JsonCodec, FALLBACK_ERROR_BODY};
pub use error::{EncodeError, RegistryError, ServerError};
pub use health::{HealthCheck, HealthStatus, HEALTH_PATH};
pub use registry::{OperationRegistry, PreparedCall, RegisteredOperation};
pub use server::{HttpService, Server, PAYLOAD_TOO_LARGE_CODE, TIMEOUT_CODE};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
