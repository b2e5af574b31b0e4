//! # Conduit
//!
//! A RealWorld ("Conduit") blogging backend: accounts, profiles, articles,
//! comments, favorites and tags, served through the Conduit dispatch stack.
//!
//! - [`routes`] - the operation table and the credential bypass set
//! - [`dto`] - request and reply shapes
//! - [`store`] - repository traits and the in-memory store
//! - [`biz`] - business rules
//! - [`RealWorldService`] - one handler per operation
//! - [`AppBuilder`] - wiring into a [`Dispatcher`](conduit_server::Dispatcher)
//!
//! ## Example
//!
//! ```
//! use bytes::Bytes;
//! use conduit::{AppBuilder, PasswordHasher};
//! use conduit_config::AuthSettings;
//! use http::Request;
//!
//! # tokio_test::block_on(async {
//! let dispatcher = AppBuilder::new(AuthSettings::default())
//!     .password_hasher(PasswordHasher::new(4))
//!     .build()
//!     .unwrap();
//!
//! let register = Request::post("/api/users")
//!     .body(Bytes::from_static(
//!         br#"{"user":{"username":"jake","email":"jake@jake.jake","password":"jakejake"}}"#,
//!     ))
//!     .unwrap();
//! let response = dispatcher.dispatch(register).await;
//! assert_eq!(response.status().as_u16(), 200);
//!
//! let me = Request::get("/api/user").body(Bytes::new()).unwrap();
//! assert_eq!(dispatcher.dispatch(me).await.status().as_u16(), 401);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/conduit/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod app;
pub mod biz;
pub mod dto;
pub mod password;
pub mod routes;
pub mod service;
pub mod slug;
pub mod store;

pub use app::AppBuilder;
pub use password::PasswordHasher;
pub use service::RealWorldService;
pub use slug::slugify;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
