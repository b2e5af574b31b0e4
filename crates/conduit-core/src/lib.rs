//! # Conduit Core
//!
//! Core types and traits shared by every Conduit crate.
//!
//! - [`StandardError`] - The single error value that reaches the wire
//! - [`RequestContext`] - Per-call context handed to handlers
//! - [`Identity`] - The authenticated caller, attached by the auth gate
//! - [`Operation`] / [`BinderRule`] - Static description of a remote operation
//! - [`Handler`] - Typed business handler contract

#![doc(html_root_url = "https://docs.rs/conduit-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod handler;
mod identity;
mod operation;

pub use context::{RequestContext, RequestId};
pub use error::{CallResult, ErrorKind, FieldErrors, StandardError};
pub use handler::{Empty, Handler};
pub use identity::Identity;
pub use operation::{BinderRule, Operation};
