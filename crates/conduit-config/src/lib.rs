//! # Conduit Config
//!
//! Typed, layered configuration: built-in defaults, then a TOML or JSON
//! file, then environment variables. Unknown fields are errors.
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8000"
//! shutdown_timeout_secs = 30
//! request_timeout_ms = 0        # 0 disables the deadline
//! cors_enabled = true
//! max_body_bytes = 1048576      # larger request bodies get 413
//!
//! [auth]
//! jwt_secret = "realworld_demo_secret_key"
//! token_ttl_secs = 86400        # omit to issue tokens without `exp`
//! require_expiry = false
//!
//! [telemetry.logging]
//! enabled = true
//! level = "info"
//! format = "json"
//!
//! [telemetry.metrics]
//! enabled = false
//! addr = "0.0.0.0:9090"
//! ```
//!
//! Any field can be overridden as `CONDUIT__SECTION__KEY`, for example
//! `CONDUIT__AUTH__JWT_SECRET` or `CONDUIT__TELEMETRY__METRICS__ENABLED`.

#![doc(html_root_url = "https://docs.rs/conduit-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::ConduitConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{
    AuthSettings, LogFormat, LoggingSettings, MetricsSettings, ServerSettings, TelemetrySettings,
};
