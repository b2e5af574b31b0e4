//! The debug health route.
//!
//! `GET /debug/health` answers before any operation lookup, so it needs no
//! credential and never touches the interceptor chain.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Method, Response, StatusCode};
use serde::{Deserialize, Serialize};

/// Path of the health route.
pub const HEALTH_PATH: &str = "/debug/health";

/// Body of the health response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Always `ok` while the process serves requests.
    pub status: String,
    /// Free-form message.
    pub message: String,
}

/// Answers the health route.
///
/// # Example
///
/// ```
/// use conduit_server::HealthCheck;
/// use http::Method;
///
/// let health = HealthCheck::new("conduit is running");
/// assert!(health.matches(&Method::GET, "/debug/health"));
/// assert!(!health.matches(&Method::POST, "/debug/health"));
/// assert_eq!(health.status().status, "ok");
/// ```
#[derive(Debug, Clone)]
pub struct HealthCheck {
    message: String,
}

impl HealthCheck {
    /// Creates a health check that reports `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns `true` for `GET /debug/health`.
    #[must_use]
    pub fn matches(&self, method: &Method, path: &str) -> bool {
        method == Method::GET && path == HEALTH_PATH
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> HealthStatus {
        HealthStatus {
            status: "ok".to_string(),
            message: self.message.clone(),
        }
    }

    /// Builds the 200 response.
    #[must_use]
    pub fn respond(&self) -> Response<Bytes> {
        let body = serde_json::to_vec(&self.status())
            .map_or_else(|_| Bytes::from_static(br#"{"status":"ok"}"#), Bytes::from);
        let mut response = Response::new(body);
        *response.status_mut() = StatusCode::OK;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self::new("conduit is running")
    }
}
