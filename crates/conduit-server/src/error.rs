//! Server error types.

use conduit_router::RouteError;
use thiserror::Error;

/// Errors raised while building the operation registry.
///
/// These are configuration errors: they surface at startup, never while
/// serving a call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two operations share an id.
    #[error("operation '{0}' is registered twice")]
    DuplicateOperation(String),

    /// The operation's route conflicts with one already registered.
    #[error(transparent)]
    Route(#[from] RouteError),
}

/// Errors raised by the HTTP server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address is invalid or already in use.
    #[error("failed to bind: {0}")]
    Bind(String),

    /// An I/O error on the listener.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A codec could not marshal a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{codec} encoding failed: {message}")]
pub struct EncodeError {
    /// Name of the codec that failed.
    pub codec: &'static str,
    /// What went wrong.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = RegistryError::DuplicateOperation("/svc/Login".into());
        assert_eq!(err.to_string(), "operation '/svc/Login' is registered twice");

        let err = ServerError::Bind("127.0.0.1:1: address in use".into());
        assert!(err.to_string().starts_with("failed to bind"));
    }
}
