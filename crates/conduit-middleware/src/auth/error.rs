//! Authentication errors.

use conduit_core::StandardError;
use thiserror::Error;

/// Why a credential was not accepted, or could not be issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No `Authorization` header.
    #[error("missing authorization header")]
    MissingCredential,

    /// The header is not `Bearer <token>` (or `Token <token>`).
    #[error("malformed authorization header")]
    MalformedCredential,

    /// The token is not a well-formed JWT.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The signature does not match the configured secret.
    #[error("invalid token signature")]
    InvalidSignature,

    /// The token carries an `exp` in the past.
    #[error("token has expired")]
    Expired,

    /// An `exp` claim is required but absent.
    #[error("token has no expiry")]
    MissingExpiry,

    /// The subject is not a user id.
    #[error("invalid token subject: {0}")]
    InvalidSubject(String),

    /// Signing failed.
    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::MissingRequiredClaim(claim) if claim == "exp" => Self::MissingExpiry,
            _ => Self::InvalidToken(err.to_string()),
        }
    }
}

impl From<AuthError> for StandardError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Signing(_) => StandardError::internal_with_cause("failed to issue token", err),
            other => StandardError::unauthenticated("auth", other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_are_unauthenticated() {
        for err in [
            AuthError::MissingCredential,
            AuthError::MalformedCredential,
            AuthError::InvalidSignature,
            AuthError::Expired,
            AuthError::InvalidSubject("abc".into()),
        ] {
            let std_err = StandardError::from(err.clone());
            assert_eq!(std_err.code, 401, "{err}");
            assert_eq!(std_err.domain, "auth");
            assert_eq!(std_err.reason, err.to_string());
        }
    }

    #[test]
    fn test_signing_failure_is_internal() {
        let std_err = StandardError::from(AuthError::Signing("boom".into()));
        assert_eq!(std_err.code, 500);
        assert!(std_err.cause().is_some());
    }
}
