//! HS256 token issuance and verification.

use crate::auth::error::AuthError;
use conduit_core::Identity;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Claims carried by a Conduit token.
///
/// Only `sub` is mandatory. `iat` and `exp` are written when the codec has a
/// TTL and are accepted, but not required, when verifying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The user id, as a decimal string.
    pub sub: String,
    /// Issued-at, seconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Expiry, seconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Signs and verifies tokens with one process-wide secret.
///
/// The codec is immutable after construction and is shared by reference
/// between the auth gate and the handlers that issue tokens.
///
/// # Example
///
/// ```
/// use conduit_middleware::TokenCodec;
///
/// let codec = TokenCodec::new("realworld_demo_secret_key");
/// let token = codec.issue(42).unwrap();
/// assert_eq!(codec.verify(&token).unwrap().user_id, 42);
/// assert!(TokenCodec::new("other").verify(&token).is_err());
/// ```
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Option<Duration>,
}

impl TokenCodec {
    /// Creates a codec that issues tokens without time claims.
    #[must_use]
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = true;
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl: None,
        }
    }

    /// Adds `iat` and `exp` to issued tokens.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Rejects tokens that carry no `exp` claim.
    #[must_use]
    pub fn require_expiry(mut self, required: bool) -> Self {
        if required {
            self.validation.set_required_spec_claims(&["exp"]);
        } else {
            self.validation.required_spec_claims.clear();
        }
        self
    }

    /// Returns the configured token lifetime.
    #[must_use]
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Issues a signed token for `user_id`.
    ///
    /// Without a TTL the output depends only on the secret and the user id.
    pub fn issue(&self, user_id: u64) -> Result<String, AuthError> {
        let (iat, exp) = match self.ttl {
            Some(ttl) => {
                let now = unix_now();
                let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
                (Some(now), Some(now.saturating_add(ttl)))
            }
            None => (None, None),
        };
        let claims = Claims {
            sub: user_id.to_string(),
            iat,
            exp,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Verifies a token's signature and decodes the caller identity.
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        let claims = data.claims;
        let user_id = claims
            .sub
            .parse::<u64>()
            .map_err(|_| AuthError::InvalidSubject(claims.sub.clone()))?;

        Ok(Identity {
            user_id,
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}
