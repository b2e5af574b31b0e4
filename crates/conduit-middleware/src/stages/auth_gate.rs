//! Per-operation authentication.
//!
//! ```text
//! Unchecked ──bypassed id──────────────▶ Bypassed      (continue)
//!     │
//!     ├──valid bearer credential──────▶ Authenticated (identity attached, continue)
//!     │
//!     └──missing / malformed / invalid─▶ Rejected      (401, handler never runs)
//! ```

use crate::auth::{AuthError, BypassSet, TokenCodec};
use crate::context::{AuthState, CallContext};
use crate::interceptor::{BoxFuture, Interceptor, Next};
use conduit_core::{CallResult, Identity, StandardError};
use http::header::AUTHORIZATION;
use http::HeaderMap;
use serde_json::Value;
use std::sync::Arc;

const SCHEMES: [&str; 2] = ["bearer", "token"];

/// Rejects calls that lack a valid credential, unless the operation is in
/// the bypass set.
///
/// The decision depends on the operation id only, never on the HTTP method
/// or path.
#[derive(Debug, Clone)]
pub struct AuthGate {
    codec: Arc<TokenCodec>,
    bypass: BypassSet,
}

impl AuthGate {
    /// Creates a gate verifying tokens with `codec`.
    #[must_use]
    pub fn new(codec: impl Into<Arc<TokenCodec>>, bypass: BypassSet) -> Self {
        Self {
            codec: codec.into(),
            bypass,
        }
    }

    /// Returns the token codec.
    #[must_use]
    pub fn codec(&self) -> &Arc<TokenCodec> {
        &self.codec
    }

    /// Returns the bypass set.
    #[must_use]
    pub fn bypass(&self) -> &BypassSet {
        &self.bypass
    }

    /// Decides one call: `Ok(None)` when bypassed, the caller when
    /// authenticated.
    pub fn check(&self, operation_id: &str, headers: &HeaderMap) -> Result<Option<Identity>, AuthError> {
        if self.bypass.contains(operation_id) {
            return Ok(None);
        }
        let token = bearer_token(headers)?;
        self.codec.verify(token).map(Some)
    }
}

impl Interceptor for AuthGate {
    fn name(&self) -> &'static str {
        "auth_gate"
    }

    fn intercept<'a>(
        &'a self,
        ctx: &'a mut CallContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, CallResult<Value>> {
        Box::pin(async move {
            match self.check(ctx.operation_id(), ctx.headers()) {
                Ok(None) => ctx.set_auth_state(AuthState::Bypassed),
                Ok(Some(identity)) => ctx.authenticate(identity),
                Err(err) => {
                    ctx.set_auth_state(AuthState::Rejected);
                    tracing::debug!(
                        operation_id = %ctx.operation_id(),
                        error = %err,
                        "call rejected by auth gate"
                    );
                    return Err(StandardError::from(err));
                }
            }
            next.run(ctx).await
        })
    }
}

/// Reads the token from `Authorization: Bearer <token>`.
///
/// The scheme is case-insensitive, and the RealWorld `Token` scheme is
/// accepted as well.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?
        .to_str()
        .map_err(|_| AuthError::MalformedCredential)?;

    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or(AuthError::MalformedCredential)?;
    if !SCHEMES.iter().any(|s| scheme.eq_ignore_ascii_case(s)) {
        return Err(AuthError::MalformedCredential);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MalformedCredential);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Chain;
    use http::HeaderValue;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SECRET: &str = "realworld_demo_secret_key";
    const LOGIN: &str = "/realworld.v1.RealWorld/Login";
    const CURRENT_USER: &str = "/realworld.v1.RealWorld/GetCurrentUser";

    fn gate() -> AuthGate {
        AuthGate::new(TokenCodec::new(SECRET), BypassSet::from_iter([LOGIN]))
    }

    fn headers(authorization: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(authorization).unwrap());
        headers
    }

    async fn call(chain: &Chain, ctx: &mut CallContext, hits: &Arc<AtomicUsize>) -> CallResult<Value> {
        let hits = Arc::clone(hits);
        chain
            .run(ctx, move |ctx| {
                hits.fetch_add(1, Ordering::SeqCst);
                let user = ctx.identity().map(|i| i.user_id);
                Box::pin(async move { Ok(json!({ "user": user })) })
            })
            .await
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&headers("Bearer abc")), Ok("abc"));
        assert_eq!(bearer_token(&headers("bearer  abc ")), Ok("abc"));
        assert_eq!(bearer_token(&headers("Token abc")), Ok("abc"));
        assert_eq!(bearer_token(&HeaderMap::new()), Err(AuthError::MissingCredential));
        assert_eq!(bearer_token(&headers("Bearer")), Err(AuthError::MalformedCredential));
        assert_eq!(bearer_token(&headers("Bearer   ")), Err(AuthError::MalformedCredential));
        assert_eq!(bearer_token(&headers("Basic abc")), Err(AuthError::MalformedCredential));
    }

    #[test]
    fn test_check_bypassed_ignores_credentials() {
        assert_eq!(gate().check(LOGIN, &headers("Bearer garbage")), Ok(None));
    }

    #[test]
    fn test_check_authenticates() {
        let gate = gate();
        let token = gate.codec().issue(42).unwrap();
        let identity = gate
            .check(CURRENT_USER, &headers(&format!("Bearer {token}")))
            .unwrap();
        assert_eq!(identity, Some(Identity::new(42)));
    }

    #[tokio::test]
    async fn test_bypassed_operation_reaches_handler_without_credential() {
        let chain = Chain::builder().interceptor(gate()).build();
        let hits = Arc::new(AtomicUsize::new(0));
        let mut ctx = CallContext::new(LOGIN, HeaderMap::new());

        let reply = call(&chain, &mut ctx, &hits).await.unwrap();
        assert_eq!(reply, json!({ "user": null }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(ctx.auth_state(), AuthState::Bypassed);
    }

    #[tokio::test]
    async fn test_rejections_never_reach_handler() {
        let chain = Chain::builder().interceptor(gate()).build();
        let hits = Arc::new(AtomicUsize::new(0));
        let foreign = TokenCodec::new("another-secret").issue(1).unwrap();

        for h in [
            HeaderMap::new(),
            headers("Bearer"),
            headers("Bearer not-a-jwt"),
            headers(&format!("Bearer {foreign}")),
        ] {
            let mut ctx = CallContext::new(CURRENT_USER, h);
            let err = call(&chain, &mut ctx, &hits).await.unwrap_err();
            assert_eq!(err.code, 401);
            assert_eq!(ctx.auth_state(), AuthState::Rejected);
            assert!(ctx.identity().is_none());
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_valid_credential_attaches_identity() {
        let gate = gate();
        let token = gate.codec().issue(7).unwrap();
        let chain = Chain::builder().interceptor(gate).build();
        let hits = Arc::new(AtomicUsize::new(0));
        let mut ctx = CallContext::new(CURRENT_USER, headers(&format!("Token {token}")));

        let reply = call(&chain, &mut ctx, &hits).await.unwrap();
        assert_eq!(reply, json!({ "user": 7 }));
        assert_eq!(ctx.auth_state(), AuthState::Authenticated);
    }
}
