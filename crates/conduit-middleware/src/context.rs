//! Per-call state carried through the interceptor chain.

use conduit_core::{Identity, RequestContext, RequestId};
use http::HeaderMap;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Where a call stands with respect to authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// The auth gate has not run yet.
    Unchecked,
    /// The operation is exempt from authentication.
    Bypassed,
    /// A valid credential was presented.
    Authenticated,
    /// The credential was missing or invalid; the call was stopped.
    Rejected,
}

/// Mutable context owned by one call while it passes through the chain.
///
/// Stages read the operation id and headers, and record what they learn:
/// the auth gate attaches the [`Identity`], the logging stage stores a
/// [`CallRecord`](crate::CallRecord) as an extension. The handler only ever
/// sees the immutable [`RequestContext`] built by
/// [`to_request_context`](Self::to_request_context).
///
/// # Example
///
/// ```
/// use conduit_middleware::{AuthState, CallContext};
/// use conduit_core::Identity;
/// use http::HeaderMap;
///
/// let mut ctx = CallContext::new("/realworld.v1.RealWorld/GetCurrentUser", HeaderMap::new());
/// assert_eq!(ctx.auth_state(), AuthState::Unchecked);
///
/// ctx.authenticate(Identity::new(7));
/// assert_eq!(ctx.to_request_context().identity().unwrap().user_id, 7);
/// ```
pub struct CallContext {
    request_id: RequestId,
    operation_id: String,
    headers: HeaderMap,
    identity: Option<Identity>,
    auth_state: AuthState,
    started_at: Instant,
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl CallContext {
    /// Creates a context for a call to `operation_id`.
    #[must_use]
    pub fn new(operation_id: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            request_id: RequestId::new(),
            operation_id: operation_id.into(),
            headers,
            identity: None,
            auth_state: AuthState::Unchecked,
            started_at: Instant::now(),
            extensions: HashMap::new(),
        }
    }

    /// Replaces the generated request ID.
    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the operation being called.
    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// Returns the inbound request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the authenticated caller, if any.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Returns the authentication state.
    #[must_use]
    pub fn auth_state(&self) -> AuthState {
        self.auth_state
    }

    /// Attaches the caller identity and marks the call authenticated.
    pub fn authenticate(&mut self, identity: Identity) {
        self.identity = Some(identity);
        self.auth_state = AuthState::Authenticated;
    }

    pub(crate) fn set_auth_state(&mut self, state: AuthState) {
        self.auth_state = state;
    }

    /// Time since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Stores a typed extension value, replacing any previous one.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Returns a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Builds the context handed to the handler.
    #[must_use]
    pub fn to_request_context(&self) -> RequestContext {
        let ctx = RequestContext::with_request_id(self.request_id)
            .with_operation_id(self.operation_id.clone());
        match &self.identity {
            Some(identity) => ctx.with_identity(*identity),
            None => ctx,
        }
    }
}

impl std::fmt::Debug for CallContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallContext")
            .field("request_id", &self.request_id)
            .field("operation_id", &self.operation_id)
            .field("identity", &self.identity)
            .field("auth_state", &self.auth_state)
            .field("extensions", &self.extensions.len())
            .finish_non_exhaustive()
    }
}
