//! The interceptor trait and the continuation passed between stages.
//!
//! An interceptor sees the call on the way in and the outcome on the way
//! out. It continues the call with [`Next::run`], or returns an error
//! without calling it to short-circuit: stages inward of it and the handler
//! then never run, while stages outward of it still observe the error.
//!
//! # Example
//!
//! ```
//! use conduit_middleware::{BoxFuture, CallContext, Interceptor, Next};
//! use conduit_core::CallResult;
//! use serde_json::Value;
//!
//! struct Audit;
//!
//! impl Interceptor for Audit {
//!     fn name(&self) -> &'static str {
//!         "audit"
//!     }
//!
//!     fn intercept<'a>(
//!         &'a self,
//!         ctx: &'a mut CallContext,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, CallResult<Value>> {
//!         Box::pin(async move {
//!             let outcome = next.run(ctx).await;
//!             eprintln!("{} -> ok={}", ctx.operation_id(), outcome.is_ok());
//!             outcome
//!         })
//!     }
//! }
//! ```

use crate::context::CallContext;
use conduit_core::CallResult;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The innermost step of a chain: invokes the handler with the bound request.
///
/// The handler's typed reply is already converted to a JSON value here, so
/// the chain itself stays untyped.
pub type Terminal<'a> =
    Box<dyn FnOnce(&mut CallContext) -> BoxFuture<'static, CallResult<Value>> + Send + 'a>;

/// A cross-cutting stage wrapped around every handler invocation.
///
/// Implementations are constructed once at startup and shared by all calls,
/// so they hold only read-only state.
pub trait Interceptor: Send + Sync + 'static {
    /// Short stage name used in logs.
    fn name(&self) -> &'static str;

    /// Runs this stage around the rest of the chain.
    fn intercept<'a>(
        &'a self,
        ctx: &'a mut CallContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, CallResult<Value>>;
}

/// The remainder of the chain after the current stage.
///
/// Consumed by [`Next::run`], so a stage can continue a call at most once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Stage {
        interceptor: &'a dyn Interceptor,
        next: Box<Next<'a>>,
    },
    Terminal(Terminal<'a>),
}

impl<'a> Next<'a> {
    pub(crate) fn stage(interceptor: &'a dyn Interceptor, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Stage {
                interceptor,
                next: Box::new(next),
            },
        }
    }

    pub(crate) fn terminal(terminal: Terminal<'a>) -> Self {
        Self {
            inner: NextInner::Terminal(terminal),
        }
    }

    /// Continues the call through the remaining stages and the handler.
    pub async fn run(self, ctx: &mut CallContext) -> CallResult<Value> {
        match self.inner {
            NextInner::Stage { interceptor, next } => interceptor.intercept(ctx, *next).await,
            NextInner::Terminal(terminal) => terminal(ctx).await,
        }
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            NextInner::Stage { interceptor, .. } => f
                .debug_struct("Next")
                .field("stage", &interceptor.name())
                .finish(),
            NextInner::Terminal(_) => f.debug_struct("Next").field("stage", &"handler").finish(),
        }
    }
}
