//! The ordered interceptor chain.

use crate::context::CallContext;
use crate::interceptor::{BoxFuture, Interceptor, Next, Terminal};
use crate::stages::{AuthGate, Logging, Recovery};
use conduit_core::CallResult;
use serde_json::Value;
use std::sync::Arc;

/// Shared handle to an interceptor.
pub type BoxedInterceptor = Arc<dyn Interceptor>;

/// The stages of the standard chain, outermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Stage {
    /// Converts panics into `INTERNAL` errors.
    Recovery = 1,
    /// Rejects calls without a valid credential unless bypassed.
    AuthGate = 2,
    /// Records the outcome of every call that passed the gate.
    Logging = 3,
}

impl Stage {
    /// Returns the stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Recovery => "recovery",
            Self::AuthGate => "auth_gate",
            Self::Logging => "logging",
        }
    }

    /// Returns every stage in execution order.
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::Recovery, Self::AuthGate, Self::Logging]
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An ordered list of interceptors, built once and shared by every call.
///
/// The first interceptor is the outermost: it sees the call first and the
/// outcome last.
///
/// # Example
///
/// ```
/// use conduit_middleware::{AuthGate, BypassSet, CallContext, Chain, TokenCodec};
/// use http::HeaderMap;
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let gate = AuthGate::new(TokenCodec::new("secret"), BypassSet::from_iter(["Ping"]));
/// let chain = Chain::standard(gate);
/// assert_eq!(chain.stage_names(), vec!["recovery", "auth_gate", "logging"]);
///
/// let mut ctx = CallContext::new("Ping", HeaderMap::new());
/// let reply = chain
///     .run(&mut ctx, |_| Box::pin(async { Ok(json!({"pong": true})) }))
///     .await;
/// assert_eq!(reply.unwrap()["pong"], true);
/// # });
/// ```
#[derive(Clone)]
pub struct Chain {
    interceptors: Vec<BoxedInterceptor>,
}

impl Chain {
    /// Creates an empty chain builder.
    #[must_use]
    pub fn builder() -> ChainBuilder {
        ChainBuilder::default()
    }

    /// Builds the standard chain: recovery, then `gate`, then logging.
    #[must_use]
    pub fn standard(gate: AuthGate) -> Self {
        Self::builder()
            .interceptor(Recovery::new())
            .interceptor(gate)
            .interceptor(Logging::new())
            .build()
    }

    /// Runs `handler` inside every interceptor.
    pub async fn run<'a, F>(&'a self, ctx: &mut CallContext, handler: F) -> CallResult<Value>
    where
        F: FnOnce(&mut CallContext) -> BoxFuture<'static, CallResult<Value>> + Send + 'a,
    {
        self.build_next(Box::new(handler)).run(ctx).await
    }

    fn build_next<'a>(&'a self, terminal: Terminal<'a>) -> Next<'a> {
        self.interceptors
            .iter()
            .rev()
            .fold(Next::terminal(terminal), |next, interceptor| {
                Next::stage(interceptor.as_ref(), next)
            })
    }

    /// Returns the interceptor names, outermost first.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    /// Returns the number of interceptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// Returns `true` if the chain calls the handler directly.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Builder for [`Chain`].
#[derive(Default)]
pub struct ChainBuilder {
    interceptors: Vec<BoxedInterceptor>,
}

impl ChainBuilder {
    /// Appends an interceptor inward of those already added.
    #[must_use]
    pub fn interceptor<I: Interceptor>(mut self, interceptor: I) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Builds the chain.
    #[must_use]
    pub fn build(self) -> Chain {
        Chain {
            interceptors: self.interceptors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_core::StandardError;
    use http::HeaderMap;
    use serde_json::json;
    use std::sync::Mutex;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Interceptor for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn intercept<'a>(
            &'a self,
            ctx: &'a mut CallContext,
            next: Next<'a>,
        ) -> BoxFuture<'a, CallResult<Value>> {
            Box::pin(async move {
                self.log.lock().unwrap().push(format!("{}:in", self.name));
                let outcome = next.run(ctx).await;
                let tag = if outcome.is_ok() { "ok" } else { "err" };
                self.log.lock().unwrap().push(format!("{}:out:{tag}", self.name));
                outcome
            })
        }
    }

    struct Deny;

    impl Interceptor for Deny {
        fn name(&self) -> &'static str {
            "deny"
        }

        fn intercept<'a>(
            &'a self,
            _ctx: &'a mut CallContext,
            _next: Next<'a>,
        ) -> BoxFuture<'a, CallResult<Value>> {
            Box::pin(async { Err(StandardError::forbidden("test", "denied")) })
        }
    }

    fn recorder(name: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Recorder {
        Recorder {
            name,
            log: Arc::clone(log),
        }
    }

    #[test]
    fn test_stage_order() {
        let names: Vec<_> = Stage::all().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["recovery", "auth_gate", "logging"]);
        assert_eq!(Stage::Recovery as u8, 1);
        assert_eq!(Stage::Logging.to_string(), "logging");
    }

    #[tokio::test]
    async fn test_interceptors_nest_outermost_first() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = Chain::builder()
            .interceptor(recorder("a", &log))
            .interceptor(recorder("b", &log))
            .build();

        let handler_log = Arc::clone(&log);
        let mut ctx = CallContext::new("op", HeaderMap::new());
        let outcome = chain
            .run(
                &mut ctx,
                move |_| {
                    handler_log.lock().unwrap().push("handler".into());
                    Box::pin(async { Ok(json!(1)) })
                },
            )
            .await;

        assert_eq!(outcome.unwrap(), json!(1));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["a:in", "b:in", "handler", "b:out:ok", "a:out:ok"]
        );
    }

    #[tokio::test]
    async fn test_short_circuit_skips_inner_stages_but_outer_observe() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = Chain::builder()
            .interceptor(recorder("outer", &log))
            .interceptor(Deny)
            .interceptor(recorder("inner", &log))
            .build();

        let handler_log = Arc::clone(&log);
        let mut ctx = CallContext::new("op", HeaderMap::new());
        let outcome = chain
            .run(
                &mut ctx,
                move |_| {
                    handler_log.lock().unwrap().push("handler".into());
                    Box::pin(async { Ok(Value::Null) })
                },
            )
            .await;

        assert_eq!(outcome.unwrap_err().code, 403);
        assert_eq!(*log.lock().unwrap(), vec!["outer:in", "outer:out:err"]);
    }

    #[tokio::test]
    async fn test_empty_chain_calls_handler() {
        let chain = Chain::builder().build();
        assert!(chain.is_empty());
        let mut ctx = CallContext::new("op", HeaderMap::new());
        let outcome = chain
            .run(&mut ctx, |_| Box::pin(async { Ok(Value::Null) }))
            .await;
        assert_eq!(outcome.unwrap(), Value::Null);
    }
}
