//! Panic containment.

use crate::context::CallContext;
use crate::interceptor::{BoxFuture, Interceptor, Next};
use conduit_core::{CallResult, StandardError};
use futures_util::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;

/// Converts a panic anywhere inward of it into an `INTERNAL` error.
///
/// The panic payload is logged and never sent to the client, and the call
/// still produces a response.
#[derive(Debug, Clone, Copy, Default)]
pub struct Recovery {
    _private: (),
}

impl Recovery {
    /// Creates the recovery stage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Interceptor for Recovery {
    fn name(&self) -> &'static str {
        "recovery"
    }

    fn intercept<'a>(
        &'a self,
        ctx: &'a mut CallContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, CallResult<Value>> {
        Box::pin(async move {
            match AssertUnwindSafe(next.run(ctx)).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(payload) => {
                    tracing::error!(
                        request_id = %ctx.request_id(),
                        operation_id = %ctx.operation_id(),
                        panic = panic_message(payload.as_ref()),
                        "recovered from panic"
                    );
                    Err(StandardError::internal("unexpected fault"))
                }
            }
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Chain;
    use http::HeaderMap;

    async fn explode() -> CallResult<Value> {
        panic!("boom")
    }

    #[tokio::test]
    async fn test_panic_becomes_internal_error() {
        let chain = Chain::builder().interceptor(Recovery::new()).build();
        let mut ctx = CallContext::new("op", HeaderMap::new());

        let outcome = chain
            .run(&mut ctx, |_| Box::pin(explode()))
            .await;

        let err = outcome.unwrap_err();
        assert_eq!(err.code, 500);
        assert_eq!(err.domain, "server");
        assert!(!err.reason.contains("boom"));
    }

    #[tokio::test]
    async fn test_errors_pass_through_unchanged() {
        let chain = Chain::builder().interceptor(Recovery::new()).build();
        let mut ctx = CallContext::new("op", HeaderMap::new());
        let expected = StandardError::not_found("article", "article not found");

        let returned = expected.clone();
        let outcome = chain
            .run(&mut ctx, move |_| Box::pin(async move { Err(returned) }))
            .await;

        assert_eq!(outcome.unwrap_err(), expected);
    }

    #[test]
    fn test_panic_message() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let borrowed: Box<dyn Any + Send> = Box::new("static");
        let other: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(borrowed.as_ref()), "static");
        assert_eq!(panic_message(other.as_ref()), "non-string panic payload");
    }
}
