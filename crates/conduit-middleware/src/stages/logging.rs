//! Call logging and request metrics.

use crate::context::CallContext;
use crate::interceptor::{BoxFuture, Interceptor, Next};
use conduit_core::CallResult;
use serde_json::Value;
use std::time::{Duration, Instant};

/// What the logging stage observed about one call.
///
/// Stored on the [`CallContext`] as an extension once the call completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    /// The operation that ran.
    pub operation_id: String,
    /// 200 on success, otherwise the error's HTTP status.
    pub status: u16,
    /// Time spent inward of the logging stage.
    pub duration: Duration,
}

impl CallRecord {
    /// Returns `true` if the call succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status < 400
    }
}

/// Logs each call's outcome and records request metrics.
///
/// Sits inward of the auth gate, so rejected calls are not recorded here.
/// Nothing it does can fail the call.
#[derive(Debug, Clone, Copy, Default)]
pub struct Logging {
    _private: (),
}

impl Logging {
    /// Creates the logging stage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Interceptor for Logging {
    fn name(&self) -> &'static str {
        "logging"
    }

    fn intercept<'a>(
        &'a self,
        ctx: &'a mut CallContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, CallResult<Value>> {
        Box::pin(async move {
            let user_id = ctx.identity().map(|i| i.user_id);
            tracing::debug!(
                request_id = %ctx.request_id(),
                operation_id = %ctx.operation_id(),
                user_id = ?user_id,
                "call started"
            );

            let start = Instant::now();
            let outcome = next.run(ctx).await;
            let duration = start.elapsed();

            let status = match &outcome {
                Ok(_) => 200,
                Err(err) => err.status_code().as_u16(),
            };
            let duration_ms = duration.as_secs_f64() * 1000.0;

            match &outcome {
                Ok(_) => tracing::info!(
                    request_id = %ctx.request_id(),
                    operation_id = %ctx.operation_id(),
                    http.status_code = status,
                    duration_ms,
                    "call succeeded"
                ),
                Err(err) if status >= 500 => tracing::error!(
                    request_id = %ctx.request_id(),
                    operation_id = %ctx.operation_id(),
                    http.status_code = status,
                    duration_ms,
                    error = %err,
                    cause = ?err.cause(),
                    "call failed"
                ),
                Err(err) => tracing::warn!(
                    request_id = %ctx.request_id(),
                    operation_id = %ctx.operation_id(),
                    http.status_code = status,
                    duration_ms,
                    error = %err,
                    "call failed"
                ),
            }

            conduit_telemetry::record_call(ctx.operation_id(), status, duration);
            let record = CallRecord {
                operation_id: ctx.operation_id().to_string(),
                status,
                duration,
            };
            ctx.set_extension(record);

            outcome
        })
    }
}
