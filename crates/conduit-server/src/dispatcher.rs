//! Resolving, binding and running one call.

use crate::encoder::Encoder;
use crate::registry::OperationRegistry;
use bytes::Bytes;
use conduit_core::StandardError;
use conduit_extract::ExtractionContext;
use conduit_middleware::{CallContext, Chain};
use http::{Request, Response};
use std::sync::Arc;

/// Runs calls through the registry, the binder and the interceptor chain.
///
/// Cloning is cheap; every clone shares the registry and chain.
///
/// # Flow
///
/// 1. resolve the operation by method and path, else `NOT_FOUND`;
/// 2. bind the request, else `MALFORMED_REQUEST`;
/// 3. run the chain around the handler;
/// 4. encode the outcome.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<OperationRegistry>,
    chain: Arc<Chain>,
    encoder: Encoder,
}

impl Dispatcher {
    /// Creates a dispatcher with the default encoder.
    #[must_use]
    pub fn new(registry: OperationRegistry, chain: Chain) -> Self {
        Self {
            registry: Arc::new(registry),
            chain: Arc::new(chain),
            encoder: Encoder::new(),
        }
    }

    /// Replaces the encoder.
    #[must_use]
    pub fn with_encoder(mut self, encoder: Encoder) -> Self {
        self.encoder = encoder;
        self
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    /// Returns the encoder.
    #[must_use]
    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    /// Handles one request from receipt to response.
    pub async fn dispatch(&self, request: Request<Bytes>) -> Response<Bytes> {
        let (parts, body) = request.into_parts();

        let Some((entry, params)) = self.registry.resolve(&parts.method, parts.uri.path()) else {
            tracing::debug!(
                http.method = %parts.method,
                http.path = %parts.uri.path(),
                "no operation matches"
            );
            let err = StandardError::not_found(
                "route",
                format!("no operation matches {} {}", parts.method, parts.uri.path()),
            );
            return self.encoder.encode(&parts.headers, Err(err));
        };
        let operation = entry.operation();

        let extraction = ExtractionContext::new(parts.method, parts.uri, body, params);
        let prepared = match entry.bind(&extraction) {
            Ok(prepared) => prepared,
            Err(err) => {
                tracing::debug!(
                    operation_id = operation.id,
                    domain = %err.domain,
                    reason = %err.reason,
                    "request binding failed"
                );
                return self.encoder.encode(&parts.headers, Err(err));
            }
        };

        let mut ctx = CallContext::new(operation.id, parts.headers);
        let outcome = self
            .chain
            .run(&mut ctx, move |call| prepared(call.to_request_context()))
            .await;

        self.encoder.encode(ctx.headers(), outcome)
    }
}
