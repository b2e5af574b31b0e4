//! The operation registry.
//!
//! Pairs each [`Operation`] with its handler, erasing the handler's request
//! and reply types behind a binder closure. Built once at startup and read
//! concurrently afterwards without locking.

use crate::error::RegistryError;
use conduit_core::{CallResult, Handler, Operation, RequestContext, StandardError};
use conduit_extract::ExtractionContext;
use conduit_middleware::BoxFuture;
use conduit_router::{Params, Router};
use http::Method;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A bound request waiting for its context: calling it runs the handler.
pub type PreparedCall =
    Box<dyn FnOnce(RequestContext) -> BoxFuture<'static, CallResult<Value>> + Send>;

type ErasedBinder = Arc<dyn Fn(&ExtractionContext) -> CallResult<PreparedCall> + Send + Sync>;

/// One registered operation.
pub struct RegisteredOperation {
    operation: Operation,
    binder: ErasedBinder,
}

impl RegisteredOperation {
    /// Returns the static operation description.
    #[must_use]
    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Binds the request into the handler's request type.
    ///
    /// Fails with `MALFORMED_REQUEST` without touching the handler.
    pub fn bind(&self, ctx: &ExtractionContext) -> CallResult<PreparedCall> {
        (self.binder)(ctx)
    }
}

impl std::fmt::Debug for RegisteredOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredOperation")
            .field("operation", &self.operation)
            .finish_non_exhaustive()
    }
}

/// Maps `(method, path)` to operations and operations to handlers.
///
/// # Example
///
/// ```
/// use conduit_core::{BinderRule, CallResult, Empty, Operation, RequestContext};
/// use conduit_server::OperationRegistry;
/// use http::Method;
///
/// const PING: Operation = Operation::new("/svc/Ping", Method::GET, "/ping", BinderRule::QueryOnly);
///
/// async fn ping(_ctx: RequestContext, _req: Empty) -> CallResult<&'static str> {
///     Ok("pong")
/// }
///
/// let mut registry = OperationRegistry::new();
/// registry.register(PING, ping).unwrap();
///
/// let (entry, _params) = registry.resolve(&Method::GET, "/ping").unwrap();
/// assert_eq!(entry.operation().id, "/svc/Ping");
/// assert!(registry.register(PING, ping).is_err());
/// ```
#[derive(Default)]
pub struct OperationRegistry {
    router: Router,
    operations: HashMap<&'static str, RegisteredOperation>,
}

impl OperationRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `operation`.
    ///
    /// Rejects a duplicate id, and a route that would be ambiguous with one
    /// already registered.
    pub fn register<Req, Res, H>(&mut self, operation: Operation, handler: H) -> Result<(), RegistryError>
    where
        Req: DeserializeOwned + Send + 'static,
        Res: Serialize + Send + 'static,
        H: Handler<Req, Res>,
    {
        if self.operations.contains_key(operation.id) {
            return Err(RegistryError::DuplicateOperation(operation.id.to_string()));
        }
        self.router
            .insert(&operation.method, operation.path_template, operation.id)?;

        let handler = Arc::new(handler);
        let rule = operation.binder_rule;
        let binder: ErasedBinder = Arc::new(move |ctx: &ExtractionContext| {
            let request: Req = conduit_extract::bind(rule, ctx)?;
            let handler = Arc::clone(&handler);
            let call: PreparedCall = Box::new(move |rc: RequestContext| {
                Box::pin(async move {
                    let reply = handler.handle(rc, request).await?;
                    serde_json::to_value(reply)
                        .map_err(|e| StandardError::internal_with_cause("failed to encode reply", e))
                })
            });
            Ok(call)
        });

        tracing::debug!(operation = %operation, "registered operation");
        self.operations
            .insert(operation.id, RegisteredOperation { operation, binder });
        Ok(())
    }

    /// Finds the operation for a method and concrete path.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> Option<(&RegisteredOperation, Params)> {
        let found = self.router.match_route(method, path)?;
        let entry = self.operations.get(found.operation_id)?;
        Some((entry, found.params))
    }

    /// Looks an operation up by id.
    #[must_use]
    pub fn get(&self, operation_id: &str) -> Option<&RegisteredOperation> {
        self.operations.get(operation_id)
    }

    /// Returns every registered operation, in no particular order.
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.operations.values().map(RegisteredOperation::operation)
    }

    /// Returns the number of operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl std::fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationRegistry")
            .field("operations", &self.operations.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_core::{BinderRule, Empty};
    use conduit_extract::ExtractionContextBuilder;
    use conduit_router::RouteError;
    use serde::Deserialize;

    const GET_ARTICLE: Operation = Operation::new(
        "/realworld.v1.RealWorld/GetArticle",
        Method::GET,
        "/api/article/{slug}",
        BinderRule::QueryAndPath,
    );

    #[derive(Debug, Deserialize)]
    struct GetArticle {
        slug: String,
    }

    async fn get_article(_ctx: RequestContext, req: GetArticle) -> CallResult<Value> {
        Ok(serde_json::json!({ "slug": req.slug }))
    }

    async fn noop(_ctx: RequestContext, _req: Empty) -> CallResult<Empty> {
        Ok(Empty {})
    }

    #[tokio::test]
    async fn test_register_resolve_bind_invoke() {
        let mut registry = OperationRegistry::new();
        registry.register(GET_ARTICLE, get_article).unwrap();
        assert_eq!(registry.len(), 1);

        let (entry, params) = registry.resolve(&Method::GET, "/api/article/hello").unwrap();
        assert_eq!(entry.operation().name(), "GetArticle");

        let ctx = ExtractionContext::new(
            Method::GET,
            "/api/article/hello".parse().unwrap(),
            bytes::Bytes::new(),
            params,
        );
        let call = entry.bind(&ctx).unwrap();
        let reply = call(RequestContext::new()).await.unwrap();
        assert_eq!(reply, serde_json::json!({ "slug": "hello" }));
    }

    #[test]
    fn test_bind_failure_is_malformed_request() {
        let mut registry = OperationRegistry::new();
        registry.register(GET_ARTICLE, get_article).unwrap();

        let ctx = ExtractionContextBuilder::new().build();
        let err = registry.get(GET_ARTICLE.id).unwrap().bind(&ctx).err().unwrap();
        assert_eq!(err.code, 422);
        assert!(err.field_errors.get("slug").is_some());
    }

    #[test]
    fn test_unknown_route() {
        let mut registry = OperationRegistry::new();
        registry.register(GET_ARTICLE, get_article).unwrap();
        assert!(registry.resolve(&Method::GET, "/api/articles").is_none());
        assert!(registry.resolve(&Method::DELETE, "/api/article/hello").is_none());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut registry = OperationRegistry::new();
        registry.register(GET_ARTICLE, get_article).unwrap();
        let moved = Operation::new(GET_ARTICLE.id, Method::GET, "/elsewhere", BinderRule::QueryOnly);
        assert_eq!(
            registry.register(moved, noop),
            Err(RegistryError::DuplicateOperation(GET_ARTICLE.id.to_string()))
        );
    }

    #[test]
    fn test_ambiguous_route_rejected() {
        let mut registry = OperationRegistry::new();
        registry.register(GET_ARTICLE, get_article).unwrap();
        let clash = Operation::new("/svc/Other", Method::GET, "/api/article/{id}", BinderRule::QueryAndPath);
        assert!(matches!(
            registry.register(clash, noop),
            Err(RegistryError::Route(RouteError::ParamConflict { .. }))
        ));
    }
}
