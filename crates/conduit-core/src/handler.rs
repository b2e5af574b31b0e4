//! Handler trait for business logic.
//!
//! Any `Fn(RequestContext, Req) -> impl Future<Output = CallResult<Res>>`
//! is a [`Handler`], so plain closures over shared state register directly.

use crate::{CallResult, RequestContext};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::future::Future;

/// A typed business handler.
///
/// # Example
///
/// ```
/// use conduit_core::{CallResult, Handler, RequestContext};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Deserialize)]
/// struct Greet {
///     name: String,
/// }
///
/// #[derive(Serialize)]
/// struct Greeting {
///     text: String,
/// }
///
/// async fn greet(_ctx: RequestContext, req: Greet) -> CallResult<Greeting> {
///     Ok(Greeting { text: format!("hello {}", req.name) })
/// }
///
/// fn assert_handler<H: Handler<Greet, Greeting>>(_h: H) {}
/// assert_handler(greet);
/// ```
pub trait Handler<Req, Res>: Send + Sync + 'static
where
    Req: DeserializeOwned + Send + 'static,
    Res: Serialize + Send + 'static,
{
    /// Handles one call.
    fn handle(
        &self,
        ctx: RequestContext,
        request: Req,
    ) -> impl Future<Output = CallResult<Res>> + Send;
}

impl<F, Fut, Req, Res> Handler<Req, Res> for F
where
    F: Fn(RequestContext, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = CallResult<Res>> + Send,
    Req: DeserializeOwned + Send + 'static,
    Res: Serialize + Send + 'static,
{
    fn handle(
        &self,
        ctx: RequestContext,
        request: Req,
    ) -> impl Future<Output = CallResult<Res>> + Send {
        (self)(ctx, request)
    }
}

/// Request or response type for operations that carry no fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Empty {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StandardError;

    #[derive(Debug, Deserialize)]
    struct TestRequest {
        name: String,
    }

    #[derive(Debug, PartialEq, Serialize)]
    struct TestResponse {
        greeting: String,
    }

    #[tokio::test]
    async fn test_closure_is_handler() {
        let handler = |_ctx: RequestContext, req: TestRequest| async move {
            Ok::<_, StandardError>(TestResponse {
                greeting: format!("Hello, {}!", req.name),
            })
        };

        let response = handler
            .handle(
                RequestContext::new(),
                TestRequest {
                    name: "World".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(response.greeting, "Hello, World!");
    }

    #[tokio::test]
    async fn test_handler_error() {
        async fn failing(_ctx: RequestContext, _req: Empty) -> CallResult<Empty> {
            Err(StandardError::internal("Something went wrong"))
        }

        let err = failing.handle(RequestContext::new(), Empty {}).await.unwrap_err();
        assert_eq!(err.code, 500);
    }

    #[test]
    fn test_empty_accepts_any_object() {
        let empty: Empty = serde_json::from_str(r#"{"ignored":1}"#).unwrap();
        assert_eq!(empty, Empty {});
        assert_eq!(serde_json::to_string(&Empty {}).unwrap(), "{}");
    }
}
