//! End-to-end dispatch through registry, binder, chain and encoder.

use bytes::Bytes;
use conduit_core::{BinderRule, CallResult, Empty, Operation, RequestContext, StandardError};
use conduit_middleware::{AuthGate, BypassSet, Chain, TokenCodec};
use conduit_server::{Dispatcher, OperationRegistry};
use http::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const SECRET: &str = "dispatch-test-secret";

const OPEN: Operation = Operation::new("/svc/Open", Method::GET, "/open", BinderRule::QueryOnly);
const WHOAMI: Operation = Operation::new("/svc/WhoAmI", Method::GET, "/me", BinderRule::QueryOnly);
const EDIT: Operation = Operation::new(
    "/svc/Edit",
    Method::PUT,
    "/items/{slug}",
    BinderRule::BodyQueryAndPath,
);
const EXPLODE: Operation = Operation::new("/svc/Explode", Method::GET, "/explode", BinderRule::QueryOnly);

#[derive(Debug, Deserialize, Serialize)]
struct Edit {
    slug: String,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Serialize)]
struct WhoAmI {
    user_id: u64,
}

async fn explode(_ctx: RequestContext, _req: Empty) -> CallResult<Empty> {
    panic!("handler exploded")
}

struct Harness {
    dispatcher: Dispatcher,
    codec: TokenCodec,
    whoami_calls: Arc<AtomicUsize>,
}

fn harness() -> Harness {
    let whoami_calls = Arc::new(AtomicUsize::new(0));
    let mut registry = OperationRegistry::new();

    registry
        .register(OPEN, |_ctx: RequestContext, _req: Empty| async {
            Ok::<_, StandardError>(json!({ "open": true }))
        })
        .unwrap();

    let calls = Arc::clone(&whoami_calls);
    registry
        .register(WHOAMI, move |ctx: RequestContext, _req: Empty| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                let identity = ctx.require_identity()?;
                Ok::<_, StandardError>(WhoAmI {
                    user_id: identity.user_id,
                })
            }
        })
        .unwrap();

    registry
        .register(EDIT, |_ctx: RequestContext, req: Edit| async move {
            Ok::<_, StandardError>(req)
        })
        .unwrap();

    registry.register(EXPLODE, explode).unwrap();

    let bypass = BypassSet::from_iter([OPEN.id, EXPLODE.id]);
    let chain = Chain::standard(AuthGate::new(TokenCodec::new(SECRET), bypass));

    Harness {
        dispatcher: Dispatcher::new(registry, chain),
        codec: TokenCodec::new(SECRET),
        whoami_calls,
    }
}

fn request(method: Method, uri: &str, auth: Option<&str>, body: &'static str) -> Request<Bytes> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    builder.body(Bytes::from_static(body.as_bytes())).unwrap()
}

fn json_body(response: &Response<Bytes>) -> Value {
    serde_json::from_slice(response.body()).unwrap()
}

#[tokio::test]
async fn bypassed_operation_needs_no_credential() {
    let h = harness();
    let response = h.dispatcher.dispatch(request(Method::GET, "/open", None, "")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(&response), json!({ "open": true }));
}

#[tokio::test]
async fn bad_credentials_never_reach_the_handler() {
    let h = harness();
    let other = TokenCodec::new("some-other-secret").issue(1).unwrap();
    let bad_signature = format!("Bearer {other}");

    for auth in [None, Some("Basic dXNlcjpwYXNz"), Some("Bearer"), Some("Bearer not.a.jwt"), Some(bad_signature.as_str())] {
        let response = h.dispatcher.dispatch(request(Method::GET, "/me", auth, "")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "auth header {auth:?}");
        let body = json_body(&response);
        assert_eq!(body["code"], 401);
        assert_eq!(body["domain"], "auth");
    }
    assert_eq!(h.whoami_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn valid_credential_attaches_identity() {
    let h = harness();
    let token = h.codec.issue(42).unwrap();
    let auth = format!("Token {token}");
    let response = h
        .dispatcher
        .dispatch(request(Method::GET, "/me", Some(&auth), ""))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(&response), json!({ "user_id": 42 }));
    assert_eq!(h.whoami_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn path_variable_beats_body_and_query() {
    let h = harness();
    let auth = format!("Bearer {}", h.codec.issue(1).unwrap());
    let response = h
        .dispatcher
        .dispatch(request(
            Method::PUT,
            "/items/foo?slug=baz",
            Some(&auth),
            r#"{"slug":"bar","title":"kept"}"#,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(&response), json!({ "slug": "foo", "title": "kept" }));
}

#[tokio::test]
async fn unresolved_route_is_404() {
    let h = harness();
    let response = h.dispatcher.dispatch(request(Method::GET, "/nowhere", None, "")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(&response)["domain"], "route");

    let wrong_method = h.dispatcher.dispatch(request(Method::POST, "/open", None, "")).await;
    assert_eq!(wrong_method.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn binder_failure_is_422() {
    let h = harness();
    let auth = format!("Bearer {}", h.codec.issue(1).unwrap());
    let response = h
        .dispatcher
        .dispatch(request(Method::PUT, "/items/foo", Some(&auth), "{broken"))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(&response);
    assert_eq!(body["code"], 422);
    assert_eq!(body["domain"], "body");
}

#[tokio::test]
async fn panic_becomes_500_and_service_keeps_working() {
    let h = harness();
    let response = h.dispatcher.dispatch(request(Method::GET, "/explode", None, "")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let err: StandardError = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(err.code, 500);
    assert_eq!(err.domain, "server");
    assert!(!String::from_utf8_lossy(response.body()).contains("handler exploded"));

    let after = h.dispatcher.dispatch(request(Method::GET, "/open", None, "")).await;
    assert_eq!(after.status(), StatusCode::OK);
}

#[tokio::test]
async fn equal_errors_encode_byte_identically() {
    let h = harness();
    let first = h.dispatcher.dispatch(request(Method::GET, "/me", None, "")).await;
    let second = h.dispatcher.dispatch(request(Method::GET, "/me", None, "")).await;
    assert_eq!(first.body(), second.body());
    assert_eq!(first.headers()["content-type"], "application/json");
}

#[tokio::test]
async fn concurrent_calls_are_independent() {
    let h = Arc::new(harness());
    let mut tasks = Vec::new();
    for user_id in 1..=24u64 {
        let h = Arc::clone(&h);
        tasks.push(tokio::spawn(async move {
            let auth = format!("Bearer {}", h.codec.issue(user_id).unwrap());
            let response = h
                .dispatcher
                .dispatch(request(Method::GET, "/me", Some(&auth), ""))
                .await;
            (user_id, json_body(&response))
        }));
    }
    for task in tasks {
        let (user_id, body) = task.await.unwrap();
        assert_eq!(body["user_id"], user_id);
    }
}
