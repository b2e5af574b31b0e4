//! Turning call outcomes into HTTP responses.
//!
//! A success is the JSON form of the typed reply with status 200. A failure
//! is the [`StandardError`] body `{code, domain, reason, field_errors}` with
//! the error's status. Equal errors encode to identical bytes.

use crate::error::EncodeError;
use bytes::Bytes;
use conduit_core::{CallResult, StandardError};
use http::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, Response, StatusCode};
use serde_json::Value;
use std::sync::Arc;

/// Body sent when an error cannot itself be encoded.
pub const FALLBACK_ERROR_BODY: &str =
    r#"{"code":500,"domain":"server","reason":"failed to encode error","field_errors":{}}"#;

/// A wire format for replies and errors.
pub trait Codec: Send + Sync + 'static {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// The `Content-Type` the codec produces.
    fn content_type(&self) -> &'static str;

    /// Marshals a reply.
    fn marshal(&self, value: &Value) -> Result<Vec<u8>, EncodeError>;

    /// Marshals an error body, keeping its fields in declaration order.
    fn marshal_error(&self, err: &StandardError) -> Result<Vec<u8>, EncodeError>;
}

fn json_error(e: &serde_json::Error) -> EncodeError {
    EncodeError {
        codec: "json",
        message: e.to_string(),
    }
}

/// JSON, the default codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn marshal(&self, value: &Value) -> Result<Vec<u8>, EncodeError> {
        serde_json::to_vec(value).map_err(|e| json_error(&e))
    }

    fn marshal_error(&self, err: &StandardError) -> Result<Vec<u8>, EncodeError> {
        serde_json::to_vec(err).map_err(|e| json_error(&e))
    }
}

/// Encodes call outcomes with a codec chosen from the `Accept` header.
///
/// # Example
///
/// ```
/// use conduit_core::StandardError;
/// use conduit_server::Encoder;
/// use http::HeaderMap;
///
/// let encoder = Encoder::new();
/// let response = encoder.encode(&HeaderMap::new(), Err(StandardError::not_found("article", "not found")));
/// assert_eq!(response.status().as_u16(), 404);
/// assert_eq!(response.headers()["content-type"], "application/json");
/// ```
#[derive(Clone)]
pub struct Encoder {
    codecs: Vec<Arc<dyn Codec>>,
}

impl Encoder {
    /// Creates an encoder with only the JSON codec.
    #[must_use]
    pub fn new() -> Self {
        Self {
            codecs: vec![Arc::new(JsonCodec)],
        }
    }

    /// Registers an extra codec. The first registered codec stays the default.
    #[must_use]
    pub fn with_codec(mut self, codec: impl Codec) -> Self {
        self.codecs.push(Arc::new(codec));
        self
    }

    /// Picks the codec for an `Accept` header value.
    ///
    /// Media type parameters are ignored. Wildcards, unknown types and a
    /// missing header all select the default codec.
    #[must_use]
    pub fn negotiate(&self, accept: Option<&HeaderValue>) -> &dyn Codec {
        let default = self.codecs[0].as_ref();
        let Some(accept) = accept.and_then(|v| v.to_str().ok()) else {
            return default;
        };

        accept
            .split(',')
            .filter_map(|range| range.split(';').next())
            .map(str::trim)
            .find_map(|media| {
                self.codecs
                    .iter()
                    .find(|c| c.content_type().eq_ignore_ascii_case(media))
            })
            .map_or(default, |c| c.as_ref())
    }

    /// Encodes a call outcome for a request with the given headers.
    pub fn encode(&self, request_headers: &HeaderMap, outcome: CallResult<Value>) -> Response<Bytes> {
        let codec = self.negotiate(request_headers.get(ACCEPT));
        match outcome {
            Ok(reply) => self.encode_reply(codec, &reply),
            Err(err) => self.encode_error(codec, &err),
        }
    }

    /// Encodes a successful reply with status 200.
    pub fn encode_reply(&self, codec: &dyn Codec, reply: &Value) -> Response<Bytes> {
        match codec.marshal(reply) {
            Ok(body) => response(StatusCode::OK, codec.content_type(), Bytes::from(body)),
            Err(err) => {
                tracing::error!(error = %err, "failed to encode reply");
                self.encode_error(
                    codec,
                    &StandardError::internal("failed to encode reply"),
                )
            }
        }
    }

    /// Encodes an error with its status, or 500 if the code is out of range.
    pub fn encode_error(&self, codec: &dyn Codec, err: &StandardError) -> Response<Bytes> {
        let status = err.status_code();
        match codec.marshal_error(err) {
            Ok(body) => response(status, codec.content_type(), Bytes::from(body)),
            Err(encode_err) => {
                tracing::error!(
                    error = %encode_err,
                    domain = %err.domain,
                    reason = %err.reason,
                    "failed to encode error, sending fallback body"
                );
                response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "application/json",
                    Bytes::from_static(FALLBACK_ERROR_BODY.as_bytes()),
                )
            }
        }
    }

    /// Encodes an error with the default codec.
    pub fn error_response(&self, err: &StandardError) -> Response<Bytes> {
        self.encode_error(self.codecs[0].as_ref(), err)
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Encoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.codecs.iter().map(|c| c.name()).collect();
        f.debug_struct("Encoder").field("codecs", &names).finish()
    }
}

fn response(status: StatusCode, content_type: &'static str, body: Bytes) -> Response<Bytes> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    struct Broken;

    impl Codec for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn content_type(&self) -> &'static str {
            "application/x-broken"
        }

        fn marshal(&self, _value: &Value) -> Result<Vec<u8>, EncodeError> {
            Err(EncodeError {
                codec: "broken",
                message: "always fails".into(),
            })
        }

        fn marshal_error(&self, _err: &StandardError) -> Result<Vec<u8>, EncodeError> {
            self.marshal(&Value::Null)
        }
    }

    fn accept(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_success_is_200_json() {
        let encoder = Encoder::new();
        let response = encoder.encode(&HeaderMap::new(), Ok(serde_json::json!({"tags": ["rust"]})));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(response.body().as_ref(), br#"{"tags":["rust"]}"#);
    }

    #[test]
    fn test_error_body_shape() {
        let encoder = Encoder::new();
        let response = encoder.encode(
            &HeaderMap::new(),
            Err(StandardError::unauthenticated("user", "login failed")),
        );
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.body().as_ref(),
            br#"{"code":401,"domain":"user","reason":"login failed","field_errors":{}}"#
        );
    }

    #[test]
    fn test_error_body_keeps_declared_key_order() {
        let err = StandardError::conflict("email", "has already been taken")
            .with_field_error("username", "has already been taken")
            .with_field_error("email", "has already been taken");
        let response = Encoder::new().error_response(&err);
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            std::str::from_utf8(response.body()).unwrap(),
            concat!(
                r#"{"code":422,"domain":"email","reason":"has already been taken","#,
                r#""field_errors":{"email":["has already been taken"],"username":["has already been taken"]}}"#
            )
        );
    }

    #[test]
    fn test_out_of_range_code_is_500() {
        let encoder = Encoder::new();
        for code in [0, 42, 600, 1000, -401] {
            let response = encoder.error_response(&StandardError::new(code, "x", "y"));
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            let body: Value = serde_json::from_slice(response.body()).unwrap();
            assert_eq!(body["code"], code);
        }
    }

    #[test]
    fn test_failed_error_encoding_uses_fallback() {
        let encoder = Encoder::new().with_codec(Broken);
        let response = encoder.encode(
            &accept("application/x-broken"),
            Err(StandardError::not_found("article", "not found")),
        );
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body().as_ref(), FALLBACK_ERROR_BODY.as_bytes());
    }

    #[test]
    fn test_failed_reply_encoding_is_500() {
        let encoder = Encoder::new().with_codec(Broken);
        let response = encoder.encode(&accept("application/x-broken"), Ok(Value::Null));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_negotiation() {
        let encoder = Encoder::new().with_codec(Broken);
        assert_eq!(encoder.negotiate(None).name(), "json");
        assert_eq!(encoder.negotiate(accept("*/*").get(ACCEPT)).name(), "json");
        assert_eq!(encoder.negotiate(accept("text/html").get(ACCEPT)).name(), "json");
        assert_eq!(
            encoder
                .negotiate(accept("text/html, application/x-broken;q=0.9").get(ACCEPT))
                .name(),
            "broken"
        );
        assert_eq!(
            encoder.negotiate(accept("Application/JSON; charset=utf-8").get(ACCEPT)).name(),
            "json"
        );
    }

    #[test]
    fn test_fallback_body_is_a_standard_error() {
        let err: StandardError = serde_json::from_str(FALLBACK_ERROR_BODY).unwrap();
        assert_eq!(err, StandardError::internal("failed to encode error"));
    }

    proptest! {
        #[test]
        fn prop_equal_errors_encode_identically(
            code in any::<i32>(),
            domain in "[a-z]{1,12}",
            reason in ".{0,40}",
            fields in proptest::collection::vec(("[a-z_]{1,8}", ".{0,20}"), 0..6),
        ) {
            let build = || {
                fields.iter().fold(StandardError::new(code, domain.clone(), reason.clone()), |err, (f, m)| {
                    err.with_field_error(f.clone(), m.clone())
                })
            };
            let encoder = Encoder::new();
            let first = encoder.error_response(&build());
            let second = encoder.error_response(&build());
            prop_assert_eq!(first.status(), second.status());
            prop_assert_eq!(first.body(), second.body());
        }
    }
}
