//! The parts of a request the binder reads.

use bytes::Bytes;
use conduit_router::Params;
use http::{Method, Uri};

/// One request as seen by the binder: the query, the body and the path
/// variables captured by the router. Headers never reach a request message.
///
/// ```rust
/// use bytes::Bytes;
/// use conduit_extract::ExtractionContext;
/// use conduit_router::Params;
/// use http::{Method, Uri};
///
/// let mut params = Params::new();
/// params.push("username", "jake");
///
/// let ctx = ExtractionContext::new(
///     Method::GET,
///     Uri::from_static("/api/profiles/jake?x=1"),
///     Bytes::new(),
///     params,
/// );
///
/// assert_eq!(ctx.query_string(), Some("x=1"));
/// assert_eq!(ctx.path_params().get("username"), Some("jake"));
/// ```
#[derive(Debug, Clone)]
pub struct ExtractionContext {
    method: Method,
    uri: Uri,
    body: Bytes,
    path_params: Params,
}

impl ExtractionContext {
    /// Captures the request parts the binder needs.
    #[must_use]
    pub fn new(method: Method, uri: Uri, body: Bytes, path_params: Params) -> Self {
        Self {
            method,
            uri,
            body,
            path_params,
        }
    }

    /// The request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The raw query string, without the `?`.
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.uri.query()
    }

    /// The body as received.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Path variables, still percent-encoded.
    #[must_use]
    pub fn path_params(&self) -> &Params {
        &self.path_params
    }

    /// `true` when there is no body or it is only whitespace.
    #[must_use]
    pub fn is_body_empty(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }
}

/// Assembles an [`ExtractionContext`] piece by piece, starting from `GET /`.
#[derive(Debug, Default)]
pub struct ExtractionContextBuilder {
    method: Method,
    uri: Uri,
    body: Bytes,
    path_params: Params,
}

impl ExtractionContextBuilder {
    /// An empty `GET /`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the URI; only its query is bound.
    #[must_use]
    pub fn uri(mut self, uri: Uri) -> Self {
        self.uri = uri;
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Adds a path variable as the router would capture it.
    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.push(name, value);
        self
    }

    /// Finishes the context.
    #[must_use]
    pub fn build(self) -> ExtractionContext {
        ExtractionContext::new(self.method, self.uri, self.body, self.path_params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_every_part() {
        let ctx = ExtractionContextBuilder::new()
            .method(Method::POST)
            .uri(Uri::from_static("/api/articles?tag=rust"))
            .body(r#"{"article":{}}"#)
            .path_param("slug", "hello")
            .build();

        assert_eq!(ctx.method(), Method::POST);
        assert_eq!(ctx.query_string(), Some("tag=rust"));
        assert_eq!(ctx.body().as_ref(), br#"{"article":{}}"#);
        assert_eq!(ctx.path_params().get("slug"), Some("hello"));
        assert!(!ctx.is_body_empty());
    }

    #[test]
    fn test_blank_bodies_count_as_empty() {
        assert!(ExtractionContextBuilder::new().build().is_body_empty());
        assert!(ExtractionContextBuilder::new().body(" \r\n\t").build().is_body_empty());
        assert!(!ExtractionContextBuilder::new().body("{}").build().is_body_empty());
    }

    #[test]
    fn test_starts_as_bare_get() {
        let ctx = ExtractionContextBuilder::new().build();
        assert_eq!(ctx.method(), Method::GET);
        assert_eq!(ctx.query_string(), None);
        assert!(ctx.path_params().is_empty());
    }
}
