//! Cross-origin resource sharing at the transport boundary.

use bytes::Bytes;
use http::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN,
};
use http::{HeaderMap, Method, Response, StatusCode};

const ALLOW_ORIGIN: &str = "*";
const ALLOW_METHODS: &str = "GET, POST, PUT, HEAD, OPTIONS, DELETE";
const ALLOW_HEADERS: &str = "X-Requested-With, Content-Type, Authorization";

/// The CORS policy: any origin, the service's methods and headers.
///
/// # Example
///
/// ```
/// use conduit_server::CorsPolicy;
/// use http::{HeaderMap, Method};
///
/// let cors = CorsPolicy::permissive();
/// let preflight = cors.preflight(&Method::OPTIONS).unwrap();
/// assert_eq!(preflight.status().as_u16(), 204);
/// assert!(cors.preflight(&Method::GET).is_none());
/// ```
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allow_origin: HeaderValue,
    allow_methods: HeaderValue,
    allow_headers: HeaderValue,
}

impl CorsPolicy {
    /// Allows every origin.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            allow_origin: HeaderValue::from_static(ALLOW_ORIGIN),
            allow_methods: HeaderValue::from_static(ALLOW_METHODS),
            allow_headers: HeaderValue::from_static(ALLOW_HEADERS),
        }
    }

    /// Answers an `OPTIONS` preflight with 204. Other methods pass.
    #[must_use]
    pub fn preflight(&self, method: &Method) -> Option<Response<Bytes>> {
        if method != Method::OPTIONS {
            return None;
        }
        let mut response = Response::new(Bytes::new());
        *response.status_mut() = StatusCode::NO_CONTENT;
        self.write_headers(response.headers_mut());
        Some(response)
    }

    /// Adds the CORS headers to a response for a cross-origin request.
    ///
    /// Requests without an `Origin` header are left alone.
    pub fn apply(&self, request_headers: &HeaderMap, response: &mut Response<Bytes>) {
        if request_headers.contains_key(ORIGIN) {
            self.write_headers(response.headers_mut());
        }
    }

    fn write_headers(&self, headers: &mut HeaderMap) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, self.allow_methods.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.clone());
    }
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self::permissive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preflight_headers() {
        let response = CorsPolicy::permissive().preflight(&Method::OPTIONS).unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.body().is_empty());
        let headers = response.headers();
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], ALLOW_METHODS);
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_HEADERS], ALLOW_HEADERS);
    }

    #[test]
    fn test_apply_requires_origin() {
        let cors = CorsPolicy::permissive();

        let mut response = Response::new(Bytes::new());
        cors.apply(&HeaderMap::new(), &mut response);
        assert!(!response.headers().contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));

        let mut request_headers = HeaderMap::new();
        request_headers.insert(ORIGIN, HeaderValue::from_static("https://demo.realworld.io"));
        cors.apply(&request_headers, &mut response);
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
