//! The HTTP/1.1 transport.
//!
//! [`HttpService`] is the whole request path minus sockets: CORS, the health
//! route, the dispatcher and the optional request deadline. [`Server`] puts
//! it behind a hyper accept loop with graceful shutdown.
//!
//! ```rust,ignore
//! use conduit_server::{Server, ServerConfig};
//!
//! let server = Server::new(ServerConfig::default(), dispatcher);
//! server.run().await?;
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use conduit_core::StandardError;
use conduit_telemetry::InFlightGuard;
use http::{Request, Response};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};

use crate::config::ServerConfig;
use crate::cors::CorsPolicy;
use crate::dispatcher::Dispatcher;
use crate::error::ServerError;
use crate::health::HealthCheck;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Code reported when the request deadline passes.
pub const TIMEOUT_CODE: i32 = 504;

/// Code reported when a request body is over the configured cap.
pub const PAYLOAD_TOO_LARGE_CODE: i32 = 413;

/// Everything between a buffered request and its response.
#[derive(Debug, Clone)]
pub struct HttpService {
    dispatcher: Dispatcher,
    health: HealthCheck,
    cors: Option<CorsPolicy>,
    request_timeout: Option<std::time::Duration>,
    max_body_bytes: usize,
}

impl HttpService {
    /// Wraps a dispatcher using the transport settings in `config`.
    #[must_use]
    pub fn new(dispatcher: Dispatcher, config: &ServerConfig) -> Self {
        Self {
            dispatcher,
            health: HealthCheck::default(),
            cors: config.cors_enabled().then(CorsPolicy::permissive),
            request_timeout: config.request_timeout(),
            max_body_bytes: config.max_body_bytes(),
        }
    }

    /// Returns the dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Serves one buffered request.
    pub async fn handle(&self, request: Request<Bytes>) -> Response<Bytes> {
        if let Some(preflight) = self.cors.as_ref().and_then(|c| c.preflight(request.method())) {
            return preflight;
        }

        let request_headers = self.cors.as_ref().map(|_| request.headers().clone());
        let mut response = if self.health.matches(request.method(), request.uri().path()) {
            self.health.respond()
        } else {
            self.dispatch_with_deadline(request).await
        };

        if let (Some(cors), Some(headers)) = (&self.cors, &request_headers) {
            cors.apply(headers, &mut response);
        }
        response
    }

    async fn dispatch_with_deadline(&self, request: Request<Bytes>) -> Response<Bytes> {
        let Some(limit) = self.request_timeout else {
            return self.dispatcher.dispatch(request).await;
        };

        let method = request.method().clone();
        let path = request.uri().path().to_string();
        match tokio::time::timeout(limit, self.dispatcher.dispatch(request)).await {
            Ok(response) => response,
            Err(_) => {
                tracing::warn!(
                    http.method = %method,
                    http.path = %path,
                    timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                    "request deadline exceeded"
                );
                self.dispatcher
                    .encoder()
                    .error_response(&StandardError::new(TIMEOUT_CODE, "server", "request timed out"))
            }
        }
    }

    /// Buffers a streamed body up to the configured cap, then serves it.
    ///
    /// Reading stops as soon as the cap is passed; the request is answered
    /// with 413 and never reaches the dispatcher.
    pub async fn handle_streaming<B>(&self, request: Request<B>) -> Response<Bytes>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let (parts, body) = request.into_parts();
        let err = match Limited::new(body, self.max_body_bytes).collect().await {
            Ok(collected) => {
                return self
                    .handle(Request::from_parts(parts, collected.to_bytes()))
                    .await;
            }
            Err(err) => err,
        };

        let failure = if err.downcast_ref::<LengthLimitError>().is_some() {
            tracing::warn!(
                http.method = %parts.method,
                http.path = %parts.uri.path(),
                limit = self.max_body_bytes,
                "request body over limit"
            );
            StandardError::new(
                PAYLOAD_TOO_LARGE_CODE,
                "body",
                format!("request body exceeds {} bytes", self.max_body_bytes),
            )
        } else {
            tracing::warn!(error = %err, "failed to read request body");
            StandardError::malformed_request("body", format!("failed to read request body: {err}"))
        };
        self.dispatcher.encoder().error_response(&failure)
    }
}

/// The Conduit HTTP server.
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    service: Arc<HttpService>,
}

impl Server {
    /// Creates a server for `dispatcher`.
    #[must_use]
    pub fn new(config: ServerConfig, dispatcher: Dispatcher) -> Self {
        let service = Arc::new(HttpService::new(dispatcher, &config));
        Self { config, service }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the in-process request path.
    #[must_use]
    pub fn service(&self) -> &HttpService {
        &self.service
    }

    /// Serves until SIGINT or SIGTERM.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Binds the configured address and serves until `shutdown` fires.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self.config.socket_addr().map_err(|e| {
            ServerError::Bind(format!("invalid address '{}': {e}", self.config.http_addr()))
        })?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(format!("{addr}: {e}")))?;
        self.serve(listener, shutdown).await
    }

    /// Serves connections from an already bound listener until `shutdown` fires.
    ///
    /// After shutdown the listener is closed, open connections finish their
    /// current request, and the call returns once they are gone or the
    /// drain period ends.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let local = listener.local_addr()?;
        tracing::info!(http.addr = %local, "conduit listening");

        let tracker = ConnectionTracker::new();
        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote)) => {
                        let token = tracker.acquire();
                        let service = Arc::clone(&self.service);
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            serve_connection(service, stream, remote, shutdown).await;
                            drop(token);
                        });
                    }
                    Err(err) => tracing::error!(error = %err, "accept failed"),
                },
                () = shutdown.recv() => break,
            }
        }
        drop(listener);

        let drain = self.config.shutdown_timeout();
        tracing::info!(
            active_connections = tracker.active_connections(),
            drain_secs = drain.as_secs(),
            "shutting down, draining connections"
        );
        if tokio::time::timeout(drain, tracker.wait_idle()).await.is_err() {
            tracing::warn!(
                active_connections = tracker.active_connections(),
                "drain period elapsed with connections still open"
            );
        }
        tracing::info!("conduit stopped");
        Ok(())
    }
}

async fn serve_connection(
    service: Arc<HttpService>,
    stream: TcpStream,
    remote: SocketAddr,
    shutdown: ShutdownSignal,
) {
    let hyper_service = service_fn(move |request: Request<Incoming>| {
        let service = Arc::clone(&service);
        async move {
            let _in_flight = InFlightGuard::new();
            let response = service.handle_streaming::<Incoming>(request).await;
            Ok::<_, Infallible>(response.map(Full::new))
        }
    });

    let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), hyper_service);
    tokio::pin!(conn);

    let result = tokio::select! {
        result = conn.as_mut() => result,
        () = shutdown.recv() => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    };
    if let Err(err) = result {
        tracing::debug!(error = %err, remote = %remote, "connection closed with error");
    }
}
