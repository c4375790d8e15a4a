//! Dialing and the connection handle handed to registered clients.
//!
//! [`dial`] never touches the network. It validates the address, builds a `tonic`
//! endpoint with timeouts and keepalive, and creates a lazily connected channel wrapped
//! in the interceptor chain. Resolution and the handshake happen on the first call, so a
//! dead server shows up as `Unavailable` on that call (and is retried), not as a dial
//! failure.
//!
//! The channel is released when the last clone of the [`Connection`] is dropped.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tonic::body::Body;
use tonic::transport::{Channel, Endpoint};
use tower::{Service, ServiceBuilder};

use crate::BoxError;
use crate::logging::{Logger, LoggingLayer, LoggingService};
use crate::rpc_retry::{RetryLayer, RetryPolicy, RetryService};

/// Transport settings applied to every dialed connection.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct DialOptions {
    /// Timeout for establishing the TCP connection on first use.
    pub connect_timeout: Duration,

    /// TCP keepalive probe interval.
    pub tcp_keepalive: Duration,

    /// HTTP/2 PING interval.
    pub http2_keepalive_interval: Duration,

    /// How long to wait for a PING acknowledgement.
    pub keepalive_timeout: Duration,

    /// Retry stage policy.
    pub retry: RetryPolicy,
}

impl Default for DialOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            tcp_keepalive: Duration::from_secs(30),
            http2_keepalive_interval: Duration::from_secs(30),
            keepalive_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

impl DialOptions {
    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DialError {
    #[error("target address is empty")]
    EmptyAddress,

    #[error("invalid target address '{address}': {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("no Tokio runtime available to drive the connection")]
    NoRuntime,
}

/// Normalizes a configured host into a URI `tonic` accepts.
///
/// `localhost:9090` becomes `http://localhost:9090`; anything that already has a
/// scheme is kept as is.
///
/// # Errors
/// Returns [`DialError::EmptyAddress`] for a blank address.
pub fn normalize_target(address: &str) -> Result<String, DialError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(DialError::EmptyAddress);
    }
    if address.contains("://") {
        Ok(address.to_owned())
    } else {
        Ok(format!("http://{address}"))
    }
}

fn build_endpoint(uri: String, options: &DialOptions) -> Result<Endpoint, tonic::transport::Error> {
    let endpoint = Endpoint::from_shared(uri)?
        .connect_timeout(options.connect_timeout)
        .tcp_keepalive(Some(options.tcp_keepalive))
        .http2_keep_alive_interval(options.http2_keepalive_interval)
        .keep_alive_timeout(options.keepalive_timeout)
        .keep_alive_while_idle(true);

    Ok(endpoint)
}

/// Wraps `service` in the client interceptor chain: logging outermost, retry innermost.
pub fn interceptor_chain<S>(
    service: S,
    logger: Logger,
    retry: RetryPolicy,
) -> LoggingService<RetryService<S>> {
    ServiceBuilder::new()
        .layer(LoggingLayer::new(logger))
        .layer(RetryLayer::new(retry))
        .service(service)
}

/// Future returned by [`Connection`] calls.
pub type ResponseFuture =
    Pin<Box<dyn Future<Output = Result<http::Response<Body>, BoxError>> + Send>>;

/// Lazily connected channel behind the interceptor chain.
///
/// Cheap to clone; clones share the underlying HTTP/2 connection and may issue calls
/// concurrently.
#[derive(Clone)]
pub struct Connection {
    inner: LoggingService<RetryService<Channel>>,
    target: Arc<str>,
}

impl Connection {
    /// URI the connection was dialed with.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl Service<http::Request<Body>> for Connection {
    type Response = http::Response<Body>;
    type Error = BoxError;
    type Future = ResponseFuture;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: http::Request<Body>) -> Self::Future {
        self.inner.call(request)
    }
}

/// Opens a lazily connected [`Connection`] to `address`.
///
/// The channel spawns its background worker immediately, so a Tokio runtime must be
/// current on the calling thread.
///
/// # Errors
/// Returns [`DialError`] when the address is empty or not a valid URI, or when no
/// runtime is available.
pub fn dial(address: &str, options: &DialOptions, logger: &Logger) -> Result<Connection, DialError> {
    let target = normalize_target(address)?;
    let endpoint = build_endpoint(target.clone(), options).map_err(|source| {
        DialError::InvalidAddress {
            address: address.to_owned(),
            source,
        }
    })?;

    if tokio::runtime::Handle::try_current().is_err() {
        return Err(DialError::NoRuntime);
    }

    let channel = endpoint.connect_lazy();
    let logger = logger.clone().with_field("grpc.target", &target);

    tracing::debug!(
        parent: logger.span(),
        target = %target,
        connect_timeout_ms = u64::try_from(options.connect_timeout.as_millis()).unwrap_or(u64::MAX),
        max_attempts = options.retry.max_attempts,
        "gRPC channel prepared"
    );

    Ok(Connection {
        inner: interceptor_chain(channel, logger, options.retry.clone()),
        target: target.into(),
    })
}
