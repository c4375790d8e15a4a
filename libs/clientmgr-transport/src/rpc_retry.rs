//! Retry stage of the client interceptor chain.
//!
//! [`RetryLayer`] sits closest to the wire. It replays a unary call when the call fails
//! with one of the policy's retryable codes, waiting a fixed interval between attempts.
//!
//! ## Retry Policy
//!
//! The default policy retries only on:
//! - [`tonic::Code::Unavailable`] - server temporarily unavailable or connection refused
//! - [`tonic::Code::ResourceExhausted`] - server shedding load
//!
//! Every other code is returned on first occurrence. After the last attempt the final
//! error is returned unchanged. There is no jitter and no exponential growth.
//!
//! Deadlines are not handled here. A caller that wraps the call in a timeout cancels the
//! whole retry loop, so an expired deadline is never retried.
//!
//! ## Buffering
//!
//! The request body is collected once and replayed for each attempt, which limits this
//! stage to unary calls.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use http_body_util::{BodyExt, Full};
use tokio::time::sleep;
use tonic::body::Body;
use tonic::Code;
use tower::{Layer, Service, ServiceExt};

use crate::BoxError;
use crate::status::{response_code, transport_status};

fn duration_to_u64_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Retry policy applied to every call on a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct RetryPolicy {
    /// Total number of attempts, including the first call.
    pub max_attempts: u32,

    /// Fixed wait between two attempts.
    pub backoff: Duration,

    /// Codes that make a failed attempt eligible for another try.
    pub retryable_codes: Vec<Code>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_millis(100),
            retryable_codes: vec![Code::Unavailable, Code::ResourceExhausted],
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given attempt budget and the default backoff and codes.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Set the wait between attempts.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Replace the set of retryable codes.
    pub fn with_retryable_codes(mut self, codes: impl IntoIterator<Item = Code>) -> Self {
        self.retryable_codes = codes.into_iter().collect();
        self
    }

    /// Whether a failure with `code` may be retried.
    #[must_use]
    pub fn is_retryable(&self, code: Code) -> bool {
        self.retryable_codes.contains(&code)
    }

    /// Attempt budget, never below one.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Tower layer producing [`RetryService`].
#[derive(Debug, Clone, Default)]
pub struct RetryLayer {
    policy: Arc<RetryPolicy>,
}

impl RetryLayer {
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }
}

impl<S> Layer<S> for RetryLayer {
    type Service = RetryService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RetryService {
            inner,
            policy: Arc::clone(&self.policy),
        }
    }
}

/// Service that replays failed unary calls according to a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryService<S> {
    inner: S,
    policy: Arc<RetryPolicy>,
}

impl<S, ResBody> Service<http::Request<Body>> for RetryService<S>
where
    S: Service<http::Request<Body>, Response = http::Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Into<BoxError> + Send,
    ResBody: Send + 'static,
{
    type Response = http::Response<ResBody>;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, request: http::Request<Body>) -> Self::Future {
        // The readied service goes to this call; the clone takes its place.
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(call_with_retry(inner, Arc::clone(&self.policy), request))
    }
}

async fn call_with_retry<S, ResBody>(
    mut inner: S,
    policy: Arc<RetryPolicy>,
    request: http::Request<Body>,
) -> Result<http::Response<ResBody>, BoxError>
where
    S: Service<http::Request<Body>, Response = http::Response<ResBody>> + Send,
    S::Future: Send,
    S::Error: Into<BoxError> + Send,
    ResBody: Send,
{
    let (parts, body) = request.into_parts();
    let payload = body.collect().await.map_err(BoxError::from)?.to_bytes();
    let op = parts.uri.path().to_owned();
    let max_attempts = policy.attempts();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        let request =
            http::Request::from_parts(parts.clone(), Body::new(Full::new(payload.clone())));
        let outcome: Result<http::Response<ResBody>, BoxError> = match inner.ready().await {
            Ok(service) => service.call(request).await.map_err(Into::into),
            Err(err) => Err(err.into()),
        };

        let (code, result) = match outcome {
            Ok(response) => match response_code(&response) {
                Some(code) => (code, Ok(response)),
                None => {
                    if attempt > 1 {
                        tracing::info!(op = %op, attempt, "gRPC call succeeded after retries");
                    }
                    return Ok(response);
                }
            },
            Err(err) => {
                let status = transport_status(err);
                (status.code(), Err(BoxError::from(status)))
            }
        };

        if !policy.is_retryable(code) || attempt >= max_attempts {
            if attempt > 1 {
                tracing::warn!(op = %op, attempt, code = ?code, "gRPC call giving up");
            }
            return result;
        }
        drop(result);

        tracing::debug!(
            op = %op,
            attempt,
            code = ?code,
            backoff_ms = duration_to_u64_ms(policy.backoff),
            "Retrying gRPC call after backoff"
        );

        sleep(policy.backoff).await;
    }
}
