//! Logging stage of the client interceptor chain, plus the [`Logger`] handle shared by
//! the registry and its clients.
//!
//! Extra context travels as an explicit [`LogFields`] bag next to the call instead of
//! inside request extensions; the bag is merged into each event when it is emitted.

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use tonic::Code;
use tower::{Layer, Service};
use tracing::Span;

use crate::BoxError;
use crate::status::response_code;

/// Severity used by the interceptor and by [`Logger::log`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Level used for a call that finished with `code`.
    ///
    /// Client-side errors the caller caused stay at debug; server faults and
    /// unavailability are warnings.
    #[must_use]
    pub fn for_code(code: Code) -> Self {
        match code {
            Code::Ok
            | Code::Cancelled
            | Code::InvalidArgument
            | Code::NotFound
            | Code::AlreadyExists
            | Code::ResourceExhausted
            | Code::FailedPrecondition
            | Code::Aborted
            | Code::OutOfRange => LogLevel::Debug,
            Code::Unknown
            | Code::DeadlineExceeded
            | Code::PermissionDenied
            | Code::Unauthenticated => LogLevel::Info,
            Code::Unimplemented | Code::Internal | Code::Unavailable | Code::DataLoss => {
                LogLevel::Warn
            }
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Ordered key/value bag attached to log events.
///
/// Inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFields(Vec<(Cow<'static, str>, String)>);

impl LogFields {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`LogFields::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<Cow<'static, str>>, value: impl fmt::Display) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<Cow<'static, str>>, value: impl fmt::Display) {
        let key = key.into();
        let value = value.to_string();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Copy of `self` with every field of `other` applied on top.
    #[must_use]
    pub fn merged(&self, other: &LogFields) -> LogFields {
        let mut out = self.clone();
        for (key, value) in &other.0 {
            out.insert(key.clone(), value);
        }
        out
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for LogFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

/// Shared, read-only logging handle.
///
/// Events are emitted as children of `span` and carry the handle's base fields merged
/// with the per-event fields.
#[derive(Debug, Clone)]
pub struct Logger {
    span: Span,
    fields: LogFields,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(tracing::info_span!("clientmgr"))
    }
}

impl Logger {
    #[must_use]
    pub fn new(span: Span) -> Self {
        Self {
            span,
            fields: LogFields::new(),
        }
    }

    /// Handle with an extra base field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<Cow<'static, str>>, value: impl fmt::Display) -> Self {
        self.fields.insert(key, value);
        self
    }

    #[must_use]
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Emit `message` at `level` with the base fields merged with `fields`.
    pub fn log(&self, level: LogLevel, message: &str, fields: &LogFields) {
        let merged = self.fields.merged(fields);
        match level {
            LogLevel::Debug => tracing::debug!(parent: &self.span, fields = %merged, "{message}"),
            LogLevel::Info => tracing::info!(parent: &self.span, fields = %merged, "{message}"),
            LogLevel::Warn => tracing::warn!(parent: &self.span, fields = %merged, "{message}"),
            LogLevel::Error => tracing::error!(parent: &self.span, fields = %merged, "{message}"),
        }
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message, &LogFields::new());
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message, &LogFields::new());
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message, &LogFields::new());
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message, &LogFields::new());
    }
}

/// Splits `/package.Service/Method` into its service and method parts.
fn grpc_route(path: &str) -> (&str, &str) {
    let mut parts = path.trim_start_matches('/').splitn(2, '/');
    let service = parts.next().unwrap_or_default();
    let method = parts.next().unwrap_or_default();
    (service, method)
}

fn duration_to_u64_ms(elapsed: std::time::Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Tower layer producing [`LoggingService`].
#[derive(Debug, Clone, Default)]
pub struct LoggingLayer {
    logger: Logger,
}

impl LoggingLayer {
    #[must_use]
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = LoggingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LoggingService {
            inner,
            logger: self.logger.clone(),
        }
    }
}

/// Emits `payload sent` before every call and `payload received` (or `call failed`)
/// once it completes.
#[derive(Debug, Clone)]
pub struct LoggingService<S> {
    inner: S,
    logger: Logger,
}

impl<S, ReqBody, ResBody> Service<http::Request<ReqBody>> for LoggingService<S>
where
    S: Service<http::Request<ReqBody>, Response = http::Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Into<BoxError>,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, request: http::Request<ReqBody>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let logger = self.logger.clone();

        let (service, method) = grpc_route(request.uri().path());
        let mut fields = LogFields::new()
            .with("grpc.service", service.to_owned())
            .with("grpc.method", method.to_owned());

        Box::pin(async move {
            logger.log(LogLevel::Info, "payload sent", &fields);
            let started = Instant::now();

            let result = inner.call(request).await.map_err(Into::into);
            fields.insert("grpc.time_ms", duration_to_u64_ms(started.elapsed()));

            match &result {
                Ok(response) => match response_code(response) {
                    None => {
                        fields.insert("grpc.code", format!("{:?}", Code::Ok));
                        logger.log(LogLevel::Info, "payload received", &fields);
                    }
                    Some(code) => {
                        fields.insert("grpc.code", format!("{code:?}"));
                        logger.log(LogLevel::for_code(code), "call failed", &fields);
                    }
                },
                Err(err) => {
                    let code = err
                        .downcast_ref::<tonic::Status>()
                        .map_or(Code::Unknown, tonic::Status::code);
                    fields.insert("grpc.code", format!("{code:?}"));
                    fields.insert("grpc.error", err);
                    logger.log(LogLevel::for_code(code), "call failed", &fields);
                }
            }

            result
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use tonic::body::Body;
    use tower::ServiceExt;
    use tracing_test::traced_test;

    fn request() -> http::Request<Body> {
        http::Request::builder()
            .uri("http://localhost/helloworld.Greeter/SayHello")
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_fields_insert_replaces_existing_key() {
        let mut fields = LogFields::new().with("client", "status").with("attempt", 1);
        fields.insert("attempt", 2);

        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get("attempt"), Some("2"));
        assert_eq!(fields.to_string(), "client=status attempt=2");
    }

    #[test]
    fn test_fields_merge_prefers_other() {
        let base = LogFields::new().with("client", "status").with("host", "a:1");
        let extra = LogFields::new().with("host", "b:2").with("op", "set_status");

        let merged = base.merged(&extra);

        assert_eq!(merged.get("client"), Some("status"));
        assert_eq!(merged.get("host"), Some("b:2"));
        assert_eq!(merged.get("op"), Some("set_status"));
        assert_eq!(base.get("host"), Some("a:1"));
    }

    #[test]
    fn test_grpc_route_split() {
        assert_eq!(
            grpc_route("/status.v1.StatusService/SetStatus"),
            ("status.v1.StatusService", "SetStatus")
        );
        assert_eq!(grpc_route("/"), ("", ""));
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(LogLevel::for_code(Code::Ok), LogLevel::Debug);
        assert_eq!(LogLevel::for_code(Code::DeadlineExceeded), LogLevel::Info);
        assert_eq!(LogLevel::for_code(Code::Unavailable), LogLevel::Warn);
        assert_eq!(tracing::Level::from(LogLevel::Error), tracing::Level::ERROR);
    }

    #[test]
    #[traced_test]
    fn test_logger_merges_base_fields() {
        let logger = Logger::default().with_field("client", "status");
        logger.log(LogLevel::Warn, "close failed", &LogFields::new().with("host", "h:1"));

        assert!(logs_contain("close failed"));
        assert!(logs_contain("client=status host=h:1"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_logs_payload_events_on_success() {
        let svc = LoggingLayer::new(Logger::default()).layer(tower::service_fn(
            |_req: http::Request<Body>| async {
                Ok::<_, BoxError>(http::Response::new(Body::empty()))
            },
        ));

        svc.oneshot(request()).await.unwrap();

        assert!(logs_contain("payload sent"));
        assert!(logs_contain("payload received"));
        assert!(logs_contain("grpc.service=helloworld.Greeter"));
        assert!(logs_contain("grpc.method=SayHello"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_logs_failed_status() {
        let svc = LoggingLayer::new(Logger::default()).layer(tower::service_fn(
            |_req: http::Request<Body>| async {
                Ok::<_, BoxError>(tonic::Status::internal("boom").into_http::<Body>())
            },
        ));

        svc.oneshot(request()).await.unwrap();

        assert!(logs_contain("payload sent"));
        assert!(logs_contain("call failed"));
        assert!(logs_contain("grpc.code=Internal"));
        assert!(!logs_contain("payload received"));
    }
}
