//! StatusClient against an in-process StatusService.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use clientmgr::{
    ClientConfig, ClientError, ClientRegistry, Connection, DialOptions, Logger, RegistryError,
    RetryPolicy, RpcClient,
};
use status_sdk::{
    Status, StatusClient, StatusMessage, StatusRequest, StatusResponse, StatusService,
    StatusServiceServer, get_status_client,
};
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::{Code, Request, Response};
use uuid::Uuid;

#[derive(Clone)]
enum Behavior {
    Echo,
    Fail(Code),
    SlowFor { uuid: String, delay: Duration },
}

#[derive(Clone)]
struct TestStatusService {
    behavior: Behavior,
    calls: Arc<AtomicU32>,
}

impl TestStatusService {
    fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    async fn respond(&self, uuid: String, message: &str) -> Result<Response<StatusResponse>, tonic::Status> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Echo => {}
            Behavior::Fail(code) => return Err(tonic::Status::new(*code, "injected failure")),
            Behavior::SlowFor { uuid: slow, delay } => {
                if *slow == uuid {
                    tokio::time::sleep(*delay).await;
                }
            }
        }
        Ok(Response::new(StatusResponse {
            uuid,
            message: message.to_owned(),
            code: 0,
        }))
    }
}

#[tonic::async_trait]
impl StatusService for TestStatusService {
    async fn set_status(
        &self,
        request: Request<StatusMessage>,
    ) -> Result<Response<StatusResponse>, tonic::Status> {
        self.respond(request.into_inner().uuid, "Status set").await
    }

    async fn get_status(
        &self,
        request: Request<StatusRequest>,
    ) -> Result<Response<StatusResponse>, tonic::Status> {
        self.respond(request.into_inner().uuid, "Status retrieved").await
    }

    async fn delete_status(
        &self,
        request: Request<StatusRequest>,
    ) -> Result<Response<StatusResponse>, tonic::Status> {
        self.respond(request.into_inner().uuid, "Status deleted").await
    }
}

async fn spawn_server(service: TestStatusService) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let incoming = TcpListenerStream::new(listener);

    tokio::spawn(async move {
        tonic::transport::Server::builder()
            .add_service(StatusServiceServer::new(service))
            .serve_with_incoming(incoming)
            .await
            .unwrap();
    });

    addr
}

fn registry() -> ClientRegistry {
    let options = DialOptions::default().with_retry_policy(RetryPolicy::default());
    ClientRegistry::with_options(Logger::default(), options)
}

fn register(registry: &ClientRegistry, addr: SocketAddr, timeout_secs: u64) -> Arc<StatusClient> {
    let config = ClientConfig::new("status", addr.to_string(), timeout_secs);
    registry
        .register(StatusClient::new(config, registry.logger().clone()))
        .unwrap();
    get_status_client(registry, "status").unwrap()
}

#[tokio::test]
async fn status_calls_round_trip() {
    let service = TestStatusService::new(Behavior::Echo);
    let addr = spawn_server(service.clone()).await;
    let registry = registry();
    let client = register(&registry, addr, 5);

    let status = Status::now();
    let set = client.send_status(&status).await.unwrap();
    assert_eq!(set.uuid, status.uuid.to_string());
    assert_eq!(set.message, "Status set");
    assert_eq!(set.code, 0);

    let got = client.get_status(status.uuid).await.unwrap();
    assert_eq!(got.message, "Status retrieved");

    let deleted = client.delete_status(status.uuid).await.unwrap();
    assert_eq!(deleted.message, "Status deleted");

    assert_eq!(service.calls.load(Ordering::SeqCst), 3);
    registry.close_all();
    assert!(!client.is_initialized());
}

#[tokio::test]
async fn unavailable_is_attempted_five_times() {
    let service = TestStatusService::new(Behavior::Fail(Code::Unavailable));
    let addr = spawn_server(service.clone()).await;
    let registry = registry();
    let client = register(&registry, addr, 5);

    let started = Instant::now();
    let err = client.send_status(&Status::now()).await.unwrap_err();

    assert_eq!(service.calls.load(Ordering::SeqCst), 5);
    assert!(started.elapsed() >= Duration::from_millis(400));
    match err {
        ClientError::Call { op, source, .. } => {
            assert_eq!(op, "set_status");
            assert_eq!(source.code(), Code::Unavailable);
            assert_eq!(source.message(), "injected failure");
        }
        other => panic!("expected Call error, got {other:?}"),
    }
}

#[tokio::test]
async fn resource_exhausted_is_retried() {
    let service = TestStatusService::new(Behavior::Fail(Code::ResourceExhausted));
    let addr = spawn_server(service.clone()).await;
    let registry = registry();
    let client = register(&registry, addr, 5);

    let err = client.get_status(Uuid::new_v4()).await.unwrap_err();

    assert_eq!(service.calls.load(Ordering::SeqCst), 5);
    assert_eq!(err.status().map(tonic::Status::code), Some(Code::ResourceExhausted));
}

#[tokio::test]
async fn invalid_argument_is_attempted_once() {
    let service = TestStatusService::new(Behavior::Fail(Code::InvalidArgument));
    let addr = spawn_server(service.clone()).await;
    let registry = registry();
    let client = register(&registry, addr, 5);

    let err = client.send_status(&Status::now()).await.unwrap_err();

    assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    assert_eq!(err.status().map(tonic::Status::code), Some(Code::InvalidArgument));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn expired_call_does_not_affect_concurrent_call() {
    let slow = Uuid::new_v4();
    let service = TestStatusService::new(Behavior::SlowFor {
        uuid: slow.to_string(),
        delay: Duration::from_secs(3),
    });
    let addr = spawn_server(service).await;
    let registry = registry();
    let client = register(&registry, addr, 1);

    let fast = Uuid::new_v4();
    let (slow_result, fast_result) = tokio::join!(client.get_status(slow), client.get_status(fast));

    let err = slow_result.unwrap_err();
    assert!(err.is_timeout(), "expected Timeout, got {err:?}");
    assert!(matches!(err, ClientError::Timeout { timeout, .. } if timeout == Duration::from_secs(1)));

    let ok = fast_result.unwrap();
    assert_eq!(ok.uuid, fast.to_string());
}

#[tokio::test]
async fn unreachable_server_reports_unavailable_after_retries() {
    // Bind then drop to get a port nobody listens on.
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let registry = registry();
    let client = register(&registry, addr, 5);

    let err = client.send_status(&Status::now()).await.unwrap_err();
    assert_eq!(err.status().map(tonic::Status::code), Some(Code::Unavailable));
}

#[tokio::test]
async fn wrong_client_type_is_type_mismatch() {
    #[derive(Debug)]
    struct Other;

    impl RpcClient for Other {
        fn initialize(&mut self, _connection: Connection) -> Result<(), ClientError> {
            Ok(())
        }
        fn close(&self) -> Result<(), ClientError> {
            Ok(())
        }
        fn name(&self) -> &str {
            "other"
        }
        fn host(&self) -> &str {
            "localhost:9"
        }
    }

    let registry = registry();
    registry.register(Other).unwrap();

    let err = get_status_client(&registry, "other").unwrap_err();
    assert!(matches!(err, RegistryError::TypeMismatch { .. }));
    assert!(matches!(
        get_status_client(&registry, "missing"),
        Err(RegistryError::NotFound { .. })
    ));
}

#[tokio::test]
async fn calls_after_close_are_not_initialized() {
    let addr = spawn_server(TestStatusService::new(Behavior::Echo)).await;
    let registry = registry();
    let client = register(&registry, addr, 5);

    registry.close_all();

    let err = client.delete_status(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ClientError::NotInitialized { .. }));
}
