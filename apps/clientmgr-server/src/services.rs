//! In-memory implementations of the demo services.

use greeter_sdk::{Greeter, HelloReply, HelloRequest};
use status_sdk::{StatusMessage, StatusRequest, StatusResponse, StatusService};
use tonic::{Request, Response, Status};

const CODE_OK: i32 = 0;

fn reply(uuid: String, message: &str) -> Response<StatusResponse> {
    Response::new(StatusResponse {
        uuid,
        message: message.to_owned(),
        code: CODE_OK,
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StatusServiceImpl;

#[tonic::async_trait]
impl StatusService for StatusServiceImpl {
    async fn set_status(
        &self,
        request: Request<StatusMessage>,
    ) -> Result<Response<StatusResponse>, Status> {
        let msg = request.into_inner();
        tracing::info!(uuid = %msg.uuid, timestamp = ?msg.timestamp, "SetStatus received");
        Ok(reply(msg.uuid, "Status set"))
    }

    async fn get_status(
        &self,
        request: Request<StatusRequest>,
    ) -> Result<Response<StatusResponse>, Status> {
        let uuid = request.into_inner().uuid;
        tracing::info!(%uuid, "GetStatus received");
        Ok(reply(uuid, "Status retrieved"))
    }

    async fn delete_status(
        &self,
        request: Request<StatusRequest>,
    ) -> Result<Response<StatusResponse>, Status> {
        let uuid = request.into_inner().uuid;
        tracing::info!(%uuid, "DeleteStatus received");
        Ok(reply(uuid, "Status deleted"))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GreeterImpl;

#[tonic::async_trait]
impl Greeter for GreeterImpl {
    async fn say_hello(&self, request: Request<HelloRequest>) -> Result<Response<HelloReply>, Status> {
        let name = request.into_inner().name;
        tracing::info!(%name, "SayHello received");
        Ok(Response::new(HelloReply {
            message: format!("Hello {name}"),
        }))
    }
}
