use http::StatusCode;
use tonic::{Code, Status};

use crate::BoxError;

const GRPC_STATUS: &str = "grpc-status";

/// gRPC code carried by a trailers-only response, if it is not `Ok`.
///
/// Successful unary responses carry their status in trailers, which the chain never
/// waits for; those count as `Ok`. A non-2xx HTTP response without `grpc-status`
/// (a proxy or load balancer answering) is mapped from its HTTP status.
pub(crate) fn response_code<B>(response: &http::Response<B>) -> Option<Code> {
    match response.headers().get(GRPC_STATUS) {
        Some(value) => Some(Code::from_bytes(value.as_bytes())).filter(|code| *code != Code::Ok),
        None if response.status().is_success() => None,
        None => Some(http_status_code(response.status())),
    }
}

/// HTTP to gRPC mapping from the gRPC HTTP/2 protocol notes.
fn http_status_code(status: StatusCode) -> Code {
    match status {
        StatusCode::BAD_REQUEST => Code::Internal,
        StatusCode::UNAUTHORIZED => Code::Unauthenticated,
        StatusCode::FORBIDDEN => Code::PermissionDenied,
        StatusCode::NOT_FOUND => Code::Unimplemented,
        StatusCode::TOO_MANY_REQUESTS
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => Code::Unavailable,
        _ => Code::Unknown,
    }
}

/// Converts a transport error into the `Status` tonic would report for it.
///
/// Connection failures map to `Unavailable`, which keeps them eligible for retry.
pub(crate) fn transport_status(err: BoxError) -> Status {
    Status::from_error(err)
}
