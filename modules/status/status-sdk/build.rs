//! Stubs for the service in `proto/status/v1/status.proto`, generated without protoc.
//! The message types are declared by hand in `src/lib.rs` and must keep the schema's
//! field tags.

use tonic_build::manual::{Builder, Method, Service};

fn unary(name: &str, route: &str, input: &str, output: &str) -> Method {
    Method::builder()
        .name(name)
        .route_name(route)
        .input_type(input)
        .output_type(output)
        .codec_path("tonic_prost::ProstCodec")
        .build()
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=proto/status/v1/status.proto");

    let service = Service::builder()
        .name("StatusService")
        .package("status.v1")
        .method(unary(
            "set_status",
            "SetStatus",
            "super::StatusMessage",
            "super::StatusResponse",
        ))
        .method(unary(
            "get_status",
            "GetStatus",
            "super::StatusRequest",
            "super::StatusResponse",
        ))
        .method(unary(
            "delete_status",
            "DeleteStatus",
            "super::StatusRequest",
            "super::StatusResponse",
        ))
        .build();

    Builder::new().compile(&[service]);
}
