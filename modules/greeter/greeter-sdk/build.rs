//! Stubs for the service in `proto/helloworld/helloworld.proto`, generated without protoc.
//! The message types are declared by hand in `src/lib.rs` and must keep the schema's
//! field tags.

use tonic_build::manual::{Builder, Method, Service};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=proto/helloworld/helloworld.proto");

    let greeter = Service::builder()
        .name("Greeter")
        .package("helloworld")
        .method(
            Method::builder()
                .name("say_hello")
                .route_name("SayHello")
                .input_type("super::HelloRequest")
                .output_type("super::HelloReply")
                .codec_path("tonic_prost::ProstCodec")
                .build(),
        )
        .build();

    Builder::new().compile(&[greeter]);
}
