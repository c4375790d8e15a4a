//! Greeter SDK
//!
//! Wire types and stubs for `helloworld.Greeter`, plus [`GreeterClient`] for the
//! client registry.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

mod client;
pub use client::GreeterClient;

mod wiring;
pub use wiring::{get_greeter_client, global_greeter_client};

#[allow(clippy::all, clippy::pedantic)]
pub mod proto {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct HelloRequest {
        #[prost(string, tag = "1")]
        pub name: ::prost::alloc::string::String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct HelloReply {
        #[prost(string, tag = "1")]
        pub message: ::prost::alloc::string::String,
    }

    include!(concat!(env!("OUT_DIR"), "/helloworld.Greeter.rs"));
}

pub use proto::greeter_server::{Greeter, GreeterServer};
pub use proto::{HelloReply, HelloRequest};

pub const SERVICE_NAME: &str = "helloworld.Greeter";

/// Registry kind used in configuration (`clients.greeter`).
pub const CLIENT_KIND: &str = "greeter";

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use prost::Message;

    use super::*;

    // Bytes a protoc-generated peer produces for the same messages.
    #[test]
    fn hello_request_matches_schema_encoding() {
        let request = HelloRequest {
            name: "world".to_owned(),
        };
        assert_eq!(request.encode_to_vec(), b"\x0a\x05world");
    }

    #[test]
    fn hello_reply_decodes_schema_encoding() {
        let reply = HelloReply::decode(&b"\x0a\x0bHello world"[..]).unwrap();
        assert_eq!(reply.message, "Hello world");
    }
}
