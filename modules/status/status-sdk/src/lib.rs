//! Status SDK
//!
//! Everything needed to talk to `status.v1.StatusService`:
//! - wire types and generated client/server stubs ([`proto`])
//! - the [`Status`] domain value
//! - [`StatusClient`], registrable in a [`clientmgr::ClientRegistry`]
//! - typed lookups ([`get_status_client`], [`global_status_client`])
//!
//! ## Usage
//!
//! ```ignore
//! registry.register(StatusClient::new(config, registry.logger().clone()))?;
//!
//! let client = get_status_client(&registry, "status")?;
//! client.send_status(&Status::now()).await?;
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

mod api;
pub use api::Status;

mod client;
pub use client::StatusClient;

mod wiring;
pub use wiring::{get_status_client, global_status_client};

/// Wire types and generated stubs for `status.v1.StatusService`.
#[allow(clippy::all, clippy::pedantic)]
pub mod proto {
    /// Status update for one entity.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct StatusMessage {
        #[prost(string, tag = "1")]
        pub uuid: ::prost::alloc::string::String,
        #[prost(message, optional, tag = "2")]
        pub timestamp: ::core::option::Option<::prost_types::Timestamp>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct StatusRequest {
        #[prost(string, tag = "1")]
        pub uuid: ::prost::alloc::string::String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct StatusResponse {
        #[prost(string, tag = "1")]
        pub uuid: ::prost::alloc::string::String,
        #[prost(string, tag = "2")]
        pub message: ::prost::alloc::string::String,
        #[prost(int32, tag = "3")]
        pub code: i32,
    }

    include!(concat!(env!("OUT_DIR"), "/status.v1.StatusService.rs"));
}

pub use proto::status_service_server::{StatusService, StatusServiceServer};
pub use proto::{StatusMessage, StatusRequest, StatusResponse};

/// Fully qualified gRPC service name.
pub const SERVICE_NAME: &str = "status.v1.StatusService";

/// Registry kind used in configuration (`clients.status`).
pub const CLIENT_KIND: &str = "status";
