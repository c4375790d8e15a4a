#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

//! Named gRPC client registry.
//!
//! A process that talks to several gRPC services registers one client per service:
//!
//! ```text
//! ClientRegistry::register(client)
//!   -> dial(client.host())        lazy channel, logging + retry chain
//!   -> client.initialize(conn)    typed stub built on the connection
//!   -> stored under client.name()
//! ```
//!
//! Callers fetch clients by name, either as `Arc<dyn RpcClient>` or downcast to the
//! concrete type, and call typed operations that enforce their own per-call deadline.

pub mod config;
pub mod contract;
pub mod error;
pub mod global;
pub mod registry;

pub use config::{ClientConfig, ConfigError};
pub use contract::{RpcClient, call_with_deadline, downcast_client};
pub use error::{ClientError, RegistryError};
pub use global::{get_typed_client, global_registry, init_global, init_global_with_options};
pub use registry::ClientRegistry;

pub use clientmgr_transport::{
    Connection, DialError, DialOptions, LogFields, LogLevel, Logger, RetryPolicy,
};
