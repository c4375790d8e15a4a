#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
//! gRPC transport for ClientMgr.
//!
//! [`dial`] turns a host string into a [`Connection`]: a lazily connected
//! `tonic` channel wrapped in the client interceptor chain
//!
//! ```text
//! LoggingService  (payload sent / payload received events)
//!   RetryService  (Unavailable, ResourceExhausted; fixed backoff)
//!     Channel
//! ```
//!
//! Generated `tonic` clients accept a [`Connection`] directly, so every call made
//! through a registered client goes through the same logging and retry policy.

pub mod client;
pub mod logging;
pub mod rpc_retry;
mod status;

pub use client::{Connection, DialError, DialOptions, ResponseFuture, dial, interceptor_chain};
pub use logging::{LogFields, LogLevel, Logger, LoggingLayer, LoggingService};
pub use rpc_retry::{RetryLayer, RetryPolicy, RetryService};

/// Boxed error type used across the interceptor chain.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
