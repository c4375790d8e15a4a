use std::time::Duration;

use clientmgr_transport::DialError;

/// Errors raised by a concrete client, either from its lifecycle or from a typed call.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("client '{client}' is not initialized")]
    NotInitialized { client: String },

    #[error("client '{client}' is already initialized")]
    AlreadyInitialized { client: String },

    #[error("client '{client}' setup failed: {reason}")]
    Setup { client: String, reason: String },

    #[error("client '{client}' call {op} failed: {source}")]
    Call {
        client: String,
        op: &'static str,
        #[source]
        source: tonic::Status,
    },

    #[error("client '{client}' call {op} timed out after {timeout:?}")]
    Timeout {
        client: String,
        op: &'static str,
        timeout: Duration,
    },
}

impl ClientError {
    /// Final status of a failed call, when the failure came from the server or transport.
    #[must_use]
    pub fn status(&self) -> Option<&tonic::Status> {
        match self {
            ClientError::Call { source, .. } => Some(source),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Timeout { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("client '{name}' is already registered")]
    AlreadyRegistered { name: String },

    #[error("failed to connect client '{name}' to {host}: {source}")]
    Connection {
        name: String,
        host: String,
        #[source]
        source: DialError,
    },

    #[error("failed to initialize client '{name}': {source}")]
    Initialization {
        name: String,
        #[source]
        source: ClientError,
    },

    #[error("client '{name}' not found")]
    NotFound { name: String },

    #[error("client '{name}' is not a {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    #[error("global client registry is not initialized")]
    NotInitialized,
}
