//! The capability contract every registrable client implements, and the helpers its
//! typed operations share.

use std::any::{Any, type_name};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use clientmgr_transport::{LogFields, LogLevel, Logger};

use crate::error::{ClientError, RegistryError};

/// A named client for one remote service.
///
/// The registry calls [`RpcClient::initialize`] exactly once with a freshly dialed
/// connection and stores the client only if that succeeds. [`RpcClient::close`] must be
/// safe to call whether or not `initialize` ever ran, and more than once.
pub trait RpcClient: Any + Send + Sync {
    /// Takes ownership of `connection` and builds the typed stub on top of it.
    ///
    /// # Errors
    /// Returns [`ClientError`] if the client cannot use the connection.
    fn initialize(&mut self, connection: clientmgr_transport::Connection) -> Result<(), ClientError>;

    /// Releases the connection.
    ///
    /// # Errors
    /// Returns [`ClientError`] if releasing fails; the registry logs it and moves on.
    fn close(&self) -> Result<(), ClientError>;

    /// Registry key.
    fn name(&self) -> &str;

    /// Address the registry dials.
    fn host(&self) -> &str;
}

impl fmt::Debug for dyn RpcClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcClient")
            .field("name", &self.name())
            .field("host", &self.host())
            .finish()
    }
}

/// Checked downcast of a stored client to its concrete type.
///
/// # Errors
/// Returns [`RegistryError::TypeMismatch`] if the client registered under `name` is not a `C`.
pub fn downcast_client<C: RpcClient>(
    name: &str,
    client: Arc<dyn RpcClient>,
) -> Result<Arc<C>, RegistryError> {
    let any: Arc<dyn Any + Send + Sync> = client;
    any.downcast::<C>().map_err(|_| RegistryError::TypeMismatch {
        name: name.to_owned(),
        expected: type_name::<C>(),
    })
}

/// Runs one typed call under a per-call deadline.
///
/// The deadline covers the whole call including transport retries; when it expires the
/// call is abandoned and [`ClientError::Timeout`] is returned. A failed status becomes
/// [`ClientError::Call`]. Success is logged at debug with the response, failure at error.
///
/// # Errors
/// Returns [`ClientError::Timeout`] or [`ClientError::Call`].
pub async fn call_with_deadline<T, F>(
    client: &str,
    op: &'static str,
    timeout: Duration,
    logger: &Logger,
    call: F,
) -> Result<T, ClientError>
where
    T: fmt::Debug,
    F: Future<Output = Result<T, tonic::Status>>,
{
    let fields = LogFields::new().with("client", client.to_owned()).with("op", op);

    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(response)) => {
            logger.log(
                LogLevel::Debug,
                "call succeeded",
                &fields.with("response", format!("{response:?}")),
            );
            Ok(response)
        }
        Ok(Err(status)) => {
            logger.log(
                LogLevel::Error,
                "call failed",
                &fields
                    .with("grpc.code", format!("{:?}", status.code()))
                    .with("error", status.message().to_owned()),
            );
            Err(ClientError::Call {
                client: client.to_owned(),
                op,
                source: status,
            })
        }
        Err(_elapsed) => {
            logger.log(
                LogLevel::Error,
                "call timed out",
                &fields.with("timeout_ms", timeout.as_millis()),
            );
            Err(ClientError::Timeout {
                client: client.to_owned(),
                op,
                timeout,
            })
        }
    }
}
