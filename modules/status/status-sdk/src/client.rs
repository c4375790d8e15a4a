//! Registrable client for `status.v1.StatusService`.

use std::fmt;

use clientmgr::{ClientConfig, ClientError, Connection, Logger, RpcClient, call_with_deadline};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::api::{Status, status_request};
use crate::proto::status_service_client::StatusServiceClient;
use crate::proto::{StatusMessage, StatusResponse};

type Stub = StatusServiceClient<Connection>;

/// Status service client with a per-call deadline taken from its [`ClientConfig`].
pub struct StatusClient {
    config: ClientConfig,
    logger: Logger,
    stub: RwLock<Option<Stub>>,
}

impl fmt::Debug for StatusClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusClient")
            .field("config", &self.config)
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

impl StatusClient {
    /// Uninitialized client; register it to connect.
    #[must_use]
    pub fn new(config: ClientConfig, logger: Logger) -> Self {
        let logger = logger
            .with_field("client", &config.name)
            .with_field("service", crate::SERVICE_NAME);
        Self {
            config,
            logger,
            stub: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.stub.read().is_some()
    }

    fn stub(&self) -> Result<Stub, ClientError> {
        self.stub
            .read()
            .clone()
            .ok_or_else(|| ClientError::NotInitialized {
                client: self.config.name.clone(),
            })
    }

    /// Records `status` on the server.
    ///
    /// # Errors
    /// [`ClientError::NotInitialized`] before registration, [`ClientError::Timeout`] when
    /// the configured deadline expires, [`ClientError::Call`] for any failed status.
    pub async fn send_status(&self, status: &Status) -> Result<StatusResponse, ClientError> {
        let mut stub = self.stub()?;
        let request = StatusMessage::from(status);

        call_with_deadline(
            &self.config.name,
            "set_status",
            self.config.timeout(),
            &self.logger,
            async move { stub.set_status(request).await.map(tonic::Response::into_inner) },
        )
        .await
    }

    /// Fetches the status recorded for `uuid`.
    ///
    /// # Errors
    /// Same as [`StatusClient::send_status`].
    pub async fn get_status(&self, uuid: Uuid) -> Result<StatusResponse, ClientError> {
        let mut stub = self.stub()?;
        let request = status_request(uuid);

        call_with_deadline(
            &self.config.name,
            "get_status",
            self.config.timeout(),
            &self.logger,
            async move { stub.get_status(request).await.map(tonic::Response::into_inner) },
        )
        .await
    }

    /// Deletes the status recorded for `uuid`.
    ///
    /// # Errors
    /// Same as [`StatusClient::send_status`].
    pub async fn delete_status(&self, uuid: Uuid) -> Result<StatusResponse, ClientError> {
        let mut stub = self.stub()?;
        let request = status_request(uuid);

        call_with_deadline(
            &self.config.name,
            "delete_status",
            self.config.timeout(),
            &self.logger,
            async move { stub.delete_status(request).await.map(tonic::Response::into_inner) },
        )
        .await
    }
}

impl RpcClient for StatusClient {
    fn initialize(&mut self, connection: Connection) -> Result<(), ClientError> {
        let stub = self.stub.get_mut();
        if stub.is_some() {
            return Err(ClientError::AlreadyInitialized {
                client: self.config.name.clone(),
            });
        }
        *stub = Some(StatusServiceClient::new(connection));
        self.logger.info("status client initialized");
        Ok(())
    }

    fn close(&self) -> Result<(), ClientError> {
        if self.stub.write().take().is_some() {
            self.logger.debug("status client closed");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn host(&self) -> &str {
        &self.config.host
    }
}
