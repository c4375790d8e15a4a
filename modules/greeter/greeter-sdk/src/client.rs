use clientmgr::{ClientConfig, ClientError, Connection, Logger, RpcClient, call_with_deadline};
use parking_lot::RwLock;

use crate::proto::HelloRequest;
use crate::proto::greeter_client;

type Stub = greeter_client::GreeterClient<Connection>;

/// `helloworld.Greeter` client owned by a [`clientmgr::ClientRegistry`].
///
/// Unusable until the registry hands it a connection; closing drops the stub and with it
/// this client's hold on the channel.
#[derive(Debug)]
pub struct GreeterClient {
    config: ClientConfig,
    logger: Logger,
    stub: RwLock<Option<Stub>>,
}

impl GreeterClient {
    #[must_use]
    pub fn new(config: ClientConfig, logger: Logger) -> Self {
        let logger = logger.with_field("client", &config.name);
        Self {
            config,
            logger,
            stub: RwLock::new(None),
        }
    }

    /// Greets `name` and returns the server's reply text.
    ///
    /// # Errors
    /// [`ClientError::NotInitialized`], [`ClientError::Timeout`] or [`ClientError::Call`].
    pub async fn say_hello(&self, name: &str) -> Result<String, ClientError> {
        let Some(mut stub) = self.stub.read().clone() else {
            return Err(ClientError::NotInitialized {
                client: self.config.name.clone(),
            });
        };
        let request = HelloRequest {
            name: name.to_owned(),
        };

        let reply = call_with_deadline(
            &self.config.name,
            "say_hello",
            self.config.timeout(),
            &self.logger,
            async move { stub.say_hello(request).await.map(tonic::Response::into_inner) },
        )
        .await?;

        Ok(reply.message)
    }
}

impl RpcClient for GreeterClient {
    fn initialize(&mut self, connection: Connection) -> Result<(), ClientError> {
        let stub = self.stub.get_mut();
        if stub.is_some() {
            return Err(ClientError::AlreadyInitialized {
                client: self.config.name.clone(),
            });
        }
        *stub = Some(greeter_client::GreeterClient::new(connection));
        self.logger.info("greeter client initialized");
        Ok(())
    }

    fn close(&self) -> Result<(), ClientError> {
        if self.stub.write().take().is_some() {
            self.logger.debug("greeter client closed");
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
