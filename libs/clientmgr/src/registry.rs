//! Name-keyed registry of live RPC clients.
//!
//! Each entry owns one dialed connection (through its client) for its whole life.
//! Entries are only added by [`ClientRegistry::register`] and only removed by
//! [`ClientRegistry::close_all`]; there is no update in place.
//!
//! Implementation details:
//! - One `parking_lot::RwLock` guards the map. Lookups take the read lock.
//! - `register` dials and initializes outside the lock, then commits under the write lock
//!   after checking the name again. A client that loses the race is closed, never stored.
//! - The hot path is sync; dialing is lazy so nothing here awaits.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use clientmgr_transport::{DialOptions, LogFields, LogLevel, Logger, dial};
use parking_lot::RwLock;

use crate::contract::{RpcClient, downcast_client};
use crate::error::RegistryError;

struct RegistryEntry {
    host: String,
    client: Arc<dyn RpcClient>,
}

/// Thread-safe mapping from client name to initialized client.
pub struct ClientRegistry {
    entries: RwLock<HashMap<String, RegistryEntry>>,
    logger: Logger,
    options: DialOptions,
}

impl fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.read();
        let mut names: Vec<(&str, &str)> = entries
            .iter()
            .map(|(name, entry)| (name.as_str(), entry.host.as_str()))
            .collect();
        names.sort_unstable();
        f.debug_struct("ClientRegistry")
            .field("entries", &names)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ClientRegistry {
    /// Empty registry using the default dial options.
    #[must_use]
    pub fn new(logger: Logger) -> Self {
        Self::with_options(logger, DialOptions::default())
    }

    /// Empty registry whose connections are dialed with `options`.
    #[must_use]
    pub fn with_options(logger: Logger, options: DialOptions) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            logger,
            options,
        }
    }

    #[must_use]
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Dials `client.host()`, initializes the client on that connection and stores it
    /// under `client.name()`.
    ///
    /// Nothing is stored unless every step succeeds. Outside a Tokio runtime the dial
    /// fails and this returns [`RegistryError::Connection`].
    ///
    /// # Errors
    /// - [`RegistryError::AlreadyRegistered`] if the name is taken (before or during the call)
    /// - [`RegistryError::Connection`] if the host cannot be dialed
    /// - [`RegistryError::Initialization`] if the client rejects the connection
    pub fn register<C: RpcClient>(&self, mut client: C) -> Result<(), RegistryError> {
        let name = client.name().to_owned();
        let host = client.host().to_owned();

        if self.entries.read().contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered { name });
        }

        let client_logger = self
            .logger
            .clone()
            .with_field("client", &name)
            .with_field("host", &host);

        let connection =
            dial(&host, &self.options, &client_logger).map_err(|source| RegistryError::Connection {
                name: name.clone(),
                host: host.clone(),
                source,
            })?;

        if let Err(source) = client.initialize(connection) {
            if let Err(close_err) = client.close() {
                client_logger.log(
                    LogLevel::Warn,
                    "failed to close client after initialization error",
                    &LogFields::new().with("error", &close_err),
                );
            }
            return Err(RegistryError::Initialization { name, source });
        }

        let client: Arc<dyn RpcClient> = Arc::new(client);
        {
            let mut entries = self.entries.write();
            if !entries.contains_key(&name) {
                entries.insert(
                    name.clone(),
                    RegistryEntry {
                        host: host.clone(),
                        client,
                    },
                );
                drop(entries);
                client_logger.info("client registered");
                return Ok(());
            }
        }

        // Lost the race to a concurrent registration of the same name.
        if let Err(close_err) = client.close() {
            client_logger.log(
                LogLevel::Warn,
                "failed to close duplicate client",
                &LogFields::new().with("error", &close_err),
            );
        }
        Err(RegistryError::AlreadyRegistered { name })
    }

    /// Client registered under `name`.
    ///
    /// # Errors
    /// Returns [`RegistryError::NotFound`] if no such client exists.
    pub fn get_client(&self, name: &str) -> Result<Arc<dyn RpcClient>, RegistryError> {
        self.entries
            .read()
            .get(name)
            .map(|entry| Arc::clone(&entry.client))
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_owned(),
            })
    }

    /// Client registered under `name`, downcast to `C`.
    ///
    /// # Errors
    /// Returns [`RegistryError::NotFound`] or [`RegistryError::TypeMismatch`].
    pub fn get_typed<C: RpcClient>(&self, name: &str) -> Result<Arc<C>, RegistryError> {
        let client = self.get_client(name)?;
        downcast_client::<C>(name, client)
    }

    /// Snapshot of registered names, in no particular order.
    #[must_use]
    pub fn list_clients(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Closes every client and empties the registry.
    ///
    /// A failing close is logged and does not stop the sweep. The registry can be reused
    /// afterwards.
    pub fn close_all(&self) {
        let mut entries = self.entries.write();
        let total = entries.len();
        let mut failed = 0_usize;

        for (name, entry) in entries.drain() {
            let fields = LogFields::new().with("client", &name).with("host", &entry.host);
            match entry.client.close() {
                Ok(()) => self.logger.log(LogLevel::Info, "client closed", &fields),
                Err(err) => {
                    failed += 1;
                    self.logger
                        .log(LogLevel::Error, "failed to close client", &fields.with("error", &err));
                }
            }
        }

        tracing::debug!(parent: self.logger.span(), total, failed, "client registry cleared");
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use clientmgr_transport::Connection;
    use parking_lot::Mutex;

    #[derive(Debug)]
    struct Tracked {
        name: String,
        host: String,
        conn: Mutex<Option<Connection>>,
    }

    impl Tracked {
        fn new(name: &str, host: &str) -> Self {
            Self {
                name: name.to_owned(),
                host: host.to_owned(),
                conn: Mutex::new(None),
            }
        }
    }

    impl RpcClient for Tracked {
        fn initialize(&mut self, connection: Connection) -> Result<(), ClientError> {
            *self.conn.lock() = Some(connection);
            Ok(())
        }
        fn close(&self) -> Result<(), ClientError> {
            self.conn.lock().take();
            Ok(())
        }
        fn name(&self) -> &str {
            &self.name
        }
        fn host(&self) -> &str {
            &self.host
        }
    }

    #[tokio::test]
    async fn registered_client_keeps_its_connection() {
        let registry = ClientRegistry::new(Logger::default());
        registry.register(Tracked::new("status", "localhost:9090")).unwrap();

        let tracked = registry.get_typed::<Tracked>("status").unwrap();
        let conn = tracked.conn.lock();
        assert_eq!(conn.as_ref().map(Connection::target), Some("http://localhost:9090"));
    }

    #[tokio::test]
    async fn close_all_releases_connections() {
        let registry = ClientRegistry::new(Logger::default());
        registry.register(Tracked::new("status", "localhost:9090")).unwrap();
        let tracked = registry.get_typed::<Tracked>("status").unwrap();

        registry.close_all();

        assert!(tracked.conn.lock().is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn debug_lists_entries_sorted() {
        let registry = ClientRegistry::new(Logger::default());
        registry.register(Tracked::new("b", "localhost:2")).unwrap();
        registry.register(Tracked::new("a", "localhost:1")).unwrap();

        let text = format!("{registry:?}");
        let a = text.find("\"a\"").unwrap();
        let b = text.find("\"b\"").unwrap();
        assert!(a < b);
    }
}
