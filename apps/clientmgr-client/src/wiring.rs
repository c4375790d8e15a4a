//! Builds and registers one client per configured service kind.

use clientmgr::ClientRegistry;
use clientmgr_bootstrap::AppConfig;
use greeter_sdk::GreeterClient;
use status_sdk::StatusClient;

/// Names under which each service kind ended up registered.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Registered {
    pub status: Option<String>,
    pub greeter: Option<String>,
    /// Kinds that were configured but could not be registered.
    pub failed: Vec<String>,
}

/// Validates and registers every client in `config.clients`.
///
/// A client that fails validation or registration is logged and skipped; the others
/// are still registered.
pub fn register_configured(registry: &ClientRegistry, config: &AppConfig) -> Registered {
    let mut registered = Registered::default();

    for kind in config.clients.keys() {
        let client_config = match config.validated_client(kind) {
            Ok(Some(client_config)) => client_config.clone(),
            Ok(None) => continue,
            Err(e) => {
                tracing::error!(%kind, error = %e, "invalid client configuration, skipping");
                registered.failed.push(kind.clone());
                continue;
            }
        };
        let name = client_config.name.clone();
        let logger = registry.logger().clone();

        let result = match kind.as_str() {
            status_sdk::CLIENT_KIND => registry
                .register(StatusClient::new(client_config, logger))
                .map(|()| registered.status = Some(name.clone())),
            greeter_sdk::CLIENT_KIND => registry
                .register(GreeterClient::new(client_config, logger))
                .map(|()| registered.greeter = Some(name.clone())),
            other => {
                tracing::warn!(kind = %other, "unknown client kind, skipping");
                registered.failed.push(kind.clone());
                continue;
            }
        };

        match result {
            Ok(()) => tracing::info!(%kind, %name, host = %config.clients[kind].host, "client ready"),
            Err(e) => {
                tracing::error!(%kind, %name, error = %e, "failed to register client");
                registered.failed.push(kind.clone());
            }
        }
    }

    registered
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use clientmgr::{ClientConfig, Logger};

    fn config(clients: &[(&str, ClientConfig)]) -> AppConfig {
        let mut config = AppConfig::default();
        for (kind, client) in clients {
            config.clients.insert((*kind).to_owned(), client.clone());
        }
        config
    }

    #[tokio::test]
    async fn registers_known_kinds_and_skips_the_rest() {
        let registry = ClientRegistry::new(Logger::default());
        let config = config(&[
            ("status", ClientConfig::new("status", "localhost:9090", 5)),
            ("greeter", ClientConfig::new("greeter", "localhost:9090", 5)),
            ("billing", ClientConfig::new("billing", "localhost:9191", 5)),
        ]);

        let registered = register_configured(&registry, &config);

        assert_eq!(registered.status.as_deref(), Some("status"));
        assert_eq!(registered.greeter.as_deref(), Some("greeter"));
        assert_eq!(registered.failed, vec!["billing".to_owned()]);
        assert_eq!(registry.len(), 2);
        assert!(status_sdk::get_status_client(&registry, "status").is_ok());
        assert!(greeter_sdk::get_greeter_client(&registry, "greeter").is_ok());
    }

    #[tokio::test]
    async fn invalid_client_is_never_dialed() {
        let registry = ClientRegistry::new(Logger::default());
        let config = config(&[
            ("status", ClientConfig::new("status", "localhost:9090", 0)),
            ("greeter", ClientConfig::new("greeter", "localhost:9090", 5)),
        ]);

        let registered = register_configured(&registry, &config);

        assert_eq!(registered.status, None);
        assert_eq!(registered.failed, vec!["status".to_owned()]);
        assert_eq!(registry.list_clients(), vec!["greeter".to_owned()]);
    }

    #[tokio::test]
    async fn name_clash_is_reported() {
        let registry = ClientRegistry::new(Logger::default());
        let config = config(&[
            ("status", ClientConfig::new("shared", "localhost:9090", 5)),
            ("greeter", ClientConfig::new("shared", "localhost:9090", 5)),
        ]);

        let registered = register_configured(&registry, &config);

        // BTreeMap order: greeter registers first.
        assert_eq!(registered.greeter.as_deref(), Some("shared"));
        assert_eq!(registered.status, None);
        assert_eq!(registered.failed, vec!["status".to_owned()]);
    }
}
