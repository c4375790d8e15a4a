use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("client config: field '{field}' must not be empty")]
    Missing { field: &'static str },

    #[error("client config '{name}': timeout must be greater than zero")]
    ZeroTimeout { name: String },
}

/// Settings for one registrable client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// `host:port` or a full URI.
    pub host: String,

    /// Registry key.
    pub name: String,

    /// Per-call deadline in seconds.
    #[serde(alias = "timeout")]
    pub timeout_secs: u64,
}

impl ClientConfig {
    pub fn new(name: impl Into<String>, host: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            host: host.into(),
            name: name.into(),
            timeout_secs,
        }
    }

    /// # Errors
    /// Returns [`ConfigError`] for a blank host or name, or a zero timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Missing { field: "host" });
        }
        if self.name.trim().is_empty() {
            return Err(ConfigError::Missing { field: "name" });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout {
                name: self.name.clone(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
