//! Layered application configuration.
//!
//! Sources, lowest priority first:
//! 1. built-in defaults
//! 2. a YAML file, when one is given
//! 3. `CLIENTMGR__*` environment variables, `__` separating nested keys
//!    (`CLIENTMGR__SERVER__ADDRESS`, `CLIENTMGR__CLIENTS__STATUS__HOST`)

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clientmgr::{ClientConfig, ConfigError};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

pub const ENV_PREFIX: &str = "CLIENTMGR__";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(alias = "grpc")]
    pub server: ServerConfig,

    #[serde(alias = "logger")]
    pub logging: LoggingConfig,

    /// Client settings keyed by service kind (`status`, `greeter`).
    pub clients: BTreeMap<String, ClientConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the demo server binds to.
    pub address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:9090".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `trace`, `debug`, `info`, `warn` or `error`.
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Log file, required when `output` is `file`.
    pub path: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            path: None,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AppConfigError {
    #[error("server.address must not be empty")]
    EmptyServerAddress,

    #[error("logging.level '{0}' is not one of trace, debug, info, warn, error")]
    InvalidLevel(String),

    #[error("logging.path is required when logging.output is 'file'")]
    MissingLogPath,

    #[error("clients.{kind}: {source}")]
    Client {
        kind: String,
        #[source]
        source: ConfigError,
    },
}

impl LoggingConfig {
    /// # Errors
    /// Returns [`AppConfigError`] for an unknown level or a file output without a path.
    pub fn validate(&self) -> Result<(), AppConfigError> {
        if self.level.parse::<tracing::Level>().is_err() {
            return Err(AppConfigError::InvalidLevel(self.level.clone()));
        }
        if self.output == LogOutput::File && self.path.is_none() {
            return Err(AppConfigError::MissingLogPath);
        }
        Ok(())
    }
}

impl AppConfig {
    /// Loads configuration from defaults, the optional YAML file and the environment.
    ///
    /// # Errors
    /// Fails if the file is missing or malformed, or if the result does not validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));

        if let Some(path) = path {
            if !path.is_file() {
                bail!("config file {} does not exist", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }

        let config: AppConfig = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("failed to parse configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Checks the server and logging sections.
    ///
    /// Client sections are checked one by one with [`AppConfig::validated_client`] so that
    /// one bad client does not prevent the others from registering.
    ///
    /// # Errors
    /// Returns the first [`AppConfigError`] found.
    pub fn validate(&self) -> Result<(), AppConfigError> {
        if self.server.address.trim().is_empty() {
            return Err(AppConfigError::EmptyServerAddress);
        }
        self.logging.validate()
    }

    /// Client settings for `kind`, if present and valid.
    ///
    /// # Errors
    /// Returns [`AppConfigError::Client`] when the section exists but does not validate.
    pub fn validated_client(&self, kind: &str) -> Result<Option<&ClientConfig>, AppConfigError> {
        let Some(client) = self.clients.get(kind) else {
            return Ok(None);
        };
        client.validate().map_err(|source| AppConfigError::Client {
            kind: kind.to_owned(),
            source,
        })?;
        Ok(Some(client))
    }
}
