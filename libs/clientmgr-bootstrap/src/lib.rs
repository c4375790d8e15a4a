//! Process glue shared by the ClientMgr binaries.

pub mod config;
pub mod logging;
pub mod shutdown;

pub use config::{AppConfig, AppConfigError, LogFormat, LogOutput, LoggingConfig, ServerConfig};
pub use logging::{build_filter, init_logging};
pub use shutdown::shutdown_signal;
