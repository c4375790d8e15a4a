//! Process-wide `tracing` subscriber setup.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::config::{LogFormat, LogOutput, LoggingConfig};

/// Filter from `RUST_LOG` when set, otherwise from the configured level.
///
/// # Errors
/// Fails when the configured level is not a valid filter directive.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level)
        .with_context(|| format!("invalid log level '{}'", config.level))
}

fn file_writer(path: &Path) -> Result<(BoxMakeWriter, WorkerGuard)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("log path {} has no file name", path.display()))?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    Ok((BoxMakeWriter::new(writer), guard))
}

/// Installs the global subscriber.
///
/// Events go through a non-blocking writer; keep the returned guard alive until exit
/// or buffered events are lost.
///
/// # Errors
/// Fails on an invalid configuration, an unusable log file, or when a global subscriber
/// is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    config.validate()?;
    let filter = build_filter(config)?;

    let (writer, guard) = match config.output {
        LogOutput::Stdout => {
            let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
            (BoxMakeWriter::new(writer), guard)
        }
        LogOutput::File => {
            let path = config
                .path
                .as_deref()
                .ok_or_else(|| anyhow!("logging.path is required for file output"))?;
            file_writer(path)?
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(config.output == LogOutput::Stdout && config.format == LogFormat::Text)
        .with_target(true);

    match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    }
    .map_err(|e| anyhow!(e))
    .context("failed to install tracing subscriber")?;

    Ok(guard)
}
