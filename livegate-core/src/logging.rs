use std::fs::{File, OpenOptions};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LoggingConfig;
use crate::{Error, Result};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`. With `file_path` set,
/// output is appended to that file without ANSI colors.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let level = parse_log_level(&config.level)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let (writer, ansi) = match config.file_path.as_deref() {
        Some(path) => (BoxMakeWriter::new(Arc::new(open_append(path)?)), false),
        None => (BoxMakeWriter::new(std::io::stdout), true),
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.format.eq_ignore_ascii_case("json") {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true)
                    .with_writer(writer),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .compact()
                    .with_ansi(ansi)
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(writer),
            )
            .try_init()
    };

    installed.map_err(|e| Error::InvalidInput(format!("logging already initialized: {e}")))
}

fn open_append(path: &str) -> Result<File> {
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

fn parse_log_level(level: &str) -> Result<Level> {
    level
        .parse::<Level>()
        .or_else(|_| match level.to_ascii_lowercase().as_str() {
            "warning" => Ok(Level::WARN),
            _ => Err(Error::InvalidInput(format!("Invalid log level: {level}"))),
        })
}
