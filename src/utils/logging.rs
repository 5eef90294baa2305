//! Logging infrastructure for pzip
//!
//! Structured logging with tracing. Standard output carries the compressed
//! stream, so every log layer writes to stderr or to a log file.

use crate::error::{PzipError, Result};
use std::error::Error;
use std::io;
use tracing::Level;
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level
    pub level: Level,
    /// Enable JSON output
    pub json_format: bool,
    /// Enable colored output
    pub colored: bool,
    /// Include file and line information
    pub include_location: bool,
    /// Include target module information
    pub include_target: bool,
    /// Span events to log
    pub span_events: FmtSpan,
    /// Log to file instead of stderr
    pub log_file: Option<std::path::PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            json_format: false,
            colored: true,
            include_location: false,
            include_target: false,
            span_events: FmtSpan::NONE,
            log_file: None,
        }
    }
}

/// Initialize logging with the given configuration
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(config.level.into())
        .from_env_lossy();

    let writer = match &config.log_file {
        Some(log_file) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)
                .map_err(|e| {
                    PzipError::io_error(
                        format!("Failed to open log file: {}", log_file.display()),
                        e,
                    )
                })?;
            tracing_subscriber::fmt::writer::BoxMakeWriter::new(std::sync::Mutex::new(file))
        }
        None => tracing_subscriber::fmt::writer::BoxMakeWriter::new(io::stderr),
    };

    let layer = if config.json_format {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(config.include_target)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_span_events(config.span_events)
            .with_writer(writer)
            .boxed()
    } else {
        let ansi = config.colored && config.log_file.is_none() && atty::is(atty::Stream::Stderr);
        tracing_subscriber::fmt::layer()
            .with_target(config.include_target)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_span_events(config.span_events)
            .with_ansi(ansi)
            .with_writer(writer)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|e| {
            PzipError::internal_error(
                format!("Failed to initialize logging: {}", e),
                Some(file!()),
            )
        })?;

    tracing::debug!("Logging initialized");
    Ok(())
}

/// Initialize simple logging for tests
pub fn init_test_logging() -> Result<()> {
    init_logging(LoggingConfig {
        level: Level::DEBUG,
        colored: false,
        include_location: true,
        include_target: true,
        ..LoggingConfig::default()
    })
}

/// Parse log level from string
pub fn parse_log_level(level_str: &str) -> Result<Level> {
    match level_str.to_lowercase().as_str() {
        "error" => Ok(Level::ERROR),
        "warn" | "warning" => Ok(Level::WARN),
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        _ => Err(PzipError::invalid_input(
            format!("Invalid log level: {}", level_str),
            Some(level_str.to_string()),
        )),
    }
}

/// Log performance metrics for a finished operation
pub fn log_performance(operation: &str, duration: std::time::Duration, bytes_processed: Option<u64>) {
    match bytes_processed {
        Some(bytes) => tracing::info!(
            operation,
            duration_ms = duration.as_millis() as u64,
            bytes_processed = bytes,
            throughput_mbps = crate::utils::compression_speed(bytes, duration),
            "Performance: {} processed {} in {}",
            operation,
            crate::utils::format_size(bytes),
            crate::utils::format_duration(duration)
        ),
        None => tracing::info!(
            operation,
            duration_ms = duration.as_millis() as u64,
            "Performance: {} completed in {}",
            operation,
            crate::utils::format_duration(duration)
        ),
    }
}

/// Log an error together with its source chain
pub fn log_error(error: &PzipError, context: Option<&str>) {
    tracing::error!(
        category = error.category(),
        context = context.unwrap_or(""),
        "Error occurred: {}",
        error
    );

    let mut source = error.source();
    let mut level = 1;
    while let Some(err) = source {
        tracing::error!("  Caused by (level {}): {}", level, err);
        source = err.source();
        level += 1;
    }
}
