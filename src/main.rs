//! pzip - parallel run-length compressor
//!
//! Main entry point for the pzip command-line application.

use pzip::cli::{Cli, LogFormat, USAGE};
use pzip::error::{PzipError, Result};
use pzip::utils::config::Config;
use pzip::utils::logging::{init_logging, parse_log_level, LoggingConfig};
use std::error::Error;
use std::process;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

fn main() {
    let exit_code = match run() {
        Ok(()) => 0,
        Err(error @ PzipError::Usage { .. }) => {
            println!("{}", error);
            error.exit_code()
        }
        Err(error) => {
            pzip::utils::logging::log_error(&error, Some("main"));

            // Logging may not be up yet, so always report on stderr too.
            eprintln!("Error: {}", error);

            let mut source = error.source();
            let mut level = 1;
            while let Some(err) = source {
                eprintln!("  Caused by ({}): {}", level, err);
                source = err.source();
                level += 1;
            }

            error.exit_code()
        }
    };

    process::exit(exit_code);
}

/// Main application logic
fn run() -> Result<()> {
    let cli = Cli::parse_args();

    if cli.files.is_empty() {
        return Err(PzipError::usage_error(USAGE));
    }

    let config = cli.load_config()?;
    setup_logging(&cli, &config)?;

    tracing::debug!("pzip v{} starting: {:?}", env!("CARGO_PKG_VERSION"), cli);

    cli.execute(&config)
}

/// Resolve the log level from CLI flags, falling back to the config default
fn log_level(cli: &Cli, config: &Config) -> Level {
    if cli.quiet {
        return Level::ERROR;
    }
    match cli.verbose {
        0 => parse_log_level(&config.output.verbose_level).unwrap_or(Level::WARN),
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Setup logging based on CLI and configuration
fn setup_logging(cli: &Cli, config: &Config) -> Result<()> {
    let json_format = cli.effective_log_format(config) == LogFormat::Json;

    let logging = LoggingConfig {
        level: log_level(cli, config),
        json_format,
        colored: config.output.color_output && !json_format,
        include_location: cli.verbose > 1,
        include_target: cli.verbose > 0,
        span_events: if cli.verbose > 2 {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        },
        log_file: cli.log_file.clone(),
    };

    init_logging(logging)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_log_level_from_flags() {
        let config = Config::default();

        let cli = Cli::try_parse_from(["pzip", "x"]).unwrap();
        assert_eq!(log_level(&cli, &config), Level::WARN);

        let cli = Cli::try_parse_from(["pzip", "-q", "x"]).unwrap();
        assert_eq!(log_level(&cli, &config), Level::ERROR);

        let cli = Cli::try_parse_from(["pzip", "-v", "x"]).unwrap();
        assert_eq!(log_level(&cli, &config), Level::INFO);

        let cli = Cli::try_parse_from(["pzip", "-vvv", "x"]).unwrap();
        assert_eq!(log_level(&cli, &config), Level::TRACE);
    }

    #[test]
    fn test_log_level_from_config() {
        let mut config = Config::default();
        config.output.verbose_level = "debug".to_string();

        let cli = Cli::try_parse_from(["pzip", "x"]).unwrap();
        assert_eq!(log_level(&cli, &config), Level::DEBUG);
    }

    #[test]
    fn test_setup_logging() {
        let cli = Cli::try_parse_from(["pzip", "--log-format", "json", "x"]).unwrap();

        // May fail if another test installed a subscriber first
        let _ = setup_logging(&cli, &Config::default());
    }
}
