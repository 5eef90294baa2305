//! Command Line Interface for pzip
//!
//! `pzip file1 [file2 ...]` compresses the concatenation of the files to
//! standard output; `pzip -d file1 [file2 ...]` expands compressed streams.

pub mod commands;
pub mod parser;

pub use commands::*;
pub use parser::*;

use crate::error::{PzipError, Result};
use crate::threading::PipelineConfig;
use crate::utils::config::{Config, ConfigBuilder};
use clap::{ArgAction, Parser};
use std::io;
use std::path::PathBuf;

/// Usage line shown when no input files are given
pub const USAGE: &str = "pzip: file1 [file2 ...]";

/// pzip - parallel run-length compressor
#[derive(Parser, Debug)]
#[command(
    name = "pzip",
    version = env!("CARGO_PKG_VERSION"),
    about = "A parallel, page-granular run-length compressor",
    long_about = "pzip treats its input files as one stream, splits it into memory pages, \
                  run-length encodes the pages on all cores and writes one merged stream \
                  of (4-byte count, 1-byte value) records to standard output.\n\n\
                  EXAMPLES:\n  \
                  pzip a.txt b.txt > out.z     # Compress a.txt followed by b.txt\n  \
                  pzip -d out.z > joined.txt   # Expand a compressed stream",
    after_help = "Logs go to stderr unless --log-file is given; set RUST_LOG for fine-grained filtering."
)]
pub struct Cli {
    /// Input files, processed as one stream in the order given
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Expand compressed streams instead of compressing
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub decompress: bool,

    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, conflicts_with = "verbose", action = ArgAction::SetTrue)]
    pub quiet: bool,

    /// Log format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Configuration file path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Append logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Number of compression workers (0 = auto-detect)
    #[arg(short = 't', long = "threads", value_parser = parse_thread_count)]
    pub threads: Option<u16>,

    /// Page size in bytes (default: platform memory page size)
    #[arg(long, value_name = "BYTES", value_parser = parse_page_size)]
    pub page_size: Option<usize>,

    /// Number of pages the work queue holds
    #[arg(long, value_name = "N", value_parser = parse_queue_capacity)]
    pub queue_capacity: Option<usize>,

    /// Show a progress bar on stderr
    #[arg(long, action = ArgAction::SetTrue)]
    pub progress: bool,
}

/// Available log formats
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable output
    Human,
    /// JSON lines for log collectors
    Json,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Load layered configuration, including `--config` if given
    pub fn load_config(&self) -> Result<Config> {
        let mut builder = ConfigBuilder::new()
            .load_user_config()?
            .load_project_config()?;
        if let Some(path) = &self.config {
            builder = builder.load_file(path)?;
        }
        builder.build()
    }

    /// Effective log format: CLI flag, then config
    pub fn effective_log_format(&self, config: &Config) -> LogFormat {
        self.log_format.unwrap_or(if config.output.log_format == "json" {
            LogFormat::Json
        } else {
            LogFormat::Human
        })
    }

    /// Pipeline configuration with CLI flags applied over `config`
    pub fn pipeline_config(&self, config: &Config) -> PipelineConfig {
        let mut pipeline = config
            .pipeline_config()
            .with_progress(self.progress || config.output.progress);

        if let Some(threads) = self.threads {
            pipeline = pipeline.with_worker_count(threads as usize);
        }
        if let Some(page_size) = self.page_size {
            pipeline = pipeline.with_page_size(page_size);
        }
        if let Some(capacity) = self.queue_capacity {
            pipeline = pipeline.with_queue_capacity(capacity);
        }
        pipeline
    }

    /// Execute the parsed command, writing the result to stdout
    pub fn execute(&self, config: &Config) -> Result<()> {
        if self.files.is_empty() {
            return Err(PzipError::usage_error(USAGE));
        }

        let stdout = io::stdout();
        let out = stdout.lock();

        if self.decompress {
            let written = DecompressCommand::new(&self.files).execute(out)?;
            tracing::info!("Decompressed {}", crate::utils::format_size(written));
        } else {
            let stats = CompressCommand::new(&self.files, self.pipeline_config(config))
                .execute(out)?;
            crate::utils::logging::log_performance(
                "compress",
                stats.elapsed,
                Some(stats.input_bytes),
            );
        }
        Ok(())
    }
}
