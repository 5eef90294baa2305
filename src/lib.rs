//! pzip - parallel run-length compressor
//!
//! Treats an ordered list of files as one logical byte stream, splits it
//! into memory pages, run-length encodes the pages on a pool of worker
//! threads and writes a single stream of `(count, value)` records in which
//! runs interrupted by page or file boundaries are merged back together.

pub mod cli;
pub mod compression;
pub mod error;
pub mod input;
pub mod threading;
pub mod utils;

// Re-export main types for library usage
pub use error::{PzipError, Result};

pub use compression::{
    decompress, encode_page, PageRuns, Run, RunAssembler, RunReader, RunWriter,
};

pub use input::{InputFile, InputSet, PageSplitter, WorkItem};

pub use threading::{
    BoundedQueue, ParallelPipeline, PipelineConfig, PipelineStats, ThreadResult, WorkerPool,
};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
