//! Command implementations for the pzip CLI

use crate::compression::decompress;
use crate::error::{PzipError, Result};
use crate::threading::{ParallelPipeline, PipelineConfig, PipelineStats};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

/// Compress the concatenation of the inputs
pub struct CompressCommand<'a> {
    files: &'a [PathBuf],
    config: PipelineConfig,
}

impl<'a> CompressCommand<'a> {
    pub fn new(files: &'a [PathBuf], config: PipelineConfig) -> Self {
        Self { files, config }
    }

    /// Run the pipeline, writing the compressed stream to `out`
    pub fn execute<W: Write>(&self, out: W) -> Result<PipelineStats> {
        let pipeline = ParallelPipeline::new(self.config.clone())?;
        tracing::debug!(
            files = self.files.len(),
            workers = pipeline.worker_count(),
            page_size = self.config.page_size,
            queue_capacity = self.config.queue_capacity,
            "Starting compression"
        );
        pipeline.compress_files(self.files, out)
    }
}

/// Expand compressed streams, one after another
pub struct DecompressCommand<'a> {
    files: &'a [PathBuf],
}

impl<'a> DecompressCommand<'a> {
    pub fn new(files: &'a [PathBuf]) -> Self {
        Self { files }
    }

    /// Decode every input in order into `out`, returning the bytes written
    pub fn execute<W: Write>(&self, mut out: W) -> Result<u64> {
        let mut total = 0u64;
        for path in self.files {
            let file = File::open(path)
                .map_err(|e| PzipError::path_error("Cannot open compressed input", path, e))?;
            let written = decompress(file, &mut out).map_err(|e| match e {
                PzipError::Format { message, offset } => PzipError::format_error(
                    format!("{}: {}", path.display(), message),
                    offset,
                ),
                other => other,
            })?;
            tracing::debug!(path = %path.display(), bytes = written, "Decompressed input");
            total += written;
        }
        out.flush()
            .map_err(|e| PzipError::io_error("Failed to flush output", e))?;
        Ok(total)
    }
}
