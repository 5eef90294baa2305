//! Parallel compression pipeline
//!
//! Orchestrates one compression run:
//!
//! 1. stat every input on the calling thread and lay out the pages,
//! 2. size the output slot array to exactly the total page count,
//! 3. start one producer (the page splitter) and the worker pool inside a
//!    thread scope sharing a bounded queue,
//! 4. join everything, then
//! 5. walk the slots in stream order, merge runs split by paging and write
//!    the records.
//!
//! Nothing is written unless every page was produced and compressed.

use super::config::PipelineConfig;
use super::pool::{OutputSlots, WorkerPool, WorkerReport};
use super::progress::ThreadSafeProgress;
use super::queue::BoundedQueue;
use super::ThreadResult;
use crate::compression::assembler::assemble_into;
use crate::compression::format::RunWriter;
use crate::compression::{PageRuns, Run};
use crate::error::PzipError;
use crate::input::splitter::SplitStats;
use crate::input::{InputSet, PageSplitter, WorkItem};
use std::io::Write;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

/// Statistics for one compression run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineStats {
    pub files: usize,
    pub empty_files: usize,
    pub total_pages: usize,
    pub input_bytes: u64,
    pub runs_emitted: u64,
    pub output_bytes: u64,
    pub workers: usize,
    pub pages_per_worker: Vec<usize>,
    pub elapsed: Duration,
}

impl PipelineStats {
    /// Space saved, as a percentage of the input (negative on expansion)
    pub fn ratio_percent(&self) -> f64 {
        crate::utils::compression_ratio(self.input_bytes, self.output_bytes)
    }

    /// Input throughput in MB/s
    pub fn throughput_mb_per_sec(&self) -> f64 {
        crate::utils::compression_speed(self.input_bytes, self.elapsed)
    }
}

/// Encoded pages plus bookkeeping from the parallel phase
struct CompressedPages {
    inputs: InputSet,
    pages: Vec<PageRuns>,
    workers: Vec<WorkerReport>,
}

/// Parallel page-granular RLE compressor
pub struct ParallelPipeline {
    config: PipelineConfig,
    pool: WorkerPool,
}

impl ParallelPipeline {
    /// Create a pipeline, validating the configuration
    pub fn new(config: PipelineConfig) -> ThreadResult<Self> {
        config
            .validate()
            .map_err(|e| PzipError::invalid_input(e, None))?;
        let pool = WorkerPool::new(config.effective_worker_count());

        Ok(Self { config, pool })
    }

    /// Pipeline configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Number of compression workers
    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }

    /// Compress the concatenation of `paths` and write the records to `writer`
    pub fn compress_files<P, W>(&self, paths: &[P], writer: W) -> ThreadResult<PipelineStats>
    where
        P: AsRef<Path>,
        W: Write,
    {
        let started = Instant::now();
        let compressed = self.compress_pages(paths)?;

        let (run_writer, runs_emitted) =
            assemble_into(&compressed.pages, RunWriter::new(writer))?;
        let output_bytes = run_writer.bytes_written();
        run_writer.finish()?;

        let stats = self.build_stats(&compressed, runs_emitted, output_bytes, started.elapsed());
        tracing::info!(
            files = stats.files,
            pages = stats.total_pages,
            runs = stats.runs_emitted,
            throughput_mbps = stats.throughput_mb_per_sec(),
            "Compressed {} into {} ({:.1}% saved) in {}",
            crate::utils::format_size(stats.input_bytes),
            crate::utils::format_size(stats.output_bytes),
            stats.ratio_percent(),
            crate::utils::format_duration(stats.elapsed)
        );
        Ok(stats)
    }

    /// Compress the concatenation of `paths` into merged logical runs
    pub fn compress_to_runs<P: AsRef<Path>>(&self, paths: &[P]) -> ThreadResult<Vec<Run>> {
        let compressed = self.compress_pages(paths)?;
        let (runs, _) = assemble_into(&compressed.pages, Vec::new())?;
        Ok(runs)
    }

    /// Pre-scan, then run the producer and the workers to completion
    fn compress_pages<P: AsRef<Path>>(&self, paths: &[P]) -> ThreadResult<CompressedPages> {
        if paths.is_empty() {
            return Err(PzipError::invalid_input("No input files given", None));
        }

        let inputs = InputSet::scan(paths, self.config.page_size)?;
        tracing::debug!(
            files = inputs.files().len(),
            pages = inputs.total_pages(),
            bytes = inputs.total_bytes(),
            page_size = inputs.page_size(),
            workers = self.pool.worker_count(),
            "Input scan complete"
        );

        let slots = OutputSlots::new(inputs.total_pages());
        let queue: BoundedQueue<WorkItem> = BoundedQueue::new(self.config.queue_capacity);
        let progress = self
            .config
            .show_progress
            .then(|| ThreadSafeProgress::new(inputs.total_bytes()));

        let (split, workers) = self.run_threads(
            &PageSplitter::new(&inputs),
            &queue,
            &slots,
            progress.as_ref(),
        )?;

        if let Some(progress) = &progress {
            progress.finish_with_message("done");
        }

        if split.pages_pushed != inputs.total_pages() {
            return Err(PzipError::internal_error(
                format!(
                    "producer pushed {} pages, expected {}",
                    split.pages_pushed,
                    inputs.total_pages()
                ),
                Some("ParallelPipeline::compress_pages"),
            ));
        }

        let pages = slots.into_pages()?;
        Ok(CompressedPages {
            inputs,
            pages,
            workers,
        })
    }

    /// Run the producer and the workers inside one thread scope and join
    /// them all
    fn run_threads(
        &self,
        splitter: &PageSplitter<'_>,
        queue: &BoundedQueue<WorkItem>,
        slots: &OutputSlots,
        progress: Option<&ThreadSafeProgress>,
    ) -> ThreadResult<(SplitStats, Vec<WorkerReport>)> {
        thread::scope(|scope| -> ThreadResult<(SplitStats, Vec<WorkerReport>)> {
            let producer = thread::Builder::new()
                .name("pzip-producer".to_string())
                .spawn_scoped(scope, || splitter.run(queue))
                .map_err(|e| {
                    PzipError::threading_error("Failed to spawn producer", Some(Box::new(e)))
                })?;

            let handles = match self.pool.spawn(scope, queue, slots, progress) {
                Ok(handles) => handles,
                Err(e) => {
                    // Unblock the producer; the scope joins it on exit.
                    queue.close();
                    return Err(e);
                }
            };

            let worker_results: Vec<ThreadResult<WorkerReport>> =
                handles.into_iter().map(|h| join_thread(h.join())).collect();
            let split = join_thread(producer.join());

            // A worker failure closes the queue, which in turn makes the
            // producer fail; report the root cause first.
            let workers = worker_results
                .into_iter()
                .collect::<ThreadResult<Vec<WorkerReport>>>()?;
            Ok((split?, workers))
        })
    }

    fn build_stats(
        &self,
        compressed: &CompressedPages,
        runs_emitted: u64,
        output_bytes: u64,
        elapsed: Duration,
    ) -> PipelineStats {
        PipelineStats {
            files: compressed.inputs.files().len(),
            empty_files: compressed.inputs.empty_files(),
            total_pages: compressed.inputs.total_pages(),
            input_bytes: compressed.inputs.total_bytes(),
            runs_emitted,
            output_bytes,
            workers: compressed.workers.len(),
            pages_per_worker: compressed.workers.iter().map(|w| w.pages).collect(),
            elapsed,
        }
    }
}

/// Flatten a thread join result, turning a panic into a threading error
fn join_thread<T>(joined: thread::Result<ThreadResult<T>>) -> ThreadResult<T> {
    joined.unwrap_or_else(|panic| {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(PzipError::threading_error(
            format!("Pipeline thread panicked: {}", message),
            None,
        ))
    })
}
