//! Threading module for parallel compression
//!
//! One producer splits the inputs into pages, a pool of workers encodes
//! them, and a bounded queue couples the two. Results land in position
//! indexed slots so the final order never depends on scheduling.

pub mod config;
pub mod pipeline;
pub mod pool;
pub mod progress;
pub mod queue;

pub use config::PipelineConfig;
pub use pipeline::{ParallelPipeline, PipelineStats};
pub use pool::{OutputSlots, WorkerPool, WorkerReport};
pub use progress::ThreadSafeProgress;
pub use queue::{BoundedQueue, QueueClosed};

use crate::error::PzipError;

/// Result type for threading operations
pub type ThreadResult<T> = Result<T, PzipError>;
