//! Pipeline configuration for parallel compression

use std::num::NonZeroUsize;

/// Default number of pages the work queue holds
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Page size used when the platform cannot report one
pub const FALLBACK_PAGE_SIZE: usize = 4096;

const MAX_PAGE_SIZE: usize = 1 << 30;
const MAX_QUEUE_CAPACITY: usize = 1 << 16;
const MAX_WORKERS: usize = 1024;

/// Configuration for the compression pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Size of one unit of work, in bytes
    pub page_size: usize,
    /// Capacity of the producer/consumer queue
    pub queue_capacity: usize,
    /// Number of compression workers (None = auto-detect)
    pub worker_count: Option<NonZeroUsize>,
    /// Drive a progress bar on stderr
    pub show_progress: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            page_size: platform_page_size(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            worker_count: None,
            show_progress: false,
        }
    }
}

impl PipelineConfig {
    /// Create a new pipeline configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page size
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    /// Set the queue capacity
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the number of workers (0 = auto-detect)
    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = NonZeroUsize::new(count);
        self
    }

    /// Enable or disable the progress bar
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    /// Worker count, falling back to the detected hardware concurrency
    pub fn effective_worker_count(&self) -> usize {
        self.worker_count
            .map(|n| n.get())
            .unwrap_or_else(|| num_cpus::get().max(1))
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), String> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(format!(
                "Page size must be between 1 and {} bytes, got {}",
                MAX_PAGE_SIZE, self.page_size
            ));
        }

        if self.queue_capacity == 0 || self.queue_capacity > MAX_QUEUE_CAPACITY {
            return Err(format!(
                "Queue capacity must be between 1 and {}, got {}",
                MAX_QUEUE_CAPACITY, self.queue_capacity
            ));
        }

        if let Some(count) = self.worker_count {
            if count.get() > MAX_WORKERS {
                return Err(format!("Worker count cannot exceed {}", MAX_WORKERS));
            }
        }

        Ok(())
    }
}

/// Memory page size reported by the operating system
#[cfg(unix)]
pub fn platform_page_size() -> usize {
    // SAFETY: sysconf has no preconditions
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 {
        size as usize
    } else {
        FALLBACK_PAGE_SIZE
    }
}

/// Memory page size reported by the operating system
#[cfg(not(unix))]
pub fn platform_page_size() -> usize {
    FALLBACK_PAGE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert!(config.worker_count.is_none());
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert!(config.page_size > 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_platform_page_size_is_power_of_two() {
        assert!(platform_page_size().is_power_of_two());
    }

    #[test]
    fn test_effective_worker_count() {
        let config = PipelineConfig::new();
        assert!(config.effective_worker_count() >= 1);

        let config = PipelineConfig::new().with_worker_count(4);
        assert_eq!(config.effective_worker_count(), 4);

        let config = PipelineConfig::new().with_worker_count(0);
        assert!(config.worker_count.is_none());
    }

    #[test]
    fn test_validation() {
        assert!(PipelineConfig::new().with_page_size(4).validate().is_ok());
        assert!(PipelineConfig::new().with_page_size(0).validate().is_err());
        assert!(PipelineConfig::new().with_queue_capacity(0).validate().is_err());
        assert!(PipelineConfig::new().with_worker_count(5000).validate().is_err());
    }
}
