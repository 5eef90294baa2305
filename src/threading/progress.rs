//! Thread-safe progress tracking for the worker pool

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

/// Snapshot of pipeline progress
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressInfo {
    pub total: u64,
    pub current: u64,
    pub pages: u64,
    pub percentage: f64,
    pub throughput_mb_per_sec: f64,
}

/// Thread-safe progress tracker counting compressed bytes and pages
#[derive(Clone)]
pub struct ThreadSafeProgress {
    total: u64,
    current: Arc<AtomicU64>,
    pages: Arc<AtomicU64>,
    start_time: Instant,
    #[cfg(feature = "progress")]
    progress_bar: Option<ProgressBar>,
}

impl ThreadSafeProgress {
    /// Create a tracker that also draws a bar when stderr is a terminal
    pub fn new(total: u64) -> Self {
        #[allow(unused_mut)]
        let mut progress = Self::new_silent(total);
        #[cfg(feature = "progress")]
        {
            progress.progress_bar = Self::create_progress_bar(total);
        }
        progress
    }

    /// Create a tracker without a visual progress bar
    pub fn new_silent(total: u64) -> Self {
        Self {
            total,
            current: Arc::new(AtomicU64::new(0)),
            pages: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
            #[cfg(feature = "progress")]
            progress_bar: None,
        }
    }

    #[cfg(feature = "progress")]
    fn create_progress_bar(total: u64) -> Option<ProgressBar> {
        if !atty::is(atty::Stream::Stderr) {
            return None;
        }

        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {bytes:>9}/{total_bytes:9} {msg} ({eta})")
            .ok()?
            .progress_chars("##-");
        pb.set_style(style);
        pb.set_message("compressing");
        Some(pb)
    }

    /// Record one finished page of `bytes` bytes
    pub fn inc(&self, bytes: u64) {
        self.current.fetch_add(bytes, Ordering::Relaxed);
        self.pages.fetch_add(1, Ordering::Relaxed);

        #[cfg(feature = "progress")]
        if let Some(pb) = &self.progress_bar {
            pb.inc(bytes);
        }
    }

    /// Finish the bar, leaving a final message
    pub fn finish_with_message(&self, message: &'static str) {
        #[cfg(feature = "progress")]
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message(message);
        }
        #[cfg(not(feature = "progress"))]
        let _ = message;
    }

    /// Current progress snapshot
    pub fn get_progress(&self) -> ProgressInfo {
        let current = self.current.load(Ordering::Relaxed);
        let elapsed = self.start_time.elapsed();

        let percentage = if self.total > 0 {
            (current as f64 / self.total as f64) * 100.0
        } else {
            100.0
        };

        ProgressInfo {
            total: self.total,
            current,
            pages: self.pages.load(Ordering::Relaxed),
            percentage,
            throughput_mb_per_sec: crate::utils::compression_speed(current, elapsed),
        }
    }
}
