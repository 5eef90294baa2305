//! Page splitter: the single producer of the pipeline
//!
//! Maps each input read-only and pushes one [`WorkItem`] per page into the
//! work queue. Items borrow the mapping through an `Arc`, so a mapping stays
//! valid until the last worker holding one of its pages has dropped it; the
//! file descriptor itself is closed as soon as the mapping exists.

use super::{InputFile, InputSet};
use crate::error::{PzipError, Result};
use crate::threading::queue::BoundedQueue;
use memmap2::{Mmap, MmapOptions};
use std::fs::File;
use std::ops::Range;
use std::sync::Arc;

/// One page of the logical stream, ready to compress.
///
/// Not `Clone`: each page is handed to exactly one worker.
///
/// ```compile_fail
/// fn duplicate<T: Clone>() {}
/// duplicate::<pzip::WorkItem>();
/// ```
#[derive(Debug)]
pub struct WorkItem {
    /// Absolute page position in the logical stream
    pub position: usize,
    mapping: Arc<Mmap>,
    range: Range<usize>,
}

impl WorkItem {
    /// The page bytes, a view into the file mapping
    pub fn bytes(&self) -> &[u8] {
        &self.mapping[self.range.clone()]
    }

    /// Usable bytes in this page
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Whether the page holds no bytes
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// What the producer pushed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitStats {
    pub files_mapped: usize,
    pub files_skipped: usize,
    pub pages_pushed: usize,
    pub bytes_pushed: u64,
}

/// Closes the queue however the producer exits, so consumers never wait
/// on a producer that is gone.
struct CloseOnDrop<'q>(&'q BoundedQueue<WorkItem>);

impl Drop for CloseOnDrop<'_> {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Splits the pre-scanned inputs into page-sized work items
pub struct PageSplitter<'a> {
    inputs: &'a InputSet,
}

impl<'a> PageSplitter<'a> {
    pub fn new(inputs: &'a InputSet) -> Self {
        Self { inputs }
    }

    /// Push every page of every input, in order, then close the queue.
    ///
    /// The queue is closed on error as well; any failure to open or map a
    /// file aborts the whole run.
    pub fn run(&self, queue: &BoundedQueue<WorkItem>) -> Result<SplitStats> {
        let _close = CloseOnDrop(queue);
        let page_size = self.inputs.page_size();
        let mut stats = SplitStats::default();

        for input in self.inputs.files() {
            if input.is_empty() {
                tracing::debug!(path = %input.path.display(), "Skipping empty input");
                stats.files_skipped += 1;
                continue;
            }

            let mapping = Arc::new(map_input(input)?);
            stats.files_mapped += 1;

            let mut offset = 0usize;
            for (index, position) in input.positions().enumerate() {
                let len = input.page_len(index, page_size);
                let item = WorkItem {
                    position,
                    mapping: Arc::clone(&mapping),
                    range: offset..offset + len,
                };
                offset += len;

                queue.push(item).map_err(|_| {
                    PzipError::internal_error(
                        "Work queue closed while pages were still being produced",
                        Some("PageSplitter::run"),
                    )
                })?;
                stats.pages_pushed += 1;
                stats.bytes_pushed += len as u64;
            }

            tracing::trace!(
                path = %input.path.display(),
                pages = input.page_count,
                "Enqueued input"
            );
        }

        tracing::debug!(
            pages = stats.pages_pushed,
            bytes = stats.bytes_pushed,
            "Producer finished"
        );
        Ok(stats)
    }
}

/// Map a whole input file read-only, checking it still matches the pre-scan
fn map_input(input: &InputFile) -> Result<Mmap> {
    let path = &input.path;
    let file = File::open(path).map_err(|e| PzipError::path_error("Cannot open input", path, e))?;

    let len = file
        .metadata()
        .map_err(|e| PzipError::path_error("Cannot stat input", path, e))?
        .len();
    if len != input.len {
        return Err(PzipError::invalid_input(
            format!(
                "Input changed size since scan ({} -> {} bytes): {}",
                input.len,
                len,
                path.display()
            ),
            Some(path.display().to_string()),
        ));
    }

    // SAFETY: the mapping is read-only. Truncating the file while it is
    // mapped is outside what this tool can guard against.
    let mapping = unsafe { MmapOptions::new().map(&file) }
        .map_err(|e| PzipError::path_error("Cannot map input", path, e))?;

    if mapping.len() as u64 != input.len {
        return Err(PzipError::internal_error(
            format!("Mapping of {} has unexpected length", path.display()),
            Some("map_input"),
        ));
    }

    Ok(mapping)
}
