//! Compression worker pool and the output slot array
//!
//! Workers pull pages from the shared queue, run the page-local encoder and
//! store the result at the page's absolute position. Every position is
//! written by exactly one worker and read only after all workers joined, so
//! the slot array needs no lock: each slot is a write-once cell.

use super::progress::ThreadSafeProgress;
use super::queue::BoundedQueue;
use super::ThreadResult;
use crate::compression::{encode_page, PageRuns};
use crate::error::PzipError;
use crate::input::WorkItem;
use std::sync::OnceLock;
use std::thread::{self, Scope, ScopedJoinHandle};

/// Write-once storage for the encoded runs of every page
pub struct OutputSlots {
    slots: Vec<OnceLock<PageRuns>>,
}

impl OutputSlots {
    /// Allocate exactly `total_pages` empty slots
    pub fn new(total_pages: usize) -> Self {
        Self {
            slots: (0..total_pages).map(|_| OnceLock::new()).collect(),
        }
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether there are no slots at all
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Store the runs of the page at `position`.
    ///
    /// A position outside the array or a second write to the same slot is
    /// an addressing defect and fails.
    pub fn store(&self, position: usize, runs: PageRuns) -> ThreadResult<()> {
        let slot = self.slots.get(position).ok_or_else(|| {
            PzipError::internal_error(
                format!(
                    "page position {} outside output of {} pages",
                    position,
                    self.slots.len()
                ),
                Some("OutputSlots::store"),
            )
        })?;

        slot.set(runs).map_err(|_| {
            PzipError::internal_error(
                format!("page position {} written twice", position),
                Some("OutputSlots::store"),
            )
        })
    }

    /// Take the pages in stream order, failing if any slot was never written
    pub fn into_pages(self) -> ThreadResult<Vec<PageRuns>> {
        self.slots
            .into_iter()
            .enumerate()
            .map(|(position, slot)| {
                slot.into_inner().ok_or_else(|| {
                    PzipError::internal_error(
                        format!("page position {} was never written", position),
                        Some("OutputSlots::into_pages"),
                    )
                })
            })
            .collect()
    }
}

/// What one worker did before exiting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub worker_id: usize,
    pub pages: usize,
    pub bytes: u64,
    pub runs: usize,
}

/// Shuts the queue if a worker unwinds, so the producer cannot block
/// forever on a queue nobody drains.
struct CloseOnPanic<'q, T>(&'q BoundedQueue<T>);

impl<T> Drop for CloseOnPanic<'_, T> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.close();
        }
    }
}

/// Fixed-size pool of compression workers
#[derive(Debug, Clone)]
pub struct WorkerPool {
    worker_count: usize,
}

impl WorkerPool {
    /// Create a pool of `worker_count` workers (minimum 1)
    pub fn new(worker_count: usize) -> Self {
        Self {
            worker_count: worker_count.max(1),
        }
    }

    /// Number of workers
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Spawn every worker inside `scope`.
    ///
    /// Workers run until the queue is closed and drained.
    pub fn spawn<'scope, 'env>(
        &self,
        scope: &'scope Scope<'scope, 'env>,
        queue: &'env BoundedQueue<WorkItem>,
        slots: &'env OutputSlots,
        progress: Option<&'env ThreadSafeProgress>,
    ) -> ThreadResult<Vec<ScopedJoinHandle<'scope, ThreadResult<WorkerReport>>>> {
        (0..self.worker_count)
            .map(|worker_id| {
                thread::Builder::new()
                    .name(format!("pzip-worker-{}", worker_id))
                    .spawn_scoped(scope, move || run_worker(worker_id, queue, slots, progress))
                    .map_err(|e| {
                        // Let already running workers exit.
                        queue.close();
                        PzipError::threading_error("Failed to spawn worker", Some(Box::new(e)))
                    })
            })
            .collect()
    }
}

/// Worker loop: pop, encode, store, until the queue reports no more work
fn run_worker(
    worker_id: usize,
    queue: &BoundedQueue<WorkItem>,
    slots: &OutputSlots,
    progress: Option<&ThreadSafeProgress>,
) -> ThreadResult<WorkerReport> {
    let _guard = CloseOnPanic(queue);
    let mut report = WorkerReport {
        worker_id,
        ..WorkerReport::default()
    };

    while let Some(item) = queue.pop() {
        let runs = encode_page(item.bytes());
        report.pages += 1;
        report.bytes += item.len() as u64;
        report.runs += runs.len();

        if let Err(e) = slots.store(item.position, runs) {
            queue.close();
            return Err(e);
        }

        if let Some(progress) = progress {
            progress.inc(item.len() as u64);
        }
    }

    tracing::debug!(
        worker = worker_id,
        pages = report.pages,
        bytes = report.bytes,
        "Worker finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::Run;
    use crate::input::{InputSet, PageSplitter};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_slots_store_and_collect() {
        let slots = OutputSlots::new(2);
        slots.store(1, encode_page(b"b")).unwrap();
        slots.store(0, encode_page(b"aa")).unwrap();

        let pages = slots.into_pages().unwrap();
        assert_eq!(pages[0].to_runs(), vec![Run::new(b'a', 2)]);
        assert_eq!(pages[1].to_runs(), vec![Run::new(b'b', 1)]);
    }

    #[test]
    fn test_slot_written_twice() {
        let slots = OutputSlots::new(1);
        slots.store(0, PageRuns::new()).unwrap();
        let err = slots.store(0, PageRuns::new()).unwrap_err();
        assert_eq!(err.category(), "internal");
    }

    #[test]
    fn test_slot_out_of_range() {
        let slots = OutputSlots::new(3);
        assert!(slots.store(3, PageRuns::new()).is_err());
    }

    #[test]
    fn test_missing_slot_detected() {
        let slots = OutputSlots::new(2);
        slots.store(0, PageRuns::new()).unwrap();
        let err = slots.into_pages().unwrap_err();
        assert!(err.to_string().contains("never written"));
    }

    #[test]
    fn test_pool_minimum_one_worker() {
        assert_eq!(WorkerPool::new(0).worker_count(), 1);
        assert_eq!(WorkerPool::new(6).worker_count(), 6);
    }

    #[test]
    fn test_workers_exit_on_closed_empty_queue() {
        let queue = BoundedQueue::new(4);
        let slots = OutputSlots::new(0);
        queue.close();

        let reports: Vec<WorkerReport> = thread::scope(|s| {
            let handles = WorkerPool::new(3).spawn(s, &queue, &slots, None).unwrap();
            handles
                .into_iter()
                .map(|h| h.join().unwrap().unwrap())
                .collect()
        });

        assert_eq!(reports.len(), 3);
        assert!(reports.iter().all(|r| r.pages == 0));
    }

    #[test]
    fn test_store_failure_unblocks_producer() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[b'p'; 100]).unwrap();
        file.flush().unwrap();

        // 100 pages against a queue of 2 and room for a single page.
        let inputs = InputSet::scan(&[file.path()], 1).unwrap();
        let queue = BoundedQueue::new(2);
        let slots = OutputSlots::new(1);

        let (split, workers) = thread::scope(|s| {
            let producer = s.spawn(|| PageSplitter::new(&inputs).run(&queue));
            let handles = WorkerPool::new(2).spawn(s, &queue, &slots, None).unwrap();
            let workers: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            (producer.join().unwrap(), workers)
        });

        let split_err = split.unwrap_err();
        assert_eq!(split_err.category(), "internal");
        assert!(split_err.to_string().contains("Work queue closed"));

        let failed: Vec<_> = workers.iter().filter_map(|w| w.as_ref().err()).collect();
        assert!(!failed.is_empty());
        assert!(failed
            .iter()
            .all(|e| e.to_string().contains("outside output")));
        assert!(queue.is_closed());
    }

    #[test]
    fn test_panicking_worker_closes_queue() {
        let queue = BoundedQueue::new(1);

        let (pushed, worker) = thread::scope(|s| {
            let producer = s.spawn(|| {
                let mut pushed = 0;
                for i in 0..10u32 {
                    if queue.push(i).is_err() {
                        break;
                    }
                    pushed += 1;
                }
                pushed
            });
            let worker = s.spawn(|| {
                let _guard = CloseOnPanic(&queue);
                queue.pop();
                panic!("worker failed mid-page");
            });
            let worker = worker.join();
            (producer.join().unwrap(), worker)
        });

        assert!(worker.is_err());
        assert!(queue.is_closed());
        assert!(pushed < 10);
    }

    #[test]
    fn test_guard_leaves_queue_open_on_normal_exit() {
        let queue = BoundedQueue::<u8>::new(1);
        drop(CloseOnPanic(&queue));
        assert!(!queue.is_closed());
    }
}
