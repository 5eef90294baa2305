//! Page-local run-length encoding

use super::Run;

/// Encoded runs of one page, stored as parallel value and count arrays.
///
/// Pages stay in memory until every worker has joined, so each run costs
/// five bytes here instead of a full [`Run`]. A page-local count never
/// exceeds the page size; counts are widened to `u64` only when runs are
/// merged across pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRuns {
    values: Vec<u8>,
    counts: Vec<u32>,
}

impl PageRuns {
    /// Create an empty run sequence
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, value: u8, count: u32) {
        self.values.push(value);
        self.counts.push(count);
    }

    /// Number of runs
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the page produced no runs
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The runs in page order
    pub fn iter(&self) -> impl Iterator<Item = Run> + '_ {
        self.values
            .iter()
            .zip(&self.counts)
            .map(|(&value, &count)| Run::new(value, count as u64))
    }

    /// Copy the runs out as [`Run`]s
    pub fn to_runs(&self) -> Vec<Run> {
        self.iter().collect()
    }

    /// Heap bytes held by this sequence, including spare capacity
    pub fn retained_bytes(&self) -> usize {
        self.values.capacity() + self.counts.capacity() * std::mem::size_of::<u32>()
    }

    /// Release spare capacity left over from encoding
    pub fn shrink_to_fit(&mut self) {
        self.values.shrink_to_fit();
        self.counts.shrink_to_fit();
    }
}

/// Encode one page into its run sequence.
///
/// A new run starts whenever the byte differs from the previous one, so the
/// result never holds two adjacent runs with the same value and the counts
/// sum to `page.len()`. A run longer than `u32::MAX` bytes is the one
/// exception: it is split into several runs of the same value.
pub fn encode_page(page: &[u8]) -> PageRuns {
    let mut runs = PageRuns::new();
    let mut bytes = page.iter().copied();

    let Some(first) = bytes.next() else {
        return runs;
    };

    let (mut value, mut count) = (first, 1u32);
    for byte in bytes {
        if byte == value && count < u32::MAX {
            count += 1;
        } else {
            runs.push(value, count);
            value = byte;
            count = 1;
        }
    }
    runs.push(value, count);
    runs.shrink_to_fit();
    runs
}
