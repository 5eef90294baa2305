//! Run-length compression for pzip
//!
//! Page-local run encoding, cross-page run assembly and the
//! `(i32 count, u8 value)` record format shared with the decoder.

pub mod assembler;
pub mod format;
pub mod rle;

use crate::error::Result;

pub use assembler::RunAssembler;
pub use format::{decompress, RunReader, RunWriter, RECORD_SIZE};
pub use rle::{encode_page, PageRuns};

/// A byte value repeated `count` times.
///
/// Runs merged across pages have no upper bound on their length, hence
/// `u64`. See [`PageRuns`] for the compact page-local form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Run {
    pub value: u8,
    pub count: u64,
}

impl Run {
    /// Create a new run
    pub fn new(value: u8, count: u64) -> Self {
        Self { value, count }
    }

    /// Expand the run back into bytes, appending to `out`
    pub fn expand_into(&self, out: &mut Vec<u8>) {
        out.resize(out.len() + self.count as usize, self.value);
    }
}

/// Destination for assembled runs
pub trait RunSink {
    /// Accept one logical run
    fn push_run(&mut self, run: Run) -> Result<()>;
}

impl RunSink for Vec<Run> {
    fn push_run(&mut self, run: Run) -> Result<()> {
        self.push(run);
        Ok(())
    }
}

/// Expand a run sequence into the bytes it encodes
pub fn expand_runs(runs: &[Run]) -> Vec<u8> {
    let total: u64 = runs.iter().map(|r| r.count).sum();
    let mut out = Vec::with_capacity(total as usize);
    for run in runs {
        run.expand_into(&mut out);
    }
    out
}

/// Check that no two neighbouring runs share a byte value
pub fn has_adjacent_duplicates(runs: &[Run]) -> bool {
    runs.windows(2).any(|pair| pair[0].value == pair[1].value)
}
