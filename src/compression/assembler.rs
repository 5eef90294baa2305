//! Cross-page run assembly
//!
//! Pages are encoded independently, so a run of identical bytes that
//! crosses a page boundary arrives as the last run of one page and the
//! first run of the next. The assembler walks the pages in stream order
//! with a single pending accumulator and only emits a run once the byte
//! value changes, which repairs splits across any number of consecutive
//! page or file boundaries.

use super::{PageRuns, Run, RunSink};
use crate::error::Result;

/// Merges per-page run sequences into maximal runs
pub struct RunAssembler<S: RunSink> {
    sink: S,
    pending: Option<Run>,
    runs_emitted: u64,
}

impl<S: RunSink> RunAssembler<S> {
    /// Create an assembler that emits into `sink`
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            pending: None,
            runs_emitted: 0,
        }
    }

    /// Feed the runs of the next page, in stream order
    pub fn push_page(&mut self, runs: &PageRuns) -> Result<()> {
        for run in runs.iter() {
            self.push_run(run)?;
        }
        Ok(())
    }

    /// Feed a single run
    pub fn push_run(&mut self, run: Run) -> Result<()> {
        if run.count == 0 {
            return Ok(());
        }

        match self.pending.as_mut() {
            Some(pending) if pending.value == run.value => {
                pending.count += run.count;
            }
            _ => {
                self.flush_pending()?;
                self.pending = Some(run);
            }
        }
        Ok(())
    }

    /// Flush the last accumulator and hand back the sink
    pub fn finish(mut self) -> Result<(S, u64)> {
        self.flush_pending()?;
        Ok((self.sink, self.runs_emitted))
    }

    /// Number of runs emitted so far
    pub fn runs_emitted(&self) -> u64 {
        self.runs_emitted
    }

    fn flush_pending(&mut self) -> Result<()> {
        if let Some(run) = self.pending.take() {
            self.sink.push_run(run)?;
            self.runs_emitted += 1;
        }
        Ok(())
    }
}

/// Assemble a full set of pages, in stream order, into `sink`.
///
/// Returns the sink and the number of runs it received.
pub fn assemble_into<'a, I, S>(pages: I, sink: S) -> Result<(S, u64)>
where
    I: IntoIterator<Item = &'a PageRuns>,
    S: RunSink,
{
    let mut assembler = RunAssembler::new(sink);
    for page in pages {
        assembler.push_page(page)?;
    }
    assembler.finish()
}
