//! Input files and their page layout
//!
//! Before any thread starts, every input path is stat'ed once to learn its
//! length. That pre-scan fixes the page count of each file and therefore
//! the absolute position of every page in the logical stream: page `p` of
//! file `i` lives at `sum(page_count[0..i]) + p`. The total page count sizes
//! the output slot array exactly.

pub mod splitter;

pub use splitter::{PageSplitter, WorkItem};

use crate::error::{PzipError, Result};
use std::path::{Path, PathBuf};

/// One input file as seen by the pre-scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    /// Length in bytes at scan time
    pub len: u64,
    /// `ceil(len / page_size)`, 0 for an empty file
    pub page_count: usize,
    /// Usable bytes in the final page (0 for an empty file)
    pub last_page_len: usize,
    /// Absolute position of this file's first page
    pub first_page: usize,
}

impl InputFile {
    /// Describe a file of `len` bytes whose first page sits at `first_page`
    pub fn new(path: PathBuf, len: u64, page_size: usize, first_page: usize) -> Self {
        let page = page_size as u64;
        let page_count = len.div_ceil(page) as usize;
        let last_page_len = match len % page {
            0 if len == 0 => 0,
            0 => page_size,
            rem => rem as usize,
        };

        Self {
            path,
            len,
            page_count,
            last_page_len,
            first_page,
        }
    }

    /// Whether the file contributes nothing to the stream
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Length of page `index` within this file
    pub fn page_len(&self, index: usize, page_size: usize) -> usize {
        if index + 1 == self.page_count {
            self.last_page_len
        } else {
            page_size
        }
    }

    /// Absolute positions covered by this file
    pub fn positions(&self) -> std::ops::Range<usize> {
        self.first_page..self.first_page + self.page_count
    }
}

/// The ordered set of inputs forming one logical stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSet {
    files: Vec<InputFile>,
    page_size: usize,
    total_pages: usize,
    total_bytes: u64,
}

impl InputSet {
    /// Stat every path in order and compute the page layout.
    ///
    /// Fails if any path cannot be stat'ed or is not a regular file.
    pub fn scan<P: AsRef<Path>>(paths: &[P], page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(PzipError::invalid_input("Page size must be non-zero", None));
        }

        let mut files = Vec::with_capacity(paths.len());
        let mut next_page = 0usize;
        let mut total_bytes = 0u64;

        for path in paths {
            let path = path.as_ref();
            let metadata = std::fs::metadata(path)
                .map_err(|e| PzipError::path_error("Cannot stat input", path, e))?;

            if !metadata.is_file() {
                return Err(PzipError::invalid_input(
                    format!("Not a regular file: {}", path.display()),
                    Some(path.display().to_string()),
                ));
            }

            let file = InputFile::new(path.to_path_buf(), metadata.len(), page_size, next_page);
            tracing::trace!(
                path = %path.display(),
                len = file.len,
                pages = file.page_count,
                first_page = file.first_page,
                "Scanned input"
            );

            next_page += file.page_count;
            total_bytes += file.len;
            files.push(file);
        }

        Ok(Self {
            files,
            page_size,
            total_pages: next_page,
            total_bytes,
        })
    }

    /// Files in argument order
    pub fn files(&self) -> &[InputFile] {
        &self.files
    }

    /// Page size the layout was computed with
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages across all files
    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    /// Length of the logical stream
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Number of zero-length inputs
    pub fn empty_files(&self) -> usize {
        self.files.iter().filter(|f| f.is_empty()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_page_math() {
        let file = InputFile::new(PathBuf::from("a"), 14, 4, 0);
        assert_eq!(file.page_count, 4);
        assert_eq!(file.last_page_len, 2);
        assert_eq!(file.page_len(0, 4), 4);
        assert_eq!(file.page_len(3, 4), 2);

        let exact = InputFile::new(PathBuf::from("b"), 12, 4, 0);
        assert_eq!(exact.page_count, 3);
        assert_eq!(exact.last_page_len, 4);

        let empty = InputFile::new(PathBuf::from("c"), 0, 4, 9);
        assert_eq!(empty.page_count, 0);
        assert_eq!(empty.last_page_len, 0);
        assert!(empty.positions().is_empty());
    }

    #[test]
    fn test_scan_layout() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        let empty = dir.path().join("empty");
        let b = dir.path().join("b");
        std::fs::write(&a, vec![1u8; 10]).unwrap();
        std::fs::write(&empty, b"").unwrap();
        std::fs::write(&b, vec![2u8; 8]).unwrap();

        let set = InputSet::scan(&[&a, &empty, &b], 4).unwrap();
        assert_eq!(set.total_pages(), 3 + 0 + 2);
        assert_eq!(set.total_bytes(), 18);
        assert_eq!(set.empty_files(), 1);

        let files = set.files();
        assert_eq!(files[0].positions(), 0..3);
        assert_eq!(files[1].positions(), 3..3);
        assert_eq!(files[2].positions(), 3..5);
    }

    #[test]
    fn test_positions_are_a_bijection() {
        let dir = TempDir::new().unwrap();
        let lens = [0usize, 1, 7, 8, 9, 0, 33];
        let paths: Vec<_> = lens
            .iter()
            .enumerate()
            .map(|(i, &len)| {
                let path = dir.path().join(format!("f{}", i));
                std::fs::write(&path, vec![0u8; len]).unwrap();
                path
            })
            .collect();

        let set = InputSet::scan(&paths, 8).unwrap();
        let positions: Vec<usize> = set.files().iter().flat_map(|f| f.positions()).collect();
        assert_eq!(positions, (0..set.total_pages()).collect::<Vec<_>>());
    }

    #[test]
    fn test_scan_missing_file() {
        let err = InputSet::scan(&["/no/such/input/file"], 4096).unwrap_err();
        assert_eq!(err.category(), "io");
        assert!(err.to_string().contains("/no/such/input/file"));
    }

    #[test]
    fn test_scan_rejects_directory() {
        let dir = TempDir::new().unwrap();
        let err = InputSet::scan(&[dir.path()], 4096).unwrap_err();
        assert_eq!(err.category(), "input");
    }
}
