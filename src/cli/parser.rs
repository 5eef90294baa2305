//! Command line argument parsing utilities

use crate::error::{PzipError, Result};

/// Parse a worker count (0 = auto-detect)
pub fn parse_thread_count(s: &str) -> Result<u16> {
    s.parse().map_err(|_| {
        PzipError::invalid_input(format!("Invalid thread count: {}", s), Some(s.to_string()))
    })
}

/// Parse a page size in bytes (must be non-zero)
pub fn parse_page_size(s: &str) -> Result<usize> {
    parse_positive(s, "page size")
}

/// Parse a queue capacity (must be non-zero)
pub fn parse_queue_capacity(s: &str) -> Result<usize> {
    parse_positive(s, "queue capacity")
}

fn parse_positive(s: &str, what: &str) -> Result<usize> {
    let value: usize = s.parse().map_err(|_| {
        PzipError::invalid_input(format!("Invalid {}: {}", what, s), Some(s.to_string()))
    })?;

    if value == 0 {
        return Err(PzipError::invalid_input(
            format!("The {} must be greater than zero", what),
            Some(s.to_string()),
        ));
    }

    Ok(value)
}
