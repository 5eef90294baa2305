//! Compressed stream format
//!
//! A stream is a bare sequence of 5-byte records: a native-endian `i32`
//! repeat count followed by the byte value. There is no header, trailer or
//! length prefix; the decoder reads records until end of input.

use super::{Run, RunSink};
use crate::error::{PzipError, Result};
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};

/// Size of one encoded record
pub const RECORD_SIZE: usize = 4 + 1;

/// Largest count a single record can carry
pub const MAX_RECORD_COUNT: u64 = i32::MAX as u64;

/// Writes runs as `(i32, u8)` records
pub struct RunWriter<W: Write> {
    inner: BufWriter<W>,
    records_written: u64,
}

impl<W: Write> RunWriter<W> {
    /// Wrap a writer
    pub fn new(writer: W) -> Self {
        Self {
            inner: BufWriter::new(writer),
            records_written: 0,
        }
    }

    /// Write a single run.
    ///
    /// Counts above `i32::MAX` are split into consecutive records.
    pub fn write_run(&mut self, run: Run) -> Result<()> {
        let mut remaining = run.count;
        while remaining > 0 {
            let chunk = remaining.min(MAX_RECORD_COUNT);
            self.write_record(chunk as i32, run.value)?;
            remaining -= chunk;
        }
        Ok(())
    }

    fn write_record(&mut self, count: i32, value: u8) -> Result<()> {
        let mut record = [0u8; RECORD_SIZE];
        record[..4].copy_from_slice(&count.to_ne_bytes());
        record[4] = value;
        self.inner
            .write_all(&record)
            .map_err(|e| PzipError::io_error("Failed to write compressed record", e))?;
        self.records_written += 1;
        Ok(())
    }

    /// Number of records written
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Bytes written so far
    pub fn bytes_written(&self) -> u64 {
        self.records_written * RECORD_SIZE as u64
    }

    /// Flush buffered records and return the underlying writer
    pub fn finish(self) -> Result<W> {
        self.inner
            .into_inner()
            .map_err(|e| PzipError::io_error("Failed to flush compressed output", e.into_error()))
    }
}

impl<W: Write> RunSink for RunWriter<W> {
    fn push_run(&mut self, run: Run) -> Result<()> {
        self.write_run(run)
    }
}

/// Reads `(i32, u8)` records until end of input
pub struct RunReader<R: Read> {
    inner: BufReader<R>,
    offset: u64,
}

impl<R: Read> RunReader<R> {
    /// Wrap a reader
    pub fn new(reader: R) -> Self {
        Self {
            inner: BufReader::new(reader),
            offset: 0,
        }
    }

    /// Read the next run, `None` at a clean end of input
    pub fn read_run(&mut self) -> Result<Option<Run>> {
        let mut record = [0u8; RECORD_SIZE];
        let filled = read_full(&mut self.inner, &mut record)
            .map_err(|e| PzipError::io_error("Failed to read compressed record", e))?;

        match filled {
            0 => return Ok(None),
            RECORD_SIZE => {}
            partial => {
                return Err(PzipError::format_error(
                    format!("truncated record: {} of {} bytes", partial, RECORD_SIZE),
                    Some(self.offset),
                ));
            }
        }

        let mut count_bytes = [0u8; 4];
        count_bytes.copy_from_slice(&record[..4]);
        let count = i32::from_ne_bytes(count_bytes);
        if count < 0 {
            return Err(PzipError::format_error(
                format!("negative run count {}", count),
                Some(self.offset),
            ));
        }

        self.offset += RECORD_SIZE as u64;
        Ok(Some(Run::new(record[4], count as u64)))
    }
}

impl<R: Read> Iterator for RunReader<R> {
    type Item = Result<Run>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_run().transpose()
    }
}

/// Fill `buf` as far as the reader allows, returning the byte count
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Expand a compressed stream, returning the number of bytes written
pub fn decompress<R: Read, W: Write>(reader: R, writer: W) -> Result<u64> {
    const CHUNK: usize = 64 * 1024;

    let mut out = BufWriter::new(writer);
    let mut chunk = vec![0u8; CHUNK];
    let mut fill_value = 0u8;
    let mut total = 0u64;

    for run in RunReader::new(reader) {
        let run = run?;
        if run.value != fill_value {
            chunk.fill(run.value);
            fill_value = run.value;
        }

        let mut remaining = run.count;
        while remaining > 0 {
            let n = remaining.min(CHUNK as u64) as usize;
            out.write_all(&chunk[..n])
                .map_err(|e| PzipError::io_error("Failed to write decompressed output", e))?;
            remaining -= n as u64;
        }
        total += run.count;
    }

    out.flush()
        .map_err(|e| PzipError::io_error("Failed to flush decompressed output", e))?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode(runs: &[Run]) -> Vec<u8> {
        let mut writer = RunWriter::new(Vec::new());
        for &run in runs {
            writer.write_run(run).unwrap();
        }
        writer.finish().unwrap()
    }

    #[test]
    fn test_record_layout() {
        let bytes = encode(&[Run::new(b'a', 3)]);
        assert_eq!(bytes.len(), RECORD_SIZE);
        assert_eq!(&bytes[..4], &3i32.to_ne_bytes());
        assert_eq!(bytes[4], b'a');
    }

    #[test]
    fn test_oversized_run_is_split() {
        let mut writer = RunWriter::new(Vec::new());
        writer.write_run(Run::new(b'q', MAX_RECORD_COUNT + 5)).unwrap();
        assert_eq!(writer.records_written(), 2);

        let bytes = writer.finish().unwrap();
        let runs: Vec<Run> = RunReader::new(Cursor::new(bytes))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(
            runs,
            vec![Run::new(b'q', MAX_RECORD_COUNT), Run::new(b'q', 5)]
        );
    }

    #[test]
    fn test_read_empty_stream() {
        let mut reader = RunReader::new(Cursor::new(Vec::new()));
        assert!(reader.read_run().unwrap().is_none());
    }

    #[test]
    fn test_truncated_record() {
        let mut bytes = encode(&[Run::new(b'a', 1), Run::new(b'b', 2)]);
        bytes.pop();

        let mut reader = RunReader::new(Cursor::new(bytes));
        assert!(reader.read_run().unwrap().is_some());
        let err = reader.read_run().unwrap_err();
        assert_eq!(err.category(), "format");
    }

    #[test]
    fn test_negative_count_rejected() {
        let mut bytes = (-1i32).to_ne_bytes().to_vec();
        bytes.push(b'x');

        let err = RunReader::new(Cursor::new(bytes)).read_run().unwrap_err();
        assert!(err.to_string().contains("negative"));
    }

    #[test]
    fn test_decompress() {
        let bytes = encode(&[Run::new(b'h', 2), Run::new(b'i', 1), Run::new(b'!', 0)]);

        let mut out = Vec::new();
        let written = decompress(Cursor::new(bytes), &mut out).unwrap();
        assert_eq!(written, 3);
        assert_eq!(out, b"hhi");
    }

    #[test]
    fn test_decompress_long_run() {
        let bytes = encode(&[Run::new(7, 200_000)]);

        let mut out = Vec::new();
        decompress(Cursor::new(bytes), &mut out).unwrap();
        assert_eq!(out.len(), 200_000);
        assert!(out.iter().all(|&b| b == 7));
    }
}
