//! End-to-end tests for the parallel compression pipeline

use pzip::compression::{decompress, expand_runs, has_adjacent_duplicates, Run};
use pzip::input::InputSet;
use pzip::threading::BoundedQueue;
use pzip::{PageSplitter, ParallelPipeline, PipelineConfig};
use std::collections::HashSet;
use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_files(dir: &TempDir, contents: &[&[u8]]) -> Vec<PathBuf> {
    contents
        .iter()
        .enumerate()
        .map(|(i, data)| {
            let path = dir.path().join(format!("part_{}.bin", i));
            fs::write(&path, data).unwrap();
            path
        })
        .collect()
}

fn pipeline(page_size: usize, workers: usize) -> ParallelPipeline {
    ParallelPipeline::new(
        PipelineConfig::new()
            .with_page_size(page_size)
            .with_worker_count(workers)
            .with_queue_capacity(4),
    )
    .unwrap()
}

fn compress_bytes(pipeline: &ParallelPipeline, paths: &[PathBuf]) -> Vec<u8> {
    let mut out = Vec::new();
    pipeline.compress_files(paths, &mut out).unwrap();
    out
}

fn record(count: i32, value: u8) -> Vec<u8> {
    let mut bytes = count.to_ne_bytes().to_vec();
    bytes.push(value);
    bytes
}

#[test]
fn test_run_spanning_three_pages_is_one_record() {
    let dir = TempDir::new().unwrap();
    let paths = write_files(&dir, &[&[b'z'; 12]]);

    let out = compress_bytes(&pipeline(4, 3), &paths);
    assert_eq!(out, record(12, b'z'));
}

#[test]
fn test_wire_format_is_native_endian_count_then_value() {
    let dir = TempDir::new().unwrap();
    let paths = write_files(&dir, &[b"aaabbbbccddddd"]);

    let out = compress_bytes(&pipeline(4, 2), &paths);

    let mut expected = Vec::new();
    expected.extend(record(3, b'a'));
    expected.extend(record(4, b'b'));
    expected.extend(record(2, b'c'));
    expected.extend(record(5, b'd'));
    assert_eq!(out, expected);
}

#[test]
fn test_runs_merge_across_file_boundaries() {
    let dir = TempDir::new().unwrap();
    let paths = write_files(&dir, &[b"aab", b"bbc", b"c"]);

    let runs = pipeline(2, 2).compress_to_runs(&paths).unwrap();
    assert_eq!(
        runs,
        vec![Run::new(b'a', 2), Run::new(b'b', 3), Run::new(b'c', 2)]
    );
}

#[test]
fn test_empty_files_are_skipped() {
    let dir = TempDir::new().unwrap();
    let with_empty = write_files(&dir, &[b"", b"xxxyy", b"", b""]);
    let single = vec![with_empty[1].clone()];

    let p = pipeline(2, 3);
    assert_eq!(compress_bytes(&p, &with_empty), compress_bytes(&p, &single));
}

#[test]
fn test_output_independent_of_worker_count() {
    let dir = TempDir::new().unwrap();
    let data: Vec<u8> = (0..20_000u32).map(|i| b"abc"[(i / 7 % 3) as usize]).collect();
    let paths = write_files(&dir, &[&data[..5_000], &data[5_000..]]);

    let reference = compress_bytes(&pipeline(64, 1), &paths);
    for workers in [2, 3, 8, 16] {
        assert_eq!(
            compress_bytes(&pipeline(64, workers), &paths),
            reference,
            "output changed with {} workers",
            workers
        );
    }

    let mut decoded = Vec::new();
    decompress(Cursor::new(reference), &mut decoded).unwrap();
    assert_eq!(decoded, data);
}

#[test]
fn test_more_workers_than_pages() {
    let dir = TempDir::new().unwrap();
    let paths = write_files(&dir, &[b"qq"]);

    let out = compress_bytes(&pipeline(4096, 32), &paths);
    assert_eq!(out, record(2, b'q'));
}

#[test]
fn test_every_position_pushed_exactly_once() {
    let dir = TempDir::new().unwrap();
    let paths = write_files(&dir, &[&[1u8; 10], b"", &[2u8; 7], &[3u8; 1]]);

    let inputs = InputSet::scan(&paths, 3).unwrap();
    assert_eq!(inputs.total_pages(), 4 + 3 + 1);

    let queue = BoundedQueue::new(inputs.total_pages());
    let stats = PageSplitter::new(&inputs).run(&queue).unwrap();
    assert_eq!(stats.pages_pushed, inputs.total_pages());
    assert!(queue.is_closed());

    let mut seen = HashSet::new();
    let mut bytes = 0;
    while let Some(item) = queue.pop() {
        assert!(item.position < inputs.total_pages());
        assert!(seen.insert(item.position), "position {} repeated", item.position);
        bytes += item.len();
    }
    assert_eq!(seen.len(), inputs.total_pages());
    assert_eq!(bytes as u64, inputs.total_bytes());
}

#[test]
fn test_large_input_with_default_page_size() {
    let dir = TempDir::new().unwrap();
    let mut data = vec![0u8; 3 * 4096 + 100];
    data[5000..9000].fill(7);
    let paths = write_files(&dir, &[&data]);

    let p = ParallelPipeline::new(PipelineConfig::default()).unwrap();
    let runs = p.compress_to_runs(&paths).unwrap();
    assert_eq!(
        runs,
        vec![Run::new(0, 5000), Run::new(7, 4000), Run::new(0, 3388)]
    );
    assert!(!has_adjacent_duplicates(&runs));
    assert_eq!(expand_runs(&runs), data);
}

#[test]
fn test_unreadable_input_fails_before_output() {
    let dir = TempDir::new().unwrap();
    let mut paths = write_files(&dir, &[b"abc"]);
    paths.insert(0, dir.path().join("does-not-exist"));

    let mut out = Vec::new();
    let err = pipeline(4, 2).compress_files(&paths, &mut out).unwrap_err();
    assert!(err.to_string().contains("does-not-exist"));
    assert!(out.is_empty());
}
