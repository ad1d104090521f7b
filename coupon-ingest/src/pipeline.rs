//! Two-pass coupon discovery over the gzip-compressed code dumps.
//!
//! Pass 1 builds one bloom filter per file, in parallel. Pass 2 re-streams
//! every file and probes the other files' filters; a token seen in at least
//! one other file becomes a candidate, tagged with the bit of the file it
//! was read from. Merging the per-file candidate maps and keeping tokens
//! with two or more distinct file bits yields the confirmed set.
//!
//! Memory stays bounded by the three filters plus the candidate maps; the
//! uncompressed inputs are never held in memory.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bloomfilter::Bloom;
use flate2::read::MultiGzDecoder;
use metrics::counter;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub const NUM_FILES: usize = 3;
pub const MIN_CODE_LEN: usize = 8;
pub const MAX_CODE_LEN: usize = 10;

const PROGRESS_EVERY: u64 = 10_000_000;
const LINE_BUFFER_CAPACITY: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input file {} is missing: {source}", path.display())]
    MissingInput {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("file {file}: open {}: {source}", path.display())]
    Open {
        file: usize,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("file {file}: read {}: {source}", path.display())]
    Read {
        file: usize,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("pipeline cancelled")]
    Cancelled,

    #[error("worker for file {file} panicked: {source}")]
    Join {
        file: usize,
        source: tokio::task::JoinError,
    },
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub filter_capacity: usize,
    pub filter_fpr: f64,
}

/// The fixed input set: couponbase1.gz through couponbase3.gz.
pub fn input_files(data_dir: &Path) -> Vec<PathBuf> {
    (1..=NUM_FILES)
        .map(|i| data_dir.join(format!("couponbase{i}.gz")))
        .collect()
}

fn preflight(files: &[PathBuf]) -> Result<(), PipelineError> {
    for path in files {
        std::fs::metadata(path).map_err(|source| PipelineError::MissingInput {
            path: path.clone(),
            source,
        })?;
    }
    Ok(())
}

/// Runs both passes and the merge. Returns the confirmed codes, sorted, so
/// repeated runs over the same inputs produce identical output.
pub async fn run(
    config: &PipelineConfig,
    cancel: &CancellationToken,
) -> Result<Vec<String>, PipelineError> {
    let files = input_files(&config.data_dir);
    preflight(&files)?;

    info!(files = NUM_FILES, "pass 1: building filters");
    let filters = build_filters(
        &files,
        config.filter_capacity,
        config.filter_fpr,
        cancel,
    )
    .await?;
    // Filters are complete and read-only from here on; pass 2 only probes.
    let filters = Arc::new(filters);

    info!("pass 2: finding candidate codes");
    let candidates = find_candidates(&files, filters, cancel).await?;

    let confirmed = merge_candidates(candidates);
    counter!("coupon_ingest_codes_confirmed_total").increment(confirmed.len() as u64);
    info!(count = confirmed.len(), "confirmed codes");

    Ok(confirmed)
}

async fn build_filters(
    files: &[PathBuf],
    capacity: usize,
    fpr: f64,
    cancel: &CancellationToken,
) -> Result<Vec<Bloom<str>>, PipelineError> {
    let mut handles = Vec::with_capacity(files.len());
    for (index, path) in files.iter().enumerate() {
        let path = path.clone();
        let cancel = cancel.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            let result = build_filter_for_file(index, &path, capacity, fpr, &cancel);
            if result.is_err() {
                // Take the sibling workers down with us.
                cancel.cancel();
            }
            result
        }));
    }

    join_workers(handles).await
}

fn build_filter_for_file(
    index: usize,
    path: &Path,
    capacity: usize,
    fpr: f64,
    cancel: &CancellationToken,
) -> Result<Bloom<str>, PipelineError> {
    let mut filter = Bloom::new_for_fp_rate(capacity, fpr);
    let mut count: u64 = 0;

    scan_gz_file(index, path, cancel, |code| {
        if (MIN_CODE_LEN..=MAX_CODE_LEN).contains(&code.len()) {
            filter.set(code);
            count += 1;
            if count % PROGRESS_EVERY == 0 {
                info!(file = index + 1, codes = count, "pass 1 progress");
            }
        }
    })?;

    counter!("coupon_ingest_codes_scanned_total").increment(count);
    info!(file = index + 1, total_codes = count, "pass 1 complete");

    Ok(filter)
}

async fn find_candidates(
    files: &[PathBuf],
    filters: Arc<Vec<Bloom<str>>>,
    cancel: &CancellationToken,
) -> Result<Vec<HashMap<String, u8>>, PipelineError> {
    let mut handles = Vec::with_capacity(files.len());
    for (index, path) in files.iter().enumerate() {
        let path = path.clone();
        let filters = filters.clone();
        let cancel = cancel.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            let result = find_candidates_in_file(index, &path, &filters, &cancel);
            if result.is_err() {
                cancel.cancel();
            }
            result
        }));
    }

    join_workers(handles).await
}

fn find_candidates_in_file(
    index: usize,
    path: &Path,
    filters: &[Bloom<str>],
    cancel: &CancellationToken,
) -> Result<HashMap<String, u8>, PipelineError> {
    let mut candidates: HashMap<String, u8> = HashMap::new();
    let file_bit = 1u8 << index;
    let mut count: u64 = 0;

    scan_gz_file(index, path, cancel, |code| {
        if !(MIN_CODE_LEN..=MAX_CODE_LEN).contains(&code.len()) {
            return;
        }

        count += 1;
        if count % PROGRESS_EVERY == 0 {
            info!(file = index + 1, codes = count, "pass 2 progress");
        }

        // Probe the OTHER files' filters. One hit is enough: further probes
        // cannot change this file's bit, the merge collects the rest.
        for (other, filter) in filters.iter().enumerate() {
            if other == index {
                continue;
            }
            if filter.check(code) {
                *candidates.entry(code.to_string()).or_insert(0) |= file_bit;
                break;
            }
        }
    })?;

    info!(
        file = index + 1,
        total_codes = count,
        candidates = candidates.len(),
        "pass 2 complete"
    );

    Ok(candidates)
}

/// Unions the per-file bit-sets; a code present in two or more distinct
/// files is confirmed. The bit-set is an idempotent per-file indicator, so
/// repeats within one file never double-count.
pub fn merge_candidates(results: Vec<HashMap<String, u8>>) -> Vec<String> {
    let mut merged: HashMap<String, u8> = HashMap::new();
    for candidates in results {
        for (code, mask) in candidates {
            *merged.entry(code).or_insert(0) |= mask;
        }
    }

    let mut confirmed: Vec<String> = merged
        .into_iter()
        .filter(|(_, mask)| mask.count_ones() >= 2)
        .map(|(code, _)| code)
        .collect();
    confirmed.sort();
    confirmed
}

async fn join_workers<T>(
    handles: Vec<JoinHandle<Result<T, PipelineError>>>,
) -> Result<Vec<T>, PipelineError> {
    let mut results = Vec::with_capacity(handles.len());
    let mut first_error = None;

    for (index, handle) in handles.into_iter().enumerate() {
        match handle.await {
            Ok(Ok(value)) => results.push(value),
            Ok(Err(err)) => {
                let _ = first_error.get_or_insert(err);
            }
            Err(source) => {
                let _ = first_error.get_or_insert(PipelineError::Join {
                    file: index + 1,
                    source,
                });
            }
        }
    }

    match first_error {
        None => Ok(results),
        Some(err) => Err(err),
    }
}

/// Streams a gzip file line by line, invoking `f` for each line with the
/// trailing newline stripped. The cancellation signal is polled between
/// lines so a failing sibling worker aborts this one promptly.
fn scan_gz_file(
    index: usize,
    path: &Path,
    cancel: &CancellationToken,
    mut f: impl FnMut(&str),
) -> Result<(), PipelineError> {
    let file = File::open(path).map_err(|source| PipelineError::Open {
        file: index + 1,
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = BufReader::with_capacity(LINE_BUFFER_CAPACITY, MultiGzDecoder::new(file));
    let mut line = String::new();

    loop {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        line.clear();
        let read = reader
            .read_line(&mut line)
            .map_err(|source| PipelineError::Read {
                file: index + 1,
                path: path.to_path_buf(),
                source,
            })?;
        if read == 0 {
            return Ok(());
        }

        f(line.trim_end_matches(['\r', '\n']));
    }
}
