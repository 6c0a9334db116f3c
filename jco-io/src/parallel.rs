//! Parallel window compression
//!
//! An opt-in worker pool over the hybrid selector's window jobs using
//! `rayon`. Windows are compressed in bounded batches to cap peak memory
//! and reassembled in job order, so the output is byte-identical to the
//! sequential path regardless of pool size.

use jco_codec::hybrid::{compress_window, CompressedWindow, WindowJob};
use jco_codec::BackendRegistry;
use jco_format::Result;
use rayon::prelude::*;

/// Windows compressed per batch before results are drained.
const BATCH_WINDOWS: usize = 256;

/// Compress planned windows on the rayon pool, preserving job order.
pub fn run_windows_parallel(
    registry: &BackendRegistry,
    input: &[u8],
    jobs: &[WindowJob],
) -> Result<Vec<CompressedWindow>> {
    let mut out = Vec::with_capacity(jobs.len());
    for batch in jobs.chunks(BATCH_WINDOWS) {
        let results: Vec<Result<CompressedWindow>> = batch
            .par_iter()
            .map(|job| compress_window(registry, input, job))
            .collect();
        for result in results {
            out.push(result?);
        }
    }
    Ok(out)
}
