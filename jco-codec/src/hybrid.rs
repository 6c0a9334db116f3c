//! Hybrid back-end selector
//!
//! Treats the post-front-end byte stream as opaque input and picks the
//! generic coder adaptively: solid mode compresses the whole input with
//! every registered back-end; windowed mode partitions the input into
//! 64 KiB windows, scouts a 4 KiB prefix of each with every back-end, and
//! compresses the window with the scout winner. When ≥90 % of windows agree
//! the selector coalesces to a single solid run of the majority coder. The
//! smaller of solid and windowed wins: solid payloads are raw bytes, while
//! windowed payloads carry the self-describing `HYB1` envelope.
//!
//! Window compression is exposed as jobs so a caller can run them on a
//! worker pool; reassembly is by window index and byte-identical to the
//! sequential path.

use crate::backend::BackendRegistry;
use jco_format::constants::{HYBRID_MAGIC, HYBRID_SCOUT_SIZE, HYBRID_WINDOW_SIZE, SOLID_MAGIC};
use jco_format::{JcoError, Limits, Result};

/// One window of input with the back-end its scout selected.
#[derive(Debug, Clone)]
pub struct WindowJob {
    /// Window index in input order.
    pub index: usize,
    /// Start offset into the input.
    pub start: usize,
    /// End offset into the input.
    pub end: usize,
    /// Tag of the back-end chosen by the scout pass.
    pub tag: u8,
}

/// A compressed window ready for the envelope.
#[derive(Debug, Clone)]
pub struct CompressedWindow {
    /// Tag of the back-end that compressed this window.
    pub tag: u8,
    /// Uncompressed window length.
    pub orig_len: u32,
    /// Compressed bytes.
    pub bytes: Vec<u8>,
}

/// Scout every window and choose a back-end for each.
pub fn plan_windows(registry: &BackendRegistry, input: &[u8]) -> Result<Vec<WindowJob>> {
    let mut jobs = Vec::with_capacity(input.len().div_ceil(HYBRID_WINDOW_SIZE));
    let mut start = 0;
    while start < input.len() {
        let end = (start + HYBRID_WINDOW_SIZE).min(input.len());
        let scout = &input[start..(start + HYBRID_SCOUT_SIZE).min(end)];

        let mut best: Option<(u8, usize)> = None;
        let mut first_err = None;
        for backend in registry.fixed_order() {
            match backend.encode(scout) {
                Ok(encoded) => {
                    let candidate = (backend.tag(), encoded.len());
                    best = Some(match best {
                        Some(current) if current.1 <= candidate.1 => current,
                        _ => candidate,
                    });
                }
                Err(e) => {
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
            }
        }

        let (tag, _) = best.ok_or_else(|| {
            first_err.unwrap_or_else(|| JcoError::BackendFailed("no backend available".to_string()))
        })?;
        jobs.push(WindowJob {
            index: jobs.len(),
            start,
            end,
            tag,
        });
        start = end;
    }
    Ok(jobs)
}

/// Compress a single planned window.
pub fn compress_window(
    registry: &BackendRegistry,
    input: &[u8],
    job: &WindowJob,
) -> Result<CompressedWindow> {
    let window = &input[job.start..job.end];
    let bytes = registry.by_tag(job.tag)?.encode(window)?;
    Ok(CompressedWindow {
        tag: job.tag,
        orig_len: window.len() as u32,
        bytes,
    })
}

/// Compress all planned windows in order on the calling thread.
pub fn run_windows_sequential(
    registry: &BackendRegistry,
    input: &[u8],
    jobs: &[WindowJob],
) -> Result<Vec<CompressedWindow>> {
    jobs.iter()
        .map(|job| compress_window(registry, input, job))
        .collect()
}

/// Build the self-describing windowed envelope.
pub fn build_envelope(windows: &[CompressedWindow]) -> Result<Vec<u8>> {
    let window_count = u32::try_from(windows.len())
        .map_err(|_| JcoError::Internal("window count exceeds u32".to_string()))?;

    let mut out = Vec::with_capacity(8 + windows.iter().map(|w| 9 + w.bytes.len()).sum::<usize>());
    out.extend_from_slice(&HYBRID_MAGIC);
    out.extend_from_slice(&window_count.to_le_bytes());
    for window in windows {
        let comp_len = u32::try_from(window.bytes.len())
            .map_err(|_| JcoError::Internal("window exceeds u32 length".to_string()))?;
        out.push(window.tag);
        out.extend_from_slice(&window.orig_len.to_le_bytes());
        out.extend_from_slice(&comp_len.to_le_bytes());
        out.extend_from_slice(&window.bytes);
    }
    Ok(out)
}

/// Compress with the hybrid selector, running windows sequentially.
pub fn compress_hybrid(registry: &BackendRegistry, input: &[u8]) -> Result<Vec<u8>> {
    compress_hybrid_with(registry, input, &run_windows_sequential)
}

/// Compress with the hybrid selector using a caller-supplied window runner
/// (e.g. a worker pool). The runner must return one compressed window per
/// job, in job order.
pub fn compress_hybrid_with(
    registry: &BackendRegistry,
    input: &[u8],
    runner: &dyn Fn(&BackendRegistry, &[u8], &[WindowJob]) -> Result<Vec<CompressedWindow>>,
) -> Result<Vec<u8>> {
    if input.is_empty() {
        return Ok(Vec::new());
    }

    // Solid mode: every back-end over the whole input.
    let mut solids: Vec<(u8, Vec<u8>)> = Vec::new();
    let mut first_err = None;
    for backend in registry.fixed_order() {
        match backend.encode(input) {
            Ok(bytes) => solids.push((backend.tag(), bytes)),
            Err(e) => {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
    }
    if solids.is_empty() {
        return Err(first_err
            .unwrap_or_else(|| JcoError::BackendFailed("no backend available".to_string())));
    }
    let best_solid = solids
        .iter()
        .min_by_key(|(_, bytes)| bytes.len())
        .map(|(tag, bytes)| (*tag, bytes.clone()))
        .unwrap_or_else(|| (0, Vec::new()));

    // Windowed mode.
    let jobs = plan_windows(registry, input)?;
    let windows = runner(registry, input, &jobs)?;
    if windows.len() != jobs.len() {
        return Err(JcoError::Internal(
            "window runner returned wrong window count".to_string(),
        ));
    }
    let mut windowed_candidate = build_envelope(&windows)?;

    // Coalescing: if >= 90% of windows agree, a single solid run of the
    // majority coder may beat the per-window overhead.
    let mut tag_counts: Vec<(u8, usize)> = Vec::new();
    for job in &jobs {
        match tag_counts.iter_mut().find(|(tag, _)| *tag == job.tag) {
            Some((_, count)) => *count += 1,
            None => tag_counts.push((job.tag, 1)),
        }
    }
    if let Some(&(majority_tag, majority_count)) =
        tag_counts.iter().max_by_key(|(_, count)| *count)
    {
        if majority_count * 10 >= jobs.len() * 9 {
            if let Some((_, coalesced)) = solids.iter().find(|(tag, _)| *tag == majority_tag) {
                if coalesced.len() < windowed_candidate.len() {
                    log::debug!(
                        "hybrid coalesced {}/{} windows to tag {majority_tag}",
                        majority_count,
                        jobs.len()
                    );
                    windowed_candidate = coalesced.clone();
                }
            }
        }
    }

    // Solid vs windowed: pick the smaller overall. Solid payloads are raw
    // bytes with no inner magic.
    if best_solid.1.len() <= windowed_candidate.len() {
        log::debug!(
            "hybrid picked solid tag {} ({} bytes)",
            best_solid.0,
            best_solid.1.len()
        );
        Ok(best_solid.1)
    } else {
        log::debug!(
            "hybrid picked windowed payload ({} windows, {} bytes)",
            jobs.len(),
            windowed_candidate.len()
        );
        Ok(windowed_candidate)
    }
}

/// Decode a hybrid payload: a `HYB1` envelope, a legacy `SOLID` prefix, or
/// raw solid bytes probed against each registered back-end in fixed order.
pub fn decode_hybrid(registry: &BackendRegistry, body: &[u8], limits: &Limits) -> Result<Vec<u8>> {
    if body.len() >= 8 && body[0..4] == HYBRID_MAGIC {
        return decode_windowed(registry, body, limits);
    }
    if body.len() >= 6 && body[0..5] == SOLID_MAGIC {
        let tag = body[5];
        return registry.by_tag(tag)?.decode(&body[6..]);
    }

    let mut first_err = None;
    for backend in registry.fixed_order() {
        match backend.decode(body) {
            Ok(decoded) => return Ok(decoded),
            Err(e) => {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
    }
    Err(first_err
        .unwrap_or_else(|| JcoError::BackendFailed("no backend could decode payload".to_string())))
}

fn decode_windowed(registry: &BackendRegistry, body: &[u8], limits: &Limits) -> Result<Vec<u8>> {
    let window_count =
        u32::from_le_bytes([body[4], body[5], body[6], body[7]]) as usize;
    if window_count > limits.max_windows {
        return Err(JcoError::LimitExceeded(format!(
            "window count {} exceeds limit {}",
            window_count, limits.max_windows
        )));
    }

    let mut out = Vec::new();
    let mut cursor = 8;
    for _ in 0..window_count {
        if cursor + 9 > body.len() {
            return Err(JcoError::ContainerCorrupt(
                "truncated windowed payload".to_string(),
            ));
        }
        let tag = body[cursor];
        let orig_len = u32::from_le_bytes([
            body[cursor + 1],
            body[cursor + 2],
            body[cursor + 3],
            body[cursor + 4],
        ]) as usize;
        let comp_len = u32::from_le_bytes([
            body[cursor + 5],
            body[cursor + 6],
            body[cursor + 7],
            body[cursor + 8],
        ]) as usize;
        cursor += 9;

        if orig_len > limits.max_window_bytes {
            return Err(JcoError::LimitExceeded(format!(
                "window size {} exceeds limit {}",
                orig_len, limits.max_window_bytes
            )));
        }
        let end = cursor
            .checked_add(comp_len)
            .ok_or_else(|| JcoError::ContainerCorrupt("window length overflow".to_string()))?;
        if end > body.len() {
            return Err(JcoError::ContainerCorrupt(
                "truncated windowed payload".to_string(),
            ));
        }

        let decoded = registry.by_tag(tag)?.decode(&body[cursor..end])?;
        if decoded.len() != orig_len {
            return Err(JcoError::ContainerCorrupt(format!(
                "window decoded to {} bytes, expected {orig_len}",
                decoded.len()
            )));
        }
        out.extend_from_slice(&decoded);
        cursor = end;
    }

    if cursor != body.len() {
        return Err(JcoError::ContainerCorrupt(
            "trailing bytes after windowed payload".to_string(),
        ));
    }
    Ok(out)
}
