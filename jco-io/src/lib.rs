//! JCO I/O - High-level compression and decompression APIs
//!
//! Four entry points mirror the public surface of the format:
//!
//! - [`compress`] / [`decompress`]: whole-JSON documents (canonicalised)
//! - [`compress_ndjson`] / [`decompress_ndjson`]: NDJSON streams, with the
//!   columnar front-end and selective field decode
//!
//! Every call flows its configuration through explicit options structs;
//! there is no process-wide state and the default codec is always `hybrid`.
//! The `*_with_registry` variants accept a caller-owned back-end registry
//! for runtime-registered extra coders.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod parallel;

pub use jco_codec::{Backend, BackendRegistry, CodecChoice};
pub use jco_format::{ContainerHeader, JcoError, Limits, Result};

use jco_codec::canonical::canonicalize_document;
use jco_codec::decode::{decode_columnar, is_columnar};
use jco_codec::hybrid::{compress_hybrid_with, decode_hybrid, run_windows_sequential};
use jco_codec::rowwise::{encode_rowwise, project_rowwise};
use jco_codec::shape::{encode_columnar, ColumnarOutcome};
use jco_format::container;
use serde_json::{Map, Value};

/// Options for the single-document path.
#[derive(Default)]
pub struct CompressOptions {
    /// Back-end selection; defaults to `hybrid`.
    pub codec: CodecChoice,
    /// Compress hybrid windows on the rayon pool.
    pub parallel: bool,
    /// Opaque options recorded in the container header.
    pub options: Map<String, Value>,
}

/// Policy hint for NDJSON compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Timestamp/enum-heavy log streams. Accepted as a hint; the baseline
    /// encoder applies the same deterministic column selection either way.
    Logs,
}

/// Options for the NDJSON path.
#[derive(Default)]
pub struct NdjsonOptions {
    /// Back-end selection; defaults to `hybrid`.
    pub codec: CodecChoice,
    /// Activate the columnar front-end.
    pub columnar: bool,
    /// Input-shape hint.
    pub profile: Option<Profile>,
    /// Compress hybrid windows on the rayon pool.
    pub parallel: bool,
    /// Opaque options recorded in the container header.
    pub options: Map<String, Value>,
}

/// Options for decode operations.
#[derive(Default)]
pub struct DecodeOptions {
    /// Field names for selective decode; empty means full decode.
    pub fields: Vec<String>,
    /// Decode-side security limits.
    pub limits: Limits,
}

fn codec_name(registry: &BackendRegistry, choice: &CodecChoice) -> Result<String> {
    match choice {
        CodecChoice::Hybrid => Ok("hybrid".to_string()),
        CodecChoice::Fast => Ok("fast".to_string()),
        CodecChoice::Dense => Ok("dense".to_string()),
        CodecChoice::Identity => Ok("identity".to_string()),
        CodecChoice::Named(name) => registry
            .by_name(name)
            .map(|backend| backend.name().to_string())
            .ok_or_else(|| JcoError::HeaderInvalid(format!("codec {name} not recognised"))),
    }
}

fn run_backend(
    registry: &BackendRegistry,
    choice: &CodecChoice,
    input: &[u8],
    parallel: bool,
) -> Result<(String, Vec<u8>)> {
    let name = codec_name(registry, choice)?;
    if input.is_empty() {
        return Ok((name, Vec::new()));
    }
    let body = match choice {
        CodecChoice::Hybrid => {
            if parallel {
                compress_hybrid_with(registry, input, &parallel::run_windows_parallel)?
            } else {
                compress_hybrid_with(registry, input, &run_windows_sequential)?
            }
        }
        CodecChoice::Identity => input.to_vec(),
        CodecChoice::Fast | CodecChoice::Dense | CodecChoice::Named(_) => registry
            .by_name(&name)
            .ok_or_else(|| JcoError::HeaderInvalid(format!("codec {name} not recognised")))?
            .encode(input)?,
    };
    Ok((name, body))
}

fn wrap_container(
    codec_ran: &str,
    ndjson: bool,
    options: &Map<String, Value>,
    body: &[u8],
) -> Result<Vec<u8>> {
    let mut header = ContainerHeader::new(codec_ran, ndjson);
    header.options = options.clone();
    // The header must tell the truth about the back-end that actually ran;
    // a mismatch is a programmer error, not an input error.
    assert_eq!(header.codec, codec_ran, "header codec must match the backend that ran");
    container::wrap(&header, body)
}

fn decode_body(
    registry: &BackendRegistry,
    header: &ContainerHeader,
    body: &[u8],
    limits: &Limits,
) -> Result<Vec<u8>> {
    if body.is_empty() {
        return Ok(Vec::new());
    }
    match header.codec.as_str() {
        "identity" => Ok(body.to_vec()),
        "hybrid" => decode_hybrid(registry, body, limits),
        name => registry
            .by_name(name)
            .ok_or_else(|| JcoError::HeaderInvalid(format!("codec {name} not recognised")))?
            .decode(body),
    }
}

fn body_to_text(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes)
        .map_err(|_| JcoError::ContainerCorrupt("payload is not UTF-8".to_string()))
}

/// Compress a single JSON document into a container.
pub fn compress(json_text: &str, opts: &CompressOptions) -> Result<Vec<u8>> {
    compress_with_registry(&BackendRegistry::new(), json_text, opts)
}

/// [`compress`] with a caller-owned back-end registry.
pub fn compress_with_registry(
    registry: &BackendRegistry,
    json_text: &str,
    opts: &CompressOptions,
) -> Result<Vec<u8>> {
    let canonical = canonicalize_document(json_text)?;
    let (name, body) = run_backend(registry, &opts.codec, canonical.as_bytes(), opts.parallel)?;
    wrap_container(&name, false, &opts.options, &body)
}

/// Decompress a single-document container back to canonical JSON text.
pub fn decompress(container_bytes: &[u8]) -> Result<String> {
    decompress_with_registry(&BackendRegistry::new(), container_bytes, &Limits::default())
}

/// [`decompress`] with a caller-owned registry and limits.
pub fn decompress_with_registry(
    registry: &BackendRegistry,
    container_bytes: &[u8],
    limits: &Limits,
) -> Result<String> {
    let (header, body) = container::unwrap(container_bytes)?;
    let decoded = decode_body(registry, &header, body, limits)?;
    body_to_text(decoded)
}

/// Compress NDJSON text into a container.
///
/// With `columnar: true` the front-end transposes records into per-field
/// columns; tiny or heterogeneous inputs fall back to the row-wise path.
pub fn compress_ndjson(ndjson_text: &str, opts: &NdjsonOptions) -> Result<Vec<u8>> {
    compress_ndjson_with_registry(&BackendRegistry::new(), ndjson_text, opts)
}

/// [`compress_ndjson`] with a caller-owned back-end registry.
pub fn compress_ndjson_with_registry(
    registry: &BackendRegistry,
    ndjson_text: &str,
    opts: &NdjsonOptions,
) -> Result<Vec<u8>> {
    if let Some(profile) = opts.profile {
        log::debug!("ndjson profile hint: {profile:?}");
    }

    let payload: Vec<u8> = if ndjson_text.is_empty() {
        Vec::new()
    } else if opts.columnar {
        match encode_columnar(ndjson_text)? {
            ColumnarOutcome::Encoded(frames) => frames,
            ColumnarOutcome::Declined => encode_rowwise(ndjson_text).into_bytes(),
        }
    } else {
        encode_rowwise(ndjson_text).into_bytes()
    };

    let (name, body) = run_backend(registry, &opts.codec, &payload, opts.parallel)?;
    wrap_container(&name, true, &opts.options, &body)
}

/// Decompress an NDJSON container.
///
/// When `opts.fields` is non-empty a selective decode is performed: only
/// the requested columns are opened, every emitted line is an object
/// restricted to that set, and line count and blank-line positions are
/// preserved exactly as in a full decode.
pub fn decompress_ndjson(container_bytes: &[u8], opts: &DecodeOptions) -> Result<String> {
    decompress_ndjson_with_registry(&BackendRegistry::new(), container_bytes, opts)
}

/// [`decompress_ndjson`] with a caller-owned back-end registry.
pub fn decompress_ndjson_with_registry(
    registry: &BackendRegistry,
    container_bytes: &[u8],
    opts: &DecodeOptions,
) -> Result<String> {
    let (header, body) = container::unwrap(container_bytes)?;
    let decoded = decode_body(registry, &header, body, &opts.limits)?;
    if decoded.is_empty() {
        return Ok(String::new());
    }

    if is_columnar(&decoded) {
        let fields = if opts.fields.is_empty() {
            None
        } else {
            Some(opts.fields.as_slice())
        };
        return decode_columnar(&decoded, fields, &opts.limits);
    }

    let text = body_to_text(decoded)?;
    if opts.fields.is_empty() {
        Ok(text)
    } else {
        Ok(project_rowwise(&text, &opts.fields))
    }
}

#[cfg(feature = "async")]
pub mod async_io {
    //! Async facade wrapping the blocking entry points.
    //!
    //! Back-end calls are the only suspension points in the pipeline, so
    //! the facade simply runs whole operations on the blocking pool.

    use super::{CompressOptions, DecodeOptions, NdjsonOptions};
    use jco_format::{JcoError, Result};
    use tokio::task;

    /// [`super::compress`] on the blocking thread pool.
    pub async fn compress(json_text: String, opts: CompressOptions) -> Result<Vec<u8>> {
        task::spawn_blocking(move || super::compress(&json_text, &opts))
            .await
            .map_err(|err| JcoError::Internal(format!("spawn_blocking join error: {err}")))?
    }

    /// [`super::decompress`] on the blocking thread pool.
    pub async fn decompress(container_bytes: Vec<u8>) -> Result<String> {
        task::spawn_blocking(move || super::decompress(&container_bytes))
            .await
            .map_err(|err| JcoError::Internal(format!("spawn_blocking join error: {err}")))?
    }

    /// [`super::compress_ndjson`] on the blocking thread pool.
    pub async fn compress_ndjson(ndjson_text: String, opts: NdjsonOptions) -> Result<Vec<u8>> {
        task::spawn_blocking(move || super::compress_ndjson(&ndjson_text, &opts))
            .await
            .map_err(|err| JcoError::Internal(format!("spawn_blocking join error: {err}")))?
    }

    /// [`super::decompress_ndjson`] on the blocking thread pool.
    pub async fn decompress_ndjson(
        container_bytes: Vec<u8>,
        opts: DecodeOptions,
    ) -> Result<String> {
        task::spawn_blocking(move || super::decompress_ndjson(&container_bytes, &opts))
            .await
            .map_err(|err| JcoError::Internal(format!("spawn_blocking join error: {err}")))?
    }
}
