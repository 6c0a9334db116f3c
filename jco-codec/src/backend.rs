//! Generic entropy back-ends
//!
//! A back-end is a general byte-stream coder behind a uniform interface
//! with a stable 8-bit tag: 0 = dense (zstd), 1 = fast (DEFLATE), 2 =
//! optional runtime-registered extra. Selection is data flowing through the
//! registry, never global state.

use jco_format::constants::{BACKEND_TAG_DENSE, BACKEND_TAG_EXTRA, BACKEND_TAG_FAST};
use jco_format::{JcoError, Result};
use std::io::Read;
use std::sync::Arc;

/// A general-purpose entropy coder over arbitrary byte streams.
pub trait Backend: Send + Sync {
    /// Stable codec name used in container headers.
    fn name(&self) -> &str;
    /// Stable 8-bit tag used in windowed payloads.
    fn tag(&self) -> u8;
    /// Compress `input`.
    fn encode(&self, input: &[u8]) -> Result<Vec<u8>>;
    /// Decompress `input`.
    fn decode(&self, input: &[u8]) -> Result<Vec<u8>>;
}

/// The dense coder: Zstandard at a high level.
pub struct DenseBackend {
    level: i32,
}

impl DenseBackend {
    /// Create the dense coder with an explicit zstd level.
    pub fn with_level(level: i32) -> Self {
        Self { level }
    }
}

impl Default for DenseBackend {
    fn default() -> Self {
        Self { level: 19 }
    }
}

impl Backend for DenseBackend {
    fn name(&self) -> &str {
        "dense"
    }

    fn tag(&self) -> u8 {
        BACKEND_TAG_DENSE
    }

    fn encode(&self, input: &[u8]) -> Result<Vec<u8>> {
        zstd::encode_all(input, self.level)
            .map_err(|e| JcoError::BackendFailed(format!("dense encode failed: {e}")))
    }

    fn decode(&self, input: &[u8]) -> Result<Vec<u8>> {
        zstd::decode_all(input)
            .map_err(|e| JcoError::BackendFailed(format!("dense decode failed: {e}")))
    }
}

/// The fast/ubiquitous coder: raw DEFLATE.
#[derive(Default)]
pub struct FastBackend;

impl Backend for FastBackend {
    fn name(&self) -> &str {
        "fast"
    }

    fn tag(&self) -> u8 {
        BACKEND_TAG_FAST
    }

    fn encode(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = flate2::read::DeflateEncoder::new(input, flate2::Compression::default());
        let mut out = Vec::new();
        encoder
            .read_to_end(&mut out)
            .map_err(|e| JcoError::BackendFailed(format!("fast encode failed: {e}")))?;
        Ok(out)
    }

    fn decode(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut decoder = flate2::read::DeflateDecoder::new(input);
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .map_err(|e| JcoError::BackendFailed(format!("fast decode failed: {e}")))?;
        Ok(out)
    }
}

/// The pass-through coder used by the `identity` codec name.
#[derive(Default)]
pub struct IdentityBackend;

impl Backend for IdentityBackend {
    fn name(&self) -> &str {
        "identity"
    }

    fn tag(&self) -> u8 {
        u8::MAX
    }

    fn encode(&self, input: &[u8]) -> Result<Vec<u8>> {
        Ok(input.to_vec())
    }

    fn decode(&self, input: &[u8]) -> Result<Vec<u8>> {
        Ok(input.to_vec())
    }
}

/// The registered back-end set: dense and fast are mandatory, one extra
/// coder may be registered at runtime under tag 2.
pub struct BackendRegistry {
    dense: Arc<dyn Backend>,
    fast: Arc<dyn Backend>,
    extra: Option<Arc<dyn Backend>>,
}

impl BackendRegistry {
    /// Registry with the mandatory coders.
    pub fn new() -> Self {
        Self {
            dense: Arc::new(DenseBackend::default()),
            fast: Arc::new(FastBackend),
            extra: None,
        }
    }

    /// Register the optional third coder. Its tag must be 2.
    pub fn register_extra(&mut self, backend: Arc<dyn Backend>) -> Result<()> {
        if backend.tag() != BACKEND_TAG_EXTRA {
            return Err(JcoError::Internal(format!(
                "extra backend must use tag {BACKEND_TAG_EXTRA}, got {}",
                backend.tag()
            )));
        }
        self.extra = Some(backend);
        Ok(())
    }

    /// Look a back-end up by its windowed-payload tag.
    pub fn by_tag(&self, tag: u8) -> Result<&dyn Backend> {
        match tag {
            BACKEND_TAG_DENSE => Ok(self.dense.as_ref()),
            BACKEND_TAG_FAST => Ok(self.fast.as_ref()),
            BACKEND_TAG_EXTRA => self
                .extra
                .as_deref()
                .ok_or_else(|| JcoError::ContainerCorrupt("no extra backend registered".to_string())),
            other => Err(JcoError::ContainerCorrupt(format!(
                "unknown backend tag {other}"
            ))),
        }
    }

    /// Look a back-end up by its header codec name.
    pub fn by_name(&self, name: &str) -> Option<&dyn Backend> {
        self.fixed_order()
            .into_iter()
            .find(|backend| backend.name() == name)
    }

    /// Registered back-ends in the fixed decode-probe order.
    pub fn fixed_order(&self) -> Vec<&dyn Backend> {
        let mut backends: Vec<&dyn Backend> = vec![self.dense.as_ref(), self.fast.as_ref()];
        if let Some(extra) = self.extra.as_deref() {
            backends.push(extra);
        }
        backends
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Requested codec for a compression call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CodecChoice {
    /// Adaptive selection between solid and windowed back-end runs.
    #[default]
    Hybrid,
    /// The fast coder only.
    Fast,
    /// The dense coder only.
    Dense,
    /// No entropy coding.
    Identity,
    /// A named back-end, resolved against the registry (for runtime extras).
    Named(String),
}

impl CodecChoice {
    /// Parse a codec name from the public surface.
    pub fn parse(name: &str) -> Self {
        match name {
            "hybrid" => CodecChoice::Hybrid,
            "fast" => CodecChoice::Fast,
            "dense" => CodecChoice::Dense,
            "identity" => CodecChoice::Identity,
            other => CodecChoice::Named(other.to_string()),
        }
    }
}
