//! Frame layout
//!
//! Two frame kinds, distinguished by their leading bytes:
//!
//! - Line-presence frame: `'B' 'M' || u32 lineCount || ceil(lineCount/8)`
//!   bitmap bytes. Exactly one per container, emitted first.
//! - Shape frame: `0xC1 || u32 rows || u64 shapeId || u16 keyCount ||
//!   (u32 keyLen || key)×K || presence bitmap || (u32 colLen || col)×K`.
//!
//! All multi-byte integers are little-endian. Frames are self-delimiting: a
//! reader walks the body by parsing each header and skipping the declared
//! lengths, tolerating the single `\n` separator the front-end inserts
//! between frames.

use crate::bitmap::{byte_len, Bitmap};
use crate::constants::{FRAME_SEPARATOR, LINE_PRESENCE_MAGIC, SHAPE_FRAME_MAGIC};
use crate::error::{JcoError, Result};
use crate::limits::Limits;

fn read_u16_le(bytes: &[u8], pos: usize) -> Result<u16> {
    let end = pos + 2;
    if end > bytes.len() {
        return Err(JcoError::FrameCorrupt("truncated frame".to_string()));
    }
    Ok(u16::from_le_bytes([bytes[pos], bytes[pos + 1]]))
}

fn read_u32_le(bytes: &[u8], pos: usize) -> Result<u32> {
    let end = pos + 4;
    if end > bytes.len() {
        return Err(JcoError::FrameCorrupt("truncated frame".to_string()));
    }
    Ok(u32::from_le_bytes([
        bytes[pos],
        bytes[pos + 1],
        bytes[pos + 2],
        bytes[pos + 3],
    ]))
}

fn read_u64_le(bytes: &[u8], pos: usize) -> Result<u64> {
    let end = pos + 8;
    if end > bytes.len() {
        return Err(JcoError::FrameCorrupt("truncated frame".to_string()));
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[pos..end]);
    Ok(u64::from_le_bytes(buf))
}

/// Encode the line-presence frame.
pub fn encode_line_presence(bitmap: &Bitmap) -> Vec<u8> {
    let bytes = bitmap.to_bytes();
    let mut out = Vec::with_capacity(2 + 4 + bytes.len());
    out.extend_from_slice(&LINE_PRESENCE_MAGIC);
    out.extend_from_slice(&(bitmap.len() as u32).to_le_bytes());
    out.extend_from_slice(&bytes);
    out
}

/// Parsed view of a line-presence frame.
#[derive(Debug)]
pub struct LinePresenceRef<'a> {
    /// Total line count of the original input.
    pub line_count: u32,
    /// Raw bitmap bytes, LSB-first.
    pub bits: &'a [u8],
    /// Total encoded frame length in bytes.
    pub frame_len: usize,
}

impl LinePresenceRef<'_> {
    /// Materialise the bitmap.
    pub fn bitmap(&self) -> Bitmap {
        Bitmap::from_bytes(self.bits, self.line_count as usize)
    }
}

/// Parse a line-presence frame at the start of `bytes`.
pub fn parse_line_presence<'a>(bytes: &'a [u8], limits: &Limits) -> Result<LinePresenceRef<'a>> {
    if bytes.len() < 2 || bytes[0..2] != LINE_PRESENCE_MAGIC {
        return Err(JcoError::FrameCorrupt(
            "bad line-presence magic".to_string(),
        ));
    }
    let line_count = read_u32_le(bytes, 2)?;
    if line_count as usize > limits.max_lines {
        return Err(JcoError::LimitExceeded(format!(
            "line count {} exceeds limit {}",
            line_count, limits.max_lines
        )));
    }

    let bitmap_len = byte_len(line_count as usize);
    let end = 6 + bitmap_len;
    if end > bytes.len() {
        return Err(JcoError::FrameCorrupt("truncated frame".to_string()));
    }

    Ok(LinePresenceRef {
        line_count,
        bits: &bytes[6..end],
        frame_len: end,
    })
}

/// Encode a shape frame from its parts.
///
/// `presence` must hold exactly `rows * keys.len()` bits and `columns` one
/// encoded payload per key.
pub fn encode_shape_frame(
    shape_id: u64,
    keys: &[String],
    rows: u32,
    presence: &Bitmap,
    columns: &[Vec<u8>],
) -> Result<Vec<u8>> {
    if keys.len() != columns.len() {
        return Err(JcoError::Internal(
            "column count does not match key count".to_string(),
        ));
    }
    let key_count = u16::try_from(keys.len())
        .map_err(|_| JcoError::Internal("key count exceeds u16".to_string()))?;
    if presence.len() != rows as usize * keys.len() {
        return Err(JcoError::Internal(
            "presence bitmap length does not match rows * keys".to_string(),
        ));
    }

    let mut out = Vec::new();
    out.push(SHAPE_FRAME_MAGIC);
    out.extend_from_slice(&rows.to_le_bytes());
    out.extend_from_slice(&shape_id.to_le_bytes());
    out.extend_from_slice(&key_count.to_le_bytes());
    for key in keys {
        out.extend_from_slice(&(key.len() as u32).to_le_bytes());
        out.extend_from_slice(key.as_bytes());
    }
    out.extend_from_slice(&presence.to_bytes());
    for column in columns {
        let len = u32::try_from(column.len())
            .map_err(|_| JcoError::Internal("column exceeds u32 length".to_string()))?;
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(column);
    }
    Ok(out)
}

/// Parsed view of a shape frame; column payloads stay borrowed so a
/// selective decoder can skip them without copying.
#[derive(Debug)]
pub struct ShapeFrameRef<'a> {
    /// Rows in this frame.
    pub rows: u32,
    /// FNV-1a 64 shape id.
    pub shape_id: u64,
    /// Sorted key list.
    pub keys: Vec<String>,
    /// Raw row-major presence bitmap bytes.
    pub presence: &'a [u8],
    /// One encoded column payload per key, in key order.
    pub columns: Vec<&'a [u8]>,
    /// Total encoded frame length in bytes.
    pub frame_len: usize,
}

impl ShapeFrameRef<'_> {
    /// Materialise the presence bitmap (`rows * keys` bits, row-major).
    pub fn presence_bitmap(&self) -> Bitmap {
        Bitmap::from_bytes(self.presence, self.rows as usize * self.keys.len())
    }
}

/// Parse a shape frame at the start of `bytes`.
pub fn parse_shape_frame<'a>(bytes: &'a [u8], limits: &Limits) -> Result<ShapeFrameRef<'a>> {
    if bytes.is_empty() || bytes[0] != SHAPE_FRAME_MAGIC {
        return Err(JcoError::FrameCorrupt("bad shape-frame magic".to_string()));
    }
    let mut pos = 1;

    let rows = read_u32_le(bytes, pos)?;
    pos += 4;
    if rows as usize > limits.max_rows_per_frame {
        return Err(JcoError::LimitExceeded(format!(
            "row count {} exceeds limit {}",
            rows, limits.max_rows_per_frame
        )));
    }

    let shape_id = read_u64_le(bytes, pos)?;
    pos += 8;

    let key_count = read_u16_le(bytes, pos)? as usize;
    pos += 2;
    if key_count > limits.max_keys_per_frame {
        return Err(JcoError::LimitExceeded(format!(
            "key count {} exceeds limit {}",
            key_count, limits.max_keys_per_frame
        )));
    }

    let mut keys = Vec::with_capacity(key_count);
    for _ in 0..key_count {
        let key_len = read_u32_le(bytes, pos)? as usize;
        pos += 4;
        if key_len > limits.max_key_bytes {
            return Err(JcoError::LimitExceeded(format!(
                "key length {} exceeds limit {}",
                key_len, limits.max_key_bytes
            )));
        }
        let end = pos
            .checked_add(key_len)
            .ok_or_else(|| JcoError::FrameCorrupt("key length overflow".to_string()))?;
        if end > bytes.len() {
            return Err(JcoError::FrameCorrupt("truncated frame".to_string()));
        }
        let key = std::str::from_utf8(&bytes[pos..end])
            .map_err(|_| JcoError::FrameCorrupt("key is not UTF-8".to_string()))?;
        keys.push(key.to_string());
        pos = end;
    }

    let presence_len = byte_len(rows as usize * key_count);
    let presence_end = pos
        .checked_add(presence_len)
        .ok_or_else(|| JcoError::FrameCorrupt("presence length overflow".to_string()))?;
    if presence_end > bytes.len() {
        return Err(JcoError::FrameCorrupt("truncated frame".to_string()));
    }
    let presence = &bytes[pos..presence_end];
    pos = presence_end;

    let mut columns = Vec::with_capacity(key_count);
    for _ in 0..key_count {
        let col_len = read_u32_le(bytes, pos)? as usize;
        pos += 4;
        if col_len > limits.max_column_bytes {
            return Err(JcoError::LimitExceeded(format!(
                "column length {} exceeds limit {}",
                col_len, limits.max_column_bytes
            )));
        }
        let end = pos
            .checked_add(col_len)
            .ok_or_else(|| JcoError::FrameCorrupt("column length overflow".to_string()))?;
        if end > bytes.len() {
            return Err(JcoError::FrameCorrupt("truncated frame".to_string()));
        }
        columns.push(&bytes[pos..end]);
        pos = end;
    }

    Ok(ShapeFrameRef {
        rows,
        shape_id,
        keys,
        presence,
        columns,
        frame_len: pos,
    })
}

/// One parsed frame of either kind.
#[derive(Debug)]
pub enum FrameRef<'a> {
    /// The global line-presence frame.
    LinePresence(LinePresenceRef<'a>),
    /// A shape-group frame.
    Shape(ShapeFrameRef<'a>),
}

/// Walks a body of concatenated frames without an external index.
pub struct FrameWalker<'a> {
    bytes: &'a [u8],
    pos: usize,
    limits: &'a Limits,
    failed: bool,
}

impl<'a> FrameWalker<'a> {
    /// Create a walker over `bytes`.
    pub fn new(bytes: &'a [u8], limits: &'a Limits) -> Self {
        Self {
            bytes,
            pos: 0,
            limits,
            failed: false,
        }
    }

    /// Bytes consumed so far, including skipped separators.
    pub fn consumed(&self) -> usize {
        self.pos
    }
}

impl<'a> Iterator for FrameWalker<'a> {
    type Item = Result<FrameRef<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        while self.pos < self.bytes.len() && self.bytes[self.pos] == FRAME_SEPARATOR {
            self.pos += 1;
        }
        if self.pos >= self.bytes.len() {
            return None;
        }

        let rest = &self.bytes[self.pos..];
        let result = match rest[0] {
            b if b == LINE_PRESENCE_MAGIC[0] => parse_line_presence(rest, self.limits)
                .map(|frame| {
                    self.pos += frame.frame_len;
                    FrameRef::LinePresence(frame)
                }),
            SHAPE_FRAME_MAGIC => parse_shape_frame(rest, self.limits).map(|frame| {
                self.pos += frame.frame_len;
                FrameRef::Shape(frame)
            }),
            other => Err(JcoError::FrameCorrupt(format!(
                "bad frame magic {other:#04x}"
            ))),
        };

        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}
