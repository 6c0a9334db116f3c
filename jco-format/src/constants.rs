//! Magic numbers and wire constants for the JCO format

/// Container magic bytes: "JCO1"
pub const CONTAINER_MAGIC: [u8; 4] = *b"JCO1";

/// Container header format version.
pub const FORMAT_VERSION: u32 = 1;

/// Leading bytes of the line-presence frame.
pub const LINE_PRESENCE_MAGIC: [u8; 2] = *b"BM";

/// Leading byte of a shape frame.
pub const SHAPE_FRAME_MAGIC: u8 = 0xC1;

/// Separator byte inserted between frames by the columnar front-end.
pub const FRAME_SEPARATOR: u8 = b'\n';

/// Magic bytes of the windowed hybrid payload envelope.
pub const HYBRID_MAGIC: [u8; 4] = *b"HYB1";

/// Legacy solid-payload prefix accepted on decode.
pub const SOLID_MAGIC: [u8; 5] = *b"SOLID";

/// Back-end tag for the dense coder.
pub const BACKEND_TAG_DENSE: u8 = 0;
/// Back-end tag for the fast coder.
pub const BACKEND_TAG_FAST: u8 = 1;
/// Back-end tag reserved for an optional runtime-registered coder.
pub const BACKEND_TAG_EXTRA: u8 = 2;

/// Column type tag: integers as nullable varints.
pub const COLUMN_INT_VARINT: u8 = 0;
/// Column type tag: integers as zigzag deltas.
pub const COLUMN_DELTA_ZIGZAG: u8 = 1;
/// Column type tag: timestamps as delta-of-delta (decoded, never emitted).
pub const COLUMN_TIME_DOD: u8 = 2;
/// Column type tag: booleans as run-length groups.
pub const COLUMN_BOOL_RLE: u8 = 3;
/// Column type tag: low-cardinality strings as dictionary ids.
pub const COLUMN_ENUM_IDS: u8 = 4;
/// Column type tag: string dictionary with residuals (reserved).
pub const COLUMN_STR_IDS_WITH_RESID: u8 = 5;
/// Column type tag: length-prefixed JSON text fallback.
pub const COLUMN_RAW_JSON: u8 = 6;

/// Maximum rows per shape frame emitted by the encoder.
pub const MAX_ROWS_PER_FRAME: usize = 4096;

/// Records below this count decline the columnar path.
pub const COLUMNAR_MIN_RECORDS: usize = 3;
/// Inputs below this byte length decline the columnar path.
pub const COLUMNAR_MIN_BYTES: usize = 64;

/// Window size used by the hybrid selector.
pub const HYBRID_WINDOW_SIZE: usize = 64 * 1024;
/// Scout prefix size sampled from each window.
pub const HYBRID_SCOUT_SIZE: usize = 4 * 1024;

/// Maximum dictionary entries in an ENUM_IDS column.
pub const ENUM_MAX_DICT_ENTRIES: usize = 16;
/// Maximum byte length of an ENUM_IDS dictionary string.
pub const ENUM_MAX_STRING_BYTES: usize = 16;
/// Dictionary id denoting a null row in an ENUM_IDS column.
pub const ENUM_NULL_ID: u8 = 255;

/// BOOL_RLE value code for a null row.
pub const BOOL_CODE_NULL: u8 = 0;
/// BOOL_RLE value code for `false`.
pub const BOOL_CODE_FALSE: u8 = 1;
/// BOOL_RLE value code for `true`.
pub const BOOL_CODE_TRUE: u8 = 2;

/// Largest integer magnitude the integer column encoders accept (2^53 - 1).
pub const MAX_SAFE_INT: i64 = (1 << 53) - 1;
