use crate::errors::StoreError;
use trailscope_codec::Item;

/// Trail db file magic bytes: `b"TDB1"`.
pub const MAGIC: &[u8; 4] = b"TDB1";

/// Current file format version: `0x0001`.
pub const VERSION: u16 = 0x0001;

/// Header size in bytes: 16 bytes.
pub const HEADER_SIZE: usize = 16;

/// Section frame header size in bytes: 8 bytes.
pub const FRAME_HEADER_SIZE: usize = 8;

/// Maximum section payload size: 16 MiB.
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

/// Section kind: field names (JSON array).
pub const SECTION_KIND_FIELDS: u8 = 0x01;
/// Section kind: one field's lexicon (JSON object).
pub const SECTION_KIND_LEXICON: u8 = 0x02;
/// Section kind: one trail (binary).
pub const SECTION_KIND_TRAIL: u8 = 0x03;

/// Size of the fixed record header: timestamp then item count.
pub const RECORD_HEADER_SIZE: usize = 2 * std::mem::size_of::<u64>();

/// Trail db file header (16 bytes): magic, little-endian version, then ten
/// zero bytes kept for flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailDbHeader {
    /// Format version: `0x0001`.
    pub version: u16,
}

impl TrailDbHeader {
    /// Header for the current format version.
    pub fn new() -> Self {
        Self { version: VERSION }
    }

    /// Serializes the header to bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[..MAGIC.len()].copy_from_slice(MAGIC);
        bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
        bytes
    }

    /// Reads the header at the start of a file. Only the current version is
    /// accepted and the trailing bytes must be zero.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        let header = bytes.get(..HEADER_SIZE).ok_or_else(|| {
            StoreError::InvalidHeader(format!("header too short: {} bytes", bytes.len()))
        })?;

        let (magic, rest) = header.split_at(MAGIC.len());
        if magic != MAGIC {
            return Err(StoreError::InvalidHeader(format!(
                "invalid magic {:?}",
                String::from_utf8_lossy(magic)
            )));
        }

        let version = u16::from_le_bytes([rest[0], rest[1]]);
        if version != VERSION {
            return Err(StoreError::InvalidHeader(format!(
                "unsupported version 0x{:04x}",
                version
            )));
        }
        if rest[2..].iter().any(|byte| *byte != 0) {
            return Err(StoreError::InvalidHeader(
                "non-zero flags or reserved bytes".to_string(),
            ));
        }

        Ok(Self { version })
    }
}

impl Default for TrailDbHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Section kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    /// Field name table.
    Fields,
    /// Values of one field.
    Lexicon,
    /// One trail with its events.
    Trail,
    /// Unknown/unsupported section kind.
    Unknown(u8),
}

impl SectionKind {
    /// Creates a SectionKind from a byte value.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            SECTION_KIND_FIELDS => SectionKind::Fields,
            SECTION_KIND_LEXICON => SectionKind::Lexicon,
            SECTION_KIND_TRAIL => SectionKind::Trail,
            _ => SectionKind::Unknown(byte),
        }
    }

    /// Returns the byte value for this kind.
    pub fn to_byte(self) -> u8 {
        match self {
            SectionKind::Fields => SECTION_KIND_FIELDS,
            SectionKind::Lexicon => SECTION_KIND_LEXICON,
            SectionKind::Trail => SECTION_KIND_TRAIL,
            SectionKind::Unknown(b) => b,
        }
    }
}

/// Section frame header (8 bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionFrame {
    /// Section kind.
    pub kind: SectionKind,
    /// Reserved bytes (must be all zeros).
    pub reserved: [u8; 3],
    /// Payload length in bytes (little-endian).
    pub len: u32,
}

impl SectionFrame {
    /// Creates a new frame header.
    pub fn new(kind: SectionKind, len: usize) -> Result<Self, StoreError> {
        if len > MAX_PAYLOAD_SIZE as usize {
            return Err(StoreError::PayloadTooLarge {
                size: len as u64,
                max: MAX_PAYLOAD_SIZE,
            });
        }
        Ok(Self {
            kind,
            reserved: [0; 3],
            len: len as u32,
        })
    }

    /// Serializes the frame header to bytes.
    pub fn to_bytes(&self) -> [u8; FRAME_HEADER_SIZE] {
        let mut bytes = [0u8; FRAME_HEADER_SIZE];
        bytes[0] = self.kind.to_byte();
        bytes[1..4].copy_from_slice(&self.reserved);
        bytes[4..8].copy_from_slice(&self.len.to_le_bytes());
        bytes
    }

    /// Deserializes a frame header found at `offset` in the file.
    pub fn from_bytes(bytes: &[u8], offset: u64) -> Result<Self, StoreError> {
        if bytes.len() < FRAME_HEADER_SIZE {
            return Err(StoreError::TruncatedFrame { offset });
        }

        let kind = SectionKind::from_byte(bytes[0]);
        let reserved = [bytes[1], bytes[2], bytes[3]];
        if reserved != [0u8; 3] {
            return Err(StoreError::InvalidFrame {
                offset,
                reason: "non-zero reserved bytes".to_string(),
            });
        }
        let len = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);

        if len > MAX_PAYLOAD_SIZE {
            return Err(StoreError::InvalidFrame {
                offset,
                reason: format!("payload size {} exceeds maximum {}", len, MAX_PAYLOAD_SIZE),
            });
        }

        Ok(Self { kind, reserved, len })
    }
}

/// Splits a file image into its header and section frames.
///
/// Frames are yielded in file order together with their starting offset.
pub(crate) fn sections(
    bytes: &[u8],
) -> Result<Vec<(u64, SectionKind, &[u8])>, StoreError> {
    TrailDbHeader::from_bytes(bytes)?;

    let mut out = Vec::new();
    let mut position = HEADER_SIZE;
    while position < bytes.len() {
        let offset = position as u64;
        let frame = SectionFrame::from_bytes(&bytes[position..], offset)?;
        let start = position + FRAME_HEADER_SIZE;
        let end = start + frame.len as usize;
        if end > bytes.len() {
            return Err(StoreError::TruncatedFrame { offset });
        }
        out.push((offset, frame.kind, &bytes[start..end]));
        position = end;
    }
    Ok(out)
}

/// Writes one cursor record (`[timestamp][item_count][items...]`) into `buf`.
pub(crate) fn encode_record(buf: &mut Vec<u8>, timestamp: u64, items: &[Item]) {
    buf.clear();
    buf.reserve(RECORD_HEADER_SIZE + items.len() * std::mem::size_of::<Item>());
    buf.extend_from_slice(&timestamp.to_le_bytes());
    buf.extend_from_slice(&(items.len() as u64).to_le_bytes());
    for item in items {
        buf.extend_from_slice(&item.to_le_bytes());
    }
}

/// Reads a little-endian `u64` at `offset`, or `None` past the end.
pub(crate) fn read_u64(bytes: &[u8], offset: usize) -> Option<u64> {
    let end = offset.checked_add(8)?;
    let chunk: [u8; 8] = bytes.get(offset..end)?.try_into().ok()?;
    Some(u64::from_le_bytes(chunk))
}
