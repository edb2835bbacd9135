use crate::error::CodecError;
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Length in bytes of a raw trail identifier.
pub const UUID_LEN: usize = 16;

/// Raw 16-byte trail identifier.
pub type RawUuid = [u8; UUID_LEN];

const UUID_PATTERN: &str = r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}";

fn uuid_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(UUID_PATTERN).expect("invalid regex"))
}

/// Parses the first canonical UUID found anywhere in `value`.
///
/// The match is a substring search, so surrounding text is ignored:
/// `"id=0123...cdef;"` parses. Uppercase hex does not match.
pub fn parse_uuid(value: &str) -> Result<RawUuid, CodecError> {
    let invalid = || CodecError::InvalidUuid {
        value: value.to_string(),
    };

    let found = uuid_regex().find(value).ok_or_else(invalid)?;
    let digits: String = found.as_str().chars().filter(|c| *c != '-').collect();

    let mut raw = [0u8; UUID_LEN];
    hex::decode_to_slice(digits, &mut raw).map_err(|_| invalid())?;
    Ok(raw)
}

/// Formats raw bytes as lowercase hex grouped 8-4-4-4-12.
pub fn format_uuid(raw: &RawUuid) -> String {
    let digits = hex::encode(raw);
    format!(
        "{}-{}-{}-{}-{}",
        &digits[0..8],
        &digits[8..12],
        &digits[12..16],
        &digits[16..20],
        &digits[20..32]
    )
}

/// 128-bit trail identifier, displayed in canonical hyphenated form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrailUuid(RawUuid);

impl TrailUuid {
    /// Wraps raw identifier bytes.
    pub const fn from_bytes(raw: RawUuid) -> Self {
        Self(raw)
    }

    /// Parses a trail identifier from text (see [`parse_uuid`]).
    pub fn parse(value: &str) -> Result<Self, CodecError> {
        parse_uuid(value).map(Self)
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &RawUuid {
        &self.0
    }
}

impl From<RawUuid> for TrailUuid {
    fn from(raw: RawUuid) -> Self {
        Self(raw)
    }
}

impl FromStr for TrailUuid {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TrailUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_uuid(&self.0))
    }
}

impl Serialize for TrailUuid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_uuid(&self.0))
    }
}

impl<'de> Deserialize<'de> for TrailUuid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(de::Error::custom)
    }
}
