//! Codecs shared by every trailscope crate.
//!
//! - [`item`]: packing and unpacking of 64-bit items (field index + value id)
//! - [`uuid`]: 16-byte trail identifiers and their canonical text form
//!
//! Both are pure: no state, no I/O.
//!
#![deny(missing_docs)]

/// Codec error type.
pub mod error;
/// Packed item encoding.
pub mod item;
/// Trail UUID text codec.
pub mod uuid;

pub use error::CodecError;
pub use item::{field_index, is_narrow, value_id, FieldIndex, Item, ValueId, NO_MATCH};
pub use uuid::{format_uuid, parse_uuid, RawUuid, TrailUuid, UUID_LEN};
