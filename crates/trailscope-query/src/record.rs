//! Decoding of cursor records into events.

use crate::error::QueryError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::mem::size_of;
use thiserror::Error;
use tracing::trace;
use trailscope_codec::{field_index, FieldIndex, Item};
use trailscope_store::{TrailStore, RECORD_HEADER_SIZE};

/// One decoded event. Owns all of its data, so it outlives the cursor step
/// that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    /// Store-defined timestamp.
    pub timestamp: u64,
    /// One value per item, in record order. Missing values are "".
    pub values: Vec<String>,
    /// Field name to value, present when map mode was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, String>>,
}

impl Event {
    /// Value of field `name`, when map mode was requested.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .as_ref()
            .and_then(|fields| fields.get(name))
            .map(String::as_str)
    }
}

/// Ways a cursor record can fail to decode.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Fewer bytes than the fixed timestamp + count header.
    #[error("record of {len} bytes is shorter than its {header}-byte header", header = RECORD_HEADER_SIZE)]
    ShortHeader {
        /// Record length.
        len: usize,
    },
    /// The declared item count does not fit in the record.
    #[error("record declares {declared} items but holds {len} bytes")]
    TrailerOverrun {
        /// Item count from the header.
        declared: u64,
        /// Record length.
        len: usize,
    },
    /// An item names a field the store does not have.
    #[error("item {item:#x} references unknown field {field}")]
    UnknownField {
        /// Offending item.
        item: Item,
        /// Its decoded field index.
        field: FieldIndex,
    },
}

/// Bounds-checked view over one cursor record:
/// `[timestamp: u64][item_count: u64][item_count x item: u64]`, little-endian.
#[derive(Debug, Clone, Copy)]
pub struct RecordReader<'r> {
    bytes: &'r [u8],
    item_count: usize,
}

impl<'r> RecordReader<'r> {
    /// Validates the header and trailer length of `bytes`.
    pub fn new(bytes: &'r [u8]) -> Result<Self, RecordError> {
        let declared = match u64_at(bytes, size_of::<u64>()) {
            Some(declared) if bytes.len() >= RECORD_HEADER_SIZE => declared,
            _ => return Err(RecordError::ShortHeader { len: bytes.len() }),
        };

        let item_count = usize::try_from(declared)
            .ok()
            .filter(|count| {
                count
                    .checked_mul(size_of::<Item>())
                    .and_then(|trailer| trailer.checked_add(RECORD_HEADER_SIZE))
                    .is_some_and(|needed| needed <= bytes.len())
            })
            .ok_or(RecordError::TrailerOverrun {
                declared,
                len: bytes.len(),
            })?;

        Ok(Self { bytes, item_count })
    }

    /// Event timestamp.
    pub fn timestamp(&self) -> u64 {
        u64_at(self.bytes, 0).unwrap_or_default()
    }

    /// Number of items in the trailer.
    pub fn item_count(&self) -> usize {
        self.item_count
    }

    /// Item `index` of the trailer.
    pub fn item(&self, index: usize) -> Option<Item> {
        if index >= self.item_count {
            return None;
        }
        u64_at(self.bytes, RECORD_HEADER_SIZE + index * size_of::<Item>())
    }

    /// Iterates over the trailer items.
    pub fn items(&self) -> impl Iterator<Item = Item> + 'r {
        let reader = *self;
        (0..self.item_count).filter_map(move |i| reader.item(i))
    }
}

fn u64_at(bytes: &[u8], offset: usize) -> Option<u64> {
    let end = offset.checked_add(size_of::<u64>())?;
    let chunk: [u8; 8] = bytes.get(offset..end)?.try_into().ok()?;
    Some(u64::from_le_bytes(chunk))
}

/// Decodes the record a cursor step produced on trail `trail_id`.
///
/// `None` is the end of the trail. Every item is resolved through `store`;
/// an item with no value decodes to "". With `as_map`, each value is also
/// keyed by its field's name.
///
/// # Errors
///
/// [`QueryError::MalformedRecord`] when the record is truncated or an item
/// references a field outside the store's field table.
pub fn read_event<S: TrailStore>(
    store: &S,
    trail_id: u64,
    record: Option<&[u8]>,
    as_map: bool,
) -> Result<Option<Event>, QueryError> {
    let Some(record) = record else {
        return Ok(None);
    };
    let malformed = |source: RecordError| QueryError::MalformedRecord { trail_id, source };
    let reader = RecordReader::new(record).map_err(malformed)?;

    let mut values = Vec::with_capacity(reader.item_count());
    let mut fields = as_map.then(BTreeMap::new);
    for item in reader.items() {
        let value = store.item_value(item).unwrap_or_default().to_string();
        if let Some(fields) = fields.as_mut() {
            let field = field_index(item);
            let name = store
                .field_name(field)
                .ok_or(RecordError::UnknownField { item, field })
                .map_err(malformed)?;
            fields.insert(name.to_string(), value.clone());
        }
        values.push(value);
    }

    let event = Event {
        timestamp: reader.timestamp(),
        values,
        fields,
    };
    trace!(trail_id, timestamp = event.timestamp, items = reader.item_count(), "decoded record");
    Ok(Some(event))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(timestamp: u64, items: &[u64]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&timestamp.to_le_bytes());
        bytes.extend_from_slice(&(items.len() as u64).to_le_bytes());
        for item in items {
            bytes.extend_from_slice(&item.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn reads_header_and_trailer() {
        let bytes = record(42, &[0x0101, 0x0002]);
        let reader = RecordReader::new(&bytes).unwrap();
        assert_eq!(reader.timestamp(), 42);
        assert_eq!(reader.item_count(), 2);
        assert_eq!(reader.items().collect::<Vec<_>>(), vec![0x0101, 0x0002]);
        assert_eq!(reader.item(2), None);
    }

    #[test]
    fn empty_trailer_is_valid() {
        let bytes = record(7, &[]);
        let reader = RecordReader::new(&bytes).unwrap();
        assert_eq!(reader.item_count(), 0);
        assert_eq!(reader.items().count(), 0);
    }

    #[test]
    fn rejects_short_header() {
        assert_eq!(
            RecordReader::new(&[0u8; 12]).unwrap_err(),
            RecordError::ShortHeader { len: 12 }
        );
    }

    #[test]
    fn rejects_overstated_item_count() {
        let mut bytes = record(1, &[0x0101]);
        bytes[8..16].copy_from_slice(&3u64.to_le_bytes());
        let err = RecordReader::new(&bytes).unwrap_err();
        assert_eq!(
            err,
            RecordError::TrailerOverrun {
                declared: 3,
                len: 24
            }
        );
        assert!(err.to_string().contains("declares 3 items"));
    }

    #[test]
    fn rejects_overflowing_item_count() {
        let mut bytes = record(1, &[]);
        bytes[8..16].copy_from_slice(&u64::MAX.to_le_bytes());
        assert!(RecordReader::new(&bytes).is_err());
    }
}
