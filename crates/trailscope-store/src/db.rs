//! Read-only trail database.

use crate::cursor::TrailCursor;
use crate::errors::StoreError;
use crate::fields::{FieldTable, Lexicon, LexiconSection};
use crate::frame::{self, read_u64, SectionKind};
use crate::traits::TrailStore;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use trailscope_codec::item::encode;
use trailscope_codec::{field_index, value_id, FieldIndex, Item, TrailUuid, NO_MATCH, UUID_LEN};

/// One event as held in memory: timestamp plus one item per user field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoredEvent {
    pub timestamp: u64,
    pub items: Vec<Item>,
}

/// One trail as held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoredTrail {
    pub uuid: TrailUuid,
    pub events: Vec<StoredEvent>,
}

const TRAIL_PREFIX_SIZE: usize = UUID_LEN + 8;

impl StoredTrail {
    /// Serializes as `[uuid 16][event_count u64]` then `[timestamp][items...]` per event.
    pub(crate) fn to_bytes(&self, num_user_fields: usize) -> Vec<u8> {
        let event_size = 8 * (num_user_fields + 1);
        let mut bytes = Vec::with_capacity(TRAIL_PREFIX_SIZE + self.events.len() * event_size);
        bytes.extend_from_slice(self.uuid.as_bytes());
        bytes.extend_from_slice(&(self.events.len() as u64).to_le_bytes());
        for event in &self.events {
            bytes.extend_from_slice(&event.timestamp.to_le_bytes());
            for item in &event.items {
                bytes.extend_from_slice(&item.to_le_bytes());
            }
        }
        bytes
    }

    /// Parses a trail section found at `offset`.
    pub(crate) fn from_bytes(
        bytes: &[u8],
        num_user_fields: usize,
        offset: u64,
    ) -> Result<Self, StoreError> {
        let invalid = |reason: String| StoreError::InvalidFrame { offset, reason };

        if bytes.len() < TRAIL_PREFIX_SIZE {
            return Err(invalid(format!("trail section too short: {} bytes", bytes.len())));
        }
        let mut raw = [0u8; UUID_LEN];
        raw.copy_from_slice(&bytes[..UUID_LEN]);
        let uuid = TrailUuid::from_bytes(raw);

        let count = read_u64(bytes, UUID_LEN)
            .ok_or_else(|| invalid("missing event count".to_string()))?;
        let event_size = 8 * (num_user_fields + 1);
        let expected = usize::try_from(count)
            .ok()
            .and_then(|count| count.checked_mul(event_size))
            .and_then(|body| body.checked_add(TRAIL_PREFIX_SIZE))
            .ok_or_else(|| invalid(format!("event count {} overflows", count)))?;
        if expected != bytes.len() {
            return Err(invalid(format!(
                "trail {} declares {} events ({} bytes), section has {} bytes",
                uuid,
                count,
                expected,
                bytes.len()
            )));
        }

        let short = || invalid("event truncated".to_string());
        let mut events = Vec::with_capacity(count as usize);
        let mut position = TRAIL_PREFIX_SIZE;
        for _ in 0..count {
            let timestamp = read_u64(bytes, position).ok_or_else(short)?;
            let items = (0..num_user_fields)
                .map(|i| read_u64(bytes, position + 8 * (i + 1)))
                .collect::<Option<Vec<Item>>>()
                .ok_or_else(short)?;
            events.push(StoredEvent { timestamp, items });
            position += event_size;
        }

        Ok(Self { uuid, events })
    }
}

/// An opened, immutable trail database.
///
/// The whole file is decoded into memory on [`TrailDb::open`]; every lookup
/// afterwards is a fresh read of those tables.
///
/// # Example
///
/// ```rust,no_run
/// use trailscope_store::{StoreCursor, TrailDb, TrailStore};
///
/// let db = TrailDb::open("events.tdb")?;
/// let mut cursor = db.cursor()?;
/// cursor.get_trail(0)?;
/// while let Some(record) = cursor.next_record() {
///     println!("{} bytes", record.len());
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct TrailDb {
    path: PathBuf,
    fields: FieldTable,
    lexicons: Vec<Lexicon>,
    trails: Vec<StoredTrail>,
    uuid_index: HashMap<TrailUuid, u64>,
    num_events: u64,
    min_timestamp: u64,
    max_timestamp: u64,
}

impl TrailDb {
    /// Opens and validates a trail database file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StoreOpenFailed`] naming the path when the file
    /// cannot be read or any section fails validation.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let open_failed = |e: StoreError| StoreError::StoreOpenFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        let bytes = fs::read(path).map_err(|e| open_failed(e.into()))?;
        let db = Self::from_bytes(path, &bytes).map_err(open_failed)?;

        debug!(
            path = %path.display(),
            trails = db.trails.len(),
            events = db.num_events,
            fields = db.fields.len(),
            "opened trail db"
        );
        Ok(db)
    }

    fn from_bytes(path: &Path, bytes: &[u8]) -> Result<Self, StoreError> {
        let mut fields: Option<FieldTable> = None;
        let mut lexicons: Vec<Lexicon> = Vec::new();
        let mut seen_lexicons: HashSet<FieldIndex> = HashSet::new();
        let mut trails: Vec<(u64, StoredTrail)> = Vec::new();

        for (offset, kind, payload) in frame::sections(bytes)? {
            let invalid = |reason: String| StoreError::InvalidFrame { offset, reason };
            match kind {
                SectionKind::Fields => {
                    if fields.is_some() {
                        return Err(invalid("duplicate fields section".to_string()));
                    }
                    let names: Vec<String> = serde_json::from_slice(payload)?;
                    let table = FieldTable::new(&names).map_err(|e| invalid(e.to_string()))?;
                    lexicons = vec![Lexicon::default(); table.num_user_fields()];
                    fields = Some(table);
                }
                SectionKind::Lexicon => {
                    let table = fields
                        .as_ref()
                        .ok_or_else(|| invalid("lexicon before fields section".to_string()))?;
                    let section: LexiconSection = serde_json::from_slice(payload)?;
                    let field = table
                        .index_of(&section.field)
                        .filter(|field| *field > 0)
                        .ok_or_else(|| invalid(format!("lexicon for unknown field '{}'", section.field)))?;
                    if !seen_lexicons.insert(field) {
                        return Err(invalid(format!(
                            "duplicate lexicon section for field '{}'",
                            section.field
                        )));
                    }
                    lexicons[field as usize - 1] = Lexicon::from_values(section.values)
                        .map_err(|e| invalid(e.to_string()))?;
                }
                SectionKind::Trail => {
                    let table = fields
                        .as_ref()
                        .ok_or_else(|| invalid("trail before fields section".to_string()))?;
                    let trail = StoredTrail::from_bytes(payload, table.num_user_fields(), offset)?;
                    trails.push((offset, trail));
                }
                SectionKind::Unknown(byte) => {
                    warn!(offset, kind = byte, "skipping unknown section");
                }
            }
        }

        let fields = fields
            .ok_or_else(|| StoreError::InvalidHeader("missing fields section".to_string()))?;

        let mut uuid_index = HashMap::with_capacity(trails.len());
        let mut num_events = 0u64;
        let mut min_timestamp = u64::MAX;
        let mut max_timestamp = 0u64;
        for (trail_id, (offset, trail)) in trails.iter().enumerate() {
            if uuid_index.insert(trail.uuid, trail_id as u64).is_some() {
                return Err(StoreError::InvalidFrame {
                    offset: *offset,
                    reason: format!("duplicate trail {}", trail.uuid),
                });
            }
            for event in &trail.events {
                validate_items(&event.items, &lexicons).map_err(|reason| {
                    StoreError::InvalidFrame {
                        offset: *offset,
                        reason,
                    }
                })?;
                min_timestamp = min_timestamp.min(event.timestamp);
                max_timestamp = max_timestamp.max(event.timestamp);
            }
            num_events += trail.events.len() as u64;
        }
        if num_events == 0 {
            min_timestamp = 0;
        }

        Ok(Self {
            path: path.to_path_buf(),
            fields,
            lexicons,
            trails: trails.into_iter().map(|(_, trail)| trail).collect(),
            uuid_index,
            num_events,
            min_timestamp,
            max_timestamp,
        })
    }

    /// Path the store was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// User field names in index order (excludes `time`).
    pub fn field_names(&self) -> &[String] {
        self.fields.user_fields()
    }

    /// Lexicon of user field `field` (1-based).
    pub fn lexicon(&self, field: FieldIndex) -> Option<&Lexicon> {
        (field as usize).checked_sub(1).and_then(|i| self.lexicons.get(i))
    }

    pub(crate) fn trail(&self, trail_id: u64) -> Option<&StoredTrail> {
        usize::try_from(trail_id).ok().and_then(|i| self.trails.get(i))
    }

    pub(crate) fn trails(&self) -> &[StoredTrail] {
        &self.trails
    }
}

/// Checks that items follow field order and reference known values.
fn validate_items(items: &[Item], lexicons: &[Lexicon]) -> Result<(), String> {
    for (i, (item, lexicon)) in items.iter().zip(lexicons).enumerate() {
        let expected = (i + 1) as FieldIndex;
        if field_index(*item) != expected {
            return Err(format!(
                "item {:#x} has field {}, expected {}",
                item,
                field_index(*item),
                expected
            ));
        }
        if lexicon.value_of(value_id(*item)).is_none() {
            return Err(format!(
                "item {:#x} references unknown value {} of field {}",
                item,
                value_id(*item),
                expected
            ));
        }
    }
    Ok(())
}

impl TrailStore for TrailDb {
    type Cursor<'db, 'f> = TrailCursor<'db, 'f> where Self: 'db;

    fn num_trails(&self) -> u64 {
        self.trails.len() as u64
    }

    fn num_events(&self) -> u64 {
        self.num_events
    }

    fn min_timestamp(&self) -> u64 {
        self.min_timestamp
    }

    fn max_timestamp(&self) -> u64 {
        self.max_timestamp
    }

    fn field_table(&self) -> &FieldTable {
        &self.fields
    }

    fn item(&self, field: FieldIndex, value: &str) -> Item {
        self.lexicon(field)
            .and_then(|lexicon| lexicon.id_of(value))
            .map(|id| encode(field, id))
            .unwrap_or(NO_MATCH)
    }

    fn item_value(&self, item: Item) -> Option<&str> {
        self.lexicon(field_index(item))
            .and_then(|lexicon| lexicon.value_of(value_id(item)))
    }

    fn uuid(&self, trail_id: u64) -> Option<TrailUuid> {
        self.trail(trail_id).map(|trail| trail.uuid)
    }

    fn trail_id(&self, uuid: &TrailUuid) -> Option<u64> {
        self.uuid_index.get(uuid).copied()
    }

    fn cursor<'f>(&self) -> Result<TrailCursor<'_, 'f>, StoreError> {
        Ok(TrailCursor::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trail() -> StoredTrail {
        StoredTrail {
            uuid: TrailUuid::from_bytes([7; 16]),
            events: vec![
                StoredEvent {
                    timestamp: 10,
                    items: vec![encode(1, 1), encode(2, 0)],
                },
                StoredEvent {
                    timestamp: 11,
                    items: vec![encode(1, 2), encode(2, 1)],
                },
            ],
        }
    }

    #[test]
    fn trail_section_round_trip() {
        let trail = sample_trail();
        let bytes = trail.to_bytes(2);
        assert_eq!(bytes.len(), TRAIL_PREFIX_SIZE + 2 * 24);
        assert_eq!(StoredTrail::from_bytes(&bytes, 2, 0).unwrap(), trail);
    }

    #[test]
    fn trail_section_rejects_wrong_length() {
        let mut bytes = sample_trail().to_bytes(2);
        bytes.pop();
        assert!(matches!(
            StoredTrail::from_bytes(&bytes, 2, 40),
            Err(StoreError::InvalidFrame { offset: 40, .. })
        ));
    }

    #[test]
    fn trail_section_rejects_huge_count() {
        let mut bytes = sample_trail().to_bytes(2);
        bytes[UUID_LEN..UUID_LEN + 8].copy_from_slice(&u64::MAX.to_le_bytes());
        assert!(StoredTrail::from_bytes(&bytes, 2, 0).is_err());
    }

    #[test]
    fn validate_items_checks_field_order() {
        let lexicons = vec![Lexicon::default(), Lexicon::default()];
        assert!(validate_items(&[encode(1, 0), encode(2, 0)], &lexicons).is_ok());
        assert!(validate_items(&[encode(2, 0), encode(1, 0)], &lexicons).is_err());
        assert!(validate_items(&[encode(1, 5), encode(2, 0)], &lexicons).is_err());
    }
}
