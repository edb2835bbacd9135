//! Trail database constructor.

use crate::db::{StoredEvent, StoredTrail, TrailDb};
use crate::errors::StoreError;
use crate::fields::{FieldTable, Lexicon, LexiconSection};
use crate::frame::{SectionFrame, SectionKind, TrailDbHeader};
use crate::traits::TrailStore;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use trailscope_codec::item::encode;
use trailscope_codec::{FieldIndex, Item, TrailUuid};

/// Builds a new trail database file.
///
/// Events are buffered in memory and written by [`finalize`](Self::finalize):
/// trails in the order their UUID was first added, each trail's events
/// stably sorted by timestamp.
///
/// # Example
///
/// ```rust,no_run
/// use trailscope_codec::TrailUuid;
/// use trailscope_store::TrailDbConstructor;
///
/// let mut cons = TrailDbConstructor::create("events.tdb", &["user", "action"])?;
/// let uuid = TrailUuid::parse("12345678-90ab-cdef-1234-567890abcdef")?;
/// cons.add(&uuid, 1_700_000_000, &["alice", "login"])?;
/// cons.finalize()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct TrailDbConstructor {
    path: PathBuf,
    file: File,
    fields: FieldTable,
    lexicons: Vec<Lexicon>,
    trails: Vec<StoredTrail>,
    index: HashMap<TrailUuid, usize>,
    num_events: u64,
}

impl TrailDbConstructor {
    /// Creates (or truncates) `path` and declares the user fields.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ConstructorOpenFailed`] if:
    /// - a field name is empty, duplicated or the reserved `time`
    /// - the file cannot be created
    pub fn create<P: AsRef<Path>, S: AsRef<str>>(
        path: P,
        fields: &[S],
    ) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let open_failed = |reason: String| StoreError::ConstructorOpenFailed {
            path: path.clone(),
            reason,
        };

        let fields = FieldTable::new(fields).map_err(|e| open_failed(e.to_string()))?;
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| open_failed(e.to_string()))?;

        let lexicons = vec![Lexicon::default(); fields.num_user_fields()];
        Ok(Self {
            path,
            file,
            fields,
            lexicons,
            trails: Vec::new(),
            index: HashMap::new(),
            num_events: 0,
        })
    }

    /// Output path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// User field names in declaration order.
    pub fn field_names(&self) -> &[String] {
        self.fields.user_fields()
    }

    /// Number of distinct trails added so far.
    pub fn num_trails(&self) -> u64 {
        self.trails.len() as u64
    }

    /// Number of events added so far.
    pub fn num_events(&self) -> u64 {
        self.num_events
    }

    /// Adds one event to the trail identified by `uuid`.
    ///
    /// `values` holds one value per user field, in field order; "" marks a
    /// field without a value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AppendMismatch`] when the number of values differs
    /// from the number of fields.
    pub fn add<S: AsRef<str>>(
        &mut self,
        uuid: &TrailUuid,
        timestamp: u64,
        values: &[S],
    ) -> Result<(), StoreError> {
        if values.len() != self.lexicons.len() {
            return Err(StoreError::AppendMismatch {
                expected: format!("{} values", self.lexicons.len()),
                actual: format!("{} values", values.len()),
            });
        }

        let items: Vec<Item> = values
            .iter()
            .zip(self.lexicons.iter_mut())
            .enumerate()
            .map(|(i, (value, lexicon))| {
                encode((i + 1) as FieldIndex, lexicon.intern(value.as_ref()))
            })
            .collect();

        let slot = match self.index.get(uuid).copied() {
            Some(slot) => slot,
            None => {
                self.trails.push(StoredTrail {
                    uuid: *uuid,
                    events: Vec::new(),
                });
                self.index.insert(*uuid, self.trails.len() - 1);
                self.trails.len() - 1
            }
        };
        self.trails[slot].events.push(StoredEvent { timestamp, items });
        self.num_events += 1;
        Ok(())
    }

    /// Adds every event of an existing store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AppendMismatch`] unless `db` has exactly the same
    /// field names, in the same order.
    pub fn append(&mut self, db: &TrailDb) -> Result<(), StoreError> {
        if db.field_names() != self.field_names() {
            return Err(StoreError::AppendMismatch {
                expected: format!("fields {:?}", self.field_names()),
                actual: format!("fields {:?}", db.field_names()),
            });
        }

        for trail in db.trails() {
            for event in &trail.events {
                let values: Vec<&str> = event
                    .items
                    .iter()
                    .map(|item| db.item_value(*item).unwrap_or(""))
                    .collect();
                self.add(&trail.uuid, event.timestamp, &values)?;
            }
        }

        debug!(
            source = %db.path().display(),
            trails = db.num_trails(),
            events = db.num_events(),
            "appended trail db"
        );
        Ok(())
    }

    /// Sorts each trail by timestamp and writes the file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::FinalizeFailed`] if any section cannot be
    /// serialized or written.
    pub fn finalize(mut self) -> Result<(), StoreError> {
        for trail in &mut self.trails {
            trail.events.sort_by_key(|event| event.timestamp);
        }

        self.write_sections()
            .map_err(|e| StoreError::FinalizeFailed {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        debug!(
            path = %self.path.display(),
            trails = self.trails.len(),
            events = self.num_events,
            "finalized trail db"
        );
        Ok(())
    }

    fn write_sections(&self) -> Result<(), StoreError> {
        let mut out = BufWriter::new(&self.file);
        out.write_all(&TrailDbHeader::new().to_bytes())?;

        let names = serde_json::to_vec(self.fields.user_fields())?;
        write_section(&mut out, SectionKind::Fields, &names)?;

        for (name, lexicon) in self.fields.user_fields().iter().zip(&self.lexicons) {
            let section = LexiconSection {
                field: name.clone(),
                values: lexicon.values().to_vec(),
            };
            write_section(&mut out, SectionKind::Lexicon, &serde_json::to_vec(&section)?)?;
        }

        let num_user_fields = self.fields.num_user_fields();
        for trail in &self.trails {
            write_section(&mut out, SectionKind::Trail, &trail.to_bytes(num_user_fields))?;
        }

        out.flush()?;
        drop(out);
        self.file.sync_all()?;
        Ok(())
    }
}

fn write_section<W: Write>(out: &mut W, kind: SectionKind, payload: &[u8]) -> Result<(), StoreError> {
    let frame = SectionFrame::new(kind, payload.len())?;
    out.write_all(&frame.to_bytes())?;
    out.write_all(payload)?;
    Ok(())
}
