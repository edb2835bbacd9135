//! Interface between query code and a trail store.
//!
//! Query code never reaches for a concrete store; it is handed something
//! implementing [`TrailStore`] and drives [`StoreCursor`]s obtained from it.

use crate::errors::StoreError;
use crate::fields::FieldTable;
use crate::filter::EventFilter;
use trailscope_codec::{FieldIndex, Item, TrailUuid};

/// Read access to an opened trail store.
pub trait TrailStore {
    /// Cursor type borrowing the store for `'db` and a filter for `'f`.
    type Cursor<'db, 'f>: StoreCursor<'f>
    where
        Self: 'db;

    /// Number of trails.
    fn num_trails(&self) -> u64;

    /// Number of events across all trails.
    fn num_events(&self) -> u64;

    /// Number of fields, including the timestamp pseudo-field.
    fn num_fields(&self) -> u64 {
        self.field_table().len() as u64
    }

    /// Smallest event timestamp, 0 for an empty store.
    fn min_timestamp(&self) -> u64;

    /// Largest event timestamp, 0 for an empty store.
    fn max_timestamp(&self) -> u64;

    /// Field name table, fixed for the life of the store.
    fn field_table(&self) -> &FieldTable;

    /// Resolves a field name to its index.
    fn field_index(&self, name: &str) -> Option<FieldIndex> {
        self.field_table().index_of(name)
    }

    /// Resolves a field index to its name.
    fn field_name(&self, field: FieldIndex) -> Option<&str> {
        self.field_table().name_of(field)
    }

    /// Resolves `(field, value)` to an item.
    ///
    /// Unknown fields or values yield [`trailscope_codec::NO_MATCH`].
    fn item(&self, field: FieldIndex, value: &str) -> Item;

    /// Resolves an item to its value; `None` when the item is not in the store.
    fn item_value(&self, item: Item) -> Option<&str>;

    /// Identifier of trail `trail_id`.
    fn uuid(&self, trail_id: u64) -> Option<TrailUuid>;

    /// Index of the trail identified by `uuid`.
    fn trail_id(&self, uuid: &TrailUuid) -> Option<u64>;

    /// Allocates a cursor.
    fn cursor<'f>(&self) -> Result<Self::Cursor<'_, 'f>, StoreError>;

    /// Allocates an empty event filter.
    fn new_filter(&self) -> Result<EventFilter, StoreError> {
        Ok(EventFilter::new())
    }
}

/// Stateful reader over one trail's events.
pub trait StoreCursor<'f> {
    /// Positions the cursor at the start of trail `trail_id`.
    fn get_trail(&mut self, trail_id: u64) -> Result<(), StoreError>;

    /// Advances to the next event passing the attached filter.
    ///
    /// Returns the record `[timestamp: u64][item_count: u64][items: u64...]`
    /// (little-endian), or `None` at the end of the trail. The slice is only
    /// valid until the next call.
    fn next_record(&mut self) -> Option<&[u8]>;

    /// Attaches a filter; subsequent advances skip events it rejects.
    fn set_filter(&mut self, filter: &'f EventFilter) -> Result<(), StoreError>;

    /// Detaches any filter.
    fn unset_filter(&mut self);
}
