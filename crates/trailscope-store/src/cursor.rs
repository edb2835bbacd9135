//! Cursor over the events of one trail.

use crate::db::{StoredEvent, TrailDb};
use crate::errors::StoreError;
use crate::filter::EventFilter;
use crate::frame::encode_record;
use crate::traits::{StoreCursor, TrailStore};
use tracing::trace;

/// Cursor over a [`TrailDb`].
///
/// The record returned by [`StoreCursor::next_record`] lives in a buffer
/// owned by the cursor and is overwritten on every advance.
#[derive(Debug)]
pub struct TrailCursor<'db, 'f> {
    db: &'db TrailDb,
    trail_id: Option<u64>,
    events: &'db [StoredEvent],
    position: usize,
    buffer: Vec<u8>,
    filter: Option<&'f EventFilter>,
}

impl<'db, 'f> TrailCursor<'db, 'f> {
    pub(crate) fn new(db: &'db TrailDb) -> Self {
        Self {
            db,
            trail_id: None,
            events: &[],
            position: 0,
            buffer: Vec::new(),
            filter: None,
        }
    }

    /// Trail the cursor is positioned on, if any.
    pub fn trail_id(&self) -> Option<u64> {
        self.trail_id
    }

    /// Whether a filter is attached.
    pub fn has_filter(&self) -> bool {
        self.filter.is_some()
    }
}

impl<'db, 'f> StoreCursor<'f> for TrailCursor<'db, 'f> {
    fn get_trail(&mut self, trail_id: u64) -> Result<(), StoreError> {
        let trail = self.db.trail(trail_id).ok_or(StoreError::InvalidTrail {
            trail_id,
            num_trails: self.db.num_trails(),
        })?;
        self.trail_id = Some(trail_id);
        self.events = &trail.events;
        self.position = 0;
        trace!(trail_id, events = trail.events.len(), "cursor positioned");
        Ok(())
    }

    fn next_record(&mut self) -> Option<&[u8]> {
        let events = self.events;
        while let Some(event) = events.get(self.position) {
            self.position += 1;
            if self.filter.map_or(true, |filter| filter.matches(&event.items)) {
                encode_record(&mut self.buffer, event.timestamp, &event.items);
                return Some(self.buffer.as_slice());
            }
        }
        None
    }

    fn set_filter(&mut self, filter: &'f EventFilter) -> Result<(), StoreError> {
        let num_fields = self.db.num_fields();
        if let Some(field) = filter.max_field() {
            if u64::from(field) >= num_fields {
                return Err(StoreError::FilterRejected(format!(
                    "term references field {} but store has {} fields",
                    field, num_fields
                )));
            }
        }
        self.filter = Some(filter);
        Ok(())
    }

    fn unset_filter(&mut self) {
        self.filter = None;
    }
}
