//! Lazy iteration over trails and their events.

use crate::error::QueryError;
use crate::record::{read_event, Event};
use std::fmt;
use std::mem;
use tracing::debug;
use trailscope_codec::TrailUuid;
use trailscope_store::{EventFilter, StoreCursor, StoreError, TrailStore};

/// Options applied to every event sequence.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrailOptions<'f> {
    /// Also key each event's values by field name.
    pub as_map: bool,
    /// Only yield events matching this filter. The filter is borrowed, so it
    /// outlives every cursor it is attached to.
    pub filter: Option<&'f EventFilter>,
}

impl<'f> TrailOptions<'f> {
    /// Enables map mode.
    pub fn as_map(mut self) -> Self {
        self.as_map = true;
        self
    }

    /// Attaches `filter`.
    pub fn with_filter(mut self, filter: &'f EventFilter) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// Handle to one trail. Opening its events is deferred to [`Trail::events`].
pub struct Trail<'a, S> {
    store: &'a S,
    id: u64,
}

impl<'a, S: TrailStore> Trail<'a, S> {
    /// Handle for the trail with index `id`; validity is checked on open.
    pub fn new(store: &'a S, id: u64) -> Self {
        Self { store, id }
    }

    /// Looks a trail up by identifier.
    pub fn find(store: &'a S, uuid: &TrailUuid) -> Result<Self, QueryError> {
        store
            .trail_id(uuid)
            .map(|id| Self::new(store, id))
            .ok_or_else(|| QueryError::TrailNotFound {
                uuid: uuid.to_string(),
            })
    }

    /// Trail index.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Trail identifier.
    pub fn uuid(&self) -> Result<TrailUuid, QueryError> {
        self.store
            .uuid(self.id)
            .ok_or_else(|| QueryError::TrailOpenFailed {
                trail_id: self.id,
                source: StoreError::InvalidTrail {
                    trail_id: self.id,
                    num_trails: self.store.num_trails(),
                },
            })
    }

    /// Opens the event sequence of this trail.
    pub fn events<'f>(&self, options: &TrailOptions<'f>) -> Result<Events<'a, 'f, S>, QueryError>
    where
        S: 'a,
    {
        Events::open(self.store, self.id, options)
    }
}

impl<S> Clone for Trail<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Trail<'_, S> {}

impl<S> fmt::Debug for Trail<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trail").field("id", &self.id).finish()
    }
}

/// Sequence over all trails of a store, in index order.
///
/// The trail count is captured when the sequence is created.
pub struct Trails<'a, S> {
    store: &'a S,
    next: u64,
    count: u64,
}

impl<'a, S: TrailStore> Trails<'a, S> {
    /// Starts a sequence over the trails currently in `store`.
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            next: 0,
            count: store.num_trails(),
        }
    }

    /// Flattens every trail's events into `(uuid, event)` pairs.
    pub fn events<'f>(self, options: TrailOptions<'f>) -> TrailEvents<'a, 'f, S>
    where
        S: 'a,
    {
        TrailEvents {
            trails: self,
            options,
            current: None,
        }
    }
}

impl<'a, S: TrailStore> Iterator for Trails<'a, S> {
    type Item = Trail<'a, S>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }
        let trail = Trail::new(self.store, self.next);
        self.next += 1;
        Some(trail)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.count - self.next).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl<'a, S: TrailStore> ExactSizeIterator for Trails<'a, S> {}

/// Lifecycle of an event sequence's cursor.
enum CursorState<C> {
    /// Cursor positioned on the trail, events may remain.
    Positioned(C),
    /// All events were read or the sequence was released.
    Exhausted,
    /// Decoding failed; the cursor has been released.
    Failed,
}

/// Event sequence of one trail.
///
/// The cursor, and the attachment of any filter, are released exactly once:
/// on exhaustion, on the first error, on [`Events::release`], or on drop,
/// whichever comes first. Reading after that yields `None`.
pub struct Events<'a, 'f, S: TrailStore + 'a> {
    store: &'a S,
    trail_id: u64,
    as_map: bool,
    state: CursorState<S::Cursor<'a, 'f>>,
}

impl<'a, 'f, S: TrailStore + 'a> Events<'a, 'f, S> {
    /// Acquires a cursor, attaches the filter, and positions it on `trail_id`.
    ///
    /// # Errors
    ///
    /// - [`QueryError::FilterAttachFailed`] if the store rejects the filter
    /// - [`QueryError::TrailOpenFailed`] if the trail index is invalid
    pub fn open(
        store: &'a S,
        trail_id: u64,
        options: &TrailOptions<'f>,
    ) -> Result<Self, QueryError> {
        let mut cursor = store
            .cursor()
            .map_err(|source| QueryError::TrailOpenFailed { trail_id, source })?;
        if let Some(filter) = options.filter {
            cursor
                .set_filter(filter)
                .map_err(|source| QueryError::FilterAttachFailed { trail_id, source })?;
        }
        cursor
            .get_trail(trail_id)
            .map_err(|source| QueryError::TrailOpenFailed { trail_id, source })?;

        debug!(trail_id, filtered = options.filter.is_some(), "opened trail");
        Ok(Self {
            store,
            trail_id,
            as_map: options.as_map,
            state: CursorState::Positioned(cursor),
        })
    }

    /// Trail index.
    pub fn trail_id(&self) -> u64 {
        self.trail_id
    }

    /// True once the cursor has been released.
    pub fn is_released(&self) -> bool {
        !matches!(self.state, CursorState::Positioned(_))
    }

    /// True if iteration stopped on an error.
    pub fn is_failed(&self) -> bool {
        matches!(self.state, CursorState::Failed)
    }

    /// Detaches the filter and releases the cursor. Later calls do nothing.
    pub fn release(&mut self) {
        self.finish(CursorState::Exhausted);
    }

    fn finish(&mut self, next: CursorState<S::Cursor<'a, 'f>>) {
        if let CursorState::Positioned(mut cursor) = mem::replace(&mut self.state, next) {
            cursor.unset_filter();
            drop(cursor);
            debug!(trail_id = self.trail_id, "released trail cursor");
        }
    }
}

impl<'a, 'f, S: TrailStore + 'a> Iterator for Events<'a, 'f, S> {
    type Item = Result<Event, QueryError>;

    fn next(&mut self) -> Option<Self::Item> {
        let CursorState::Positioned(cursor) = &mut self.state else {
            return None;
        };

        let decoded = read_event(self.store, self.trail_id, cursor.next_record(), self.as_map);
        match decoded {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => {
                self.finish(CursorState::Exhausted);
                None
            }
            Err(e) => {
                self.finish(CursorState::Failed);
                Some(Err(e))
            }
        }
    }
}

impl<'a, 'f, S: TrailStore + 'a> Drop for Events<'a, 'f, S> {
    fn drop(&mut self) {
        self.release();
    }
}

/// All events of all trails, paired with their trail's identifier.
pub struct TrailEvents<'a, 'f, S: TrailStore + 'a> {
    trails: Trails<'a, S>,
    options: TrailOptions<'f>,
    current: Option<(TrailUuid, Events<'a, 'f, S>)>,
}

impl<'a, 'f, S: TrailStore + 'a> Iterator for TrailEvents<'a, 'f, S> {
    type Item = Result<(TrailUuid, Event), QueryError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((uuid, events)) = self.current.as_mut() {
                match events.next() {
                    Some(Ok(event)) => return Some(Ok((*uuid, event))),
                    Some(Err(e)) => {
                        self.current = None;
                        self.trails.next = self.trails.count;
                        return Some(Err(e));
                    }
                    None => self.current = None,
                }
            }

            let trail = self.trails.next()?;
            let opened = trail.uuid().and_then(|uuid| {
                trail
                    .events(&self.options)
                    .map(|events| (uuid, events))
            });
            match opened {
                Ok(current) => self.current = Some(current),
                Err(e) => {
                    self.trails.next = self.trails.count;
                    return Some(Err(e));
                }
            }
        }
    }
}
