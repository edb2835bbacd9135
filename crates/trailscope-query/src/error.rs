//! Error types for query operations.

use crate::record::RecordError;
use thiserror::Error;
use trailscope_store::StoreError;

/// Errors raised while compiling filters or iterating trails.
#[derive(Error, Debug)]
pub enum QueryError {
    /// A filter condition names a field the store does not have.
    #[error("compile filter: unknown field '{field}'")]
    UnknownField {
        /// Field name as given in the condition.
        field: String,
    },
    /// The store could not allocate a filter.
    #[error("compile filter: could not create filter: {0}")]
    FilterInitFailed(#[source] StoreError),
    /// The store refused to open another clause.
    #[error("compile filter: could not open clause {clause}: {source}")]
    ClauseAppendFailed {
        /// Index of the clause that could not be opened.
        clause: usize,
        /// Store-side cause.
        #[source]
        source: StoreError,
    },
    /// The store refused to add a term.
    #[error("compile filter: could not add term on field '{field}': {source}")]
    TermAppendFailed {
        /// Field of the rejected term.
        field: String,
        /// Store-side cause.
        #[source]
        source: StoreError,
    },
    /// The store refused to attach a filter to a trail cursor.
    #[error("open trail {trail_id}: filter rejected: {source}")]
    FilterAttachFailed {
        /// Trail being opened.
        trail_id: u64,
        /// Store-side cause.
        #[source]
        source: StoreError,
    },
    /// The trail index is invalid or the cursor could not be positioned.
    #[error("open trail {trail_id}: {source}")]
    TrailOpenFailed {
        /// Trail being opened.
        trail_id: u64,
        /// Store-side cause.
        #[source]
        source: StoreError,
    },
    /// A cursor record did not have the expected layout.
    #[error("read trail {trail_id}: malformed record: {source}")]
    MalformedRecord {
        /// Trail being read.
        trail_id: u64,
        /// What was wrong with the record.
        #[source]
        source: RecordError,
    },
    /// No trail has the requested identifier.
    #[error("trail {uuid} not found")]
    TrailNotFound {
        /// Identifier looked up.
        uuid: String,
    },
    /// A trail identifier could not be parsed.
    #[error(transparent)]
    InvalidUuid(#[from] trailscope_codec::CodecError),
    /// A condition list was not valid JSON.
    #[error("invalid filter conditions: {0}")]
    InvalidConditions(#[from] serde_json::Error),
    /// Any other store error, unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),
}
