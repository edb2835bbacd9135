use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O error during read or write.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Codec error (malformed trail identifier).
    #[error(transparent)]
    Codec(#[from] trailscope_codec::CodecError),
    /// Invalid JSON in a metadata section.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// The store file could not be opened or failed validation.
    #[error("failed to open trail db {}: {reason}", path.display())]
    StoreOpenFailed {
        /// Path passed to `open`.
        path: PathBuf,
        /// Underlying cause.
        reason: String,
    },
    /// A constructor could not be created for the given path or fields.
    #[error("failed to open constructor {}: {reason}", path.display())]
    ConstructorOpenFailed {
        /// Output path.
        path: PathBuf,
        /// Underlying cause.
        reason: String,
    },
    /// Writing the finalized store failed.
    #[error("failed to finalize {}: {reason}", path.display())]
    FinalizeFailed {
        /// Output path.
        path: PathBuf,
        /// Underlying cause.
        reason: String,
    },
    /// Event values or appended store fields do not match the constructor schema.
    #[error("append mismatch: expected {expected}, got {actual}")]
    AppendMismatch {
        /// What the constructor expected.
        expected: String,
        /// What was supplied.
        actual: String,
    },
    /// More user fields than an item can address.
    #[error("{count} fields exceeds maximum {max}")]
    TooManyFields {
        /// Number of fields declared.
        count: usize,
        /// Largest addressable field index.
        max: u32,
    },
    /// A field name is empty, duplicated or the reserved `time`.
    #[error("{reason} field name '{name}'")]
    InvalidFieldName {
        /// Offending name.
        name: String,
        /// Which rule it breaks.
        reason: &'static str,
    },
    /// A stored lexicon holds the empty value or a value twice.
    #[error("{reason} lexicon value '{value}'")]
    InvalidLexiconValue {
        /// Offending value.
        value: String,
        /// Which rule it breaks.
        reason: &'static str,
    },
    /// Invalid file header (magic, version, flags or reserved bytes).
    #[error("invalid trail db header: {0}")]
    InvalidHeader(String),
    /// Invalid section frame.
    #[error("invalid frame at offset {offset}: {reason}")]
    InvalidFrame {
        /// Byte offset where the frame starts.
        offset: u64,
        /// Reason for invalidity.
        reason: String,
    },
    /// Section payload exceeds the size limit.
    #[error("payload size {size} exceeds maximum {max}")]
    PayloadTooLarge {
        /// Actual payload size.
        size: u64,
        /// Maximum allowed size.
        max: u32,
    },
    /// The file ends in the middle of a frame.
    #[error("truncated frame at offset {offset}")]
    TruncatedFrame {
        /// Byte offset where truncation occurred.
        offset: u64,
    },
    /// Trail index outside `0..num_trails`.
    #[error("trail {trail_id} does not exist (store has {num_trails} trails)")]
    InvalidTrail {
        /// Requested trail index.
        trail_id: u64,
        /// Number of trails in the store.
        num_trails: u64,
    },
    /// An event filter exceeded one of its capacity bounds.
    #[error("event filter full: {what}")]
    FilterCapacity {
        /// Which bound was hit.
        what: String,
    },
    /// The store refused to attach a filter to a cursor.
    #[error("filter rejected: {0}")]
    FilterRejected(String),
}
