use thiserror::Error;

/// Errors raised by the codecs before anything reaches a store.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The input does not contain a canonical 8-4-4-4-12 lowercase hex UUID.
    #[error("invalid trail uuid: '{value}'")]
    InvalidUuid {
        /// Offending input.
        value: String,
    },
}
