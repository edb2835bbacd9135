//! CLI-level errors not covered by the library crates.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{path}:{line}: {reason}")]
    BadInputLine {
        path: String,
        line: usize,
        reason: String,
    },
    #[error("cannot read filter file '{path}': {source}")]
    FilterFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
