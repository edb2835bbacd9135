//! Trail database store for trailscope.
//!
//! This crate provides:
//! - The [`TrailStore`] / [`StoreCursor`] interface query code runs against
//! - [`TrailDb`], a file-backed implementation of that interface
//! - [`TrailDbConstructor`] to build new store files
//! - [`EventFilter`] expressions evaluated inside cursors
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use trailscope_codec::TrailUuid;
//! use trailscope_store::{StoreCursor, TrailDb, TrailDbConstructor, TrailStore};
//!
//! let mut cons = TrailDbConstructor::create("events.tdb", &["user", "action"])?;
//! let uuid = TrailUuid::parse("12345678-90ab-cdef-1234-567890abcdef")?;
//! cons.add(&uuid, 1_700_000_000, &["alice", "login"])?;
//! cons.finalize()?;
//!
//! let db = TrailDb::open("events.tdb")?;
//! let mut filter = db.new_filter()?;
//! filter.add_term(db.item(2, "login"), false)?;
//!
//! let mut cursor = db.cursor()?;
//! cursor.set_filter(&filter)?;
//! cursor.get_trail(0)?;
//! while let Some(record) = cursor.next_record() {
//!     println!("record of {} bytes", record.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## File layout
//!
//! A 16-byte header (`TDB1`, version, flags, reserved) followed by section
//! frames `[kind u8][reserved 3][len u32 LE][payload]`: one fields section,
//! one lexicon section per user field, one section per trail.

#![deny(missing_docs)]

/// Trail database constructor.
pub mod constructor;
/// Cursor implementation for [`TrailDb`].
pub mod cursor;
/// Opened trail database.
pub mod db;
/// Error types for store operations.
pub mod errors;
/// Field name table and value lexicons.
pub mod fields;
/// Event filter expressions.
pub mod filter;
/// File header and section frames.
pub mod frame;
/// Store and cursor traits.
pub mod traits;

pub use constructor::TrailDbConstructor;
pub use cursor::TrailCursor;
pub use db::TrailDb;
pub use errors::StoreError;
pub use fields::{FieldTable, Lexicon, TIME_FIELD};
pub use filter::{EventFilter, Term, MAX_CLAUSES, MAX_TERMS_PER_CLAUSE};
pub use frame::{SectionFrame, SectionKind, TrailDbHeader, RECORD_HEADER_SIZE};
pub use traits::{StoreCursor, TrailStore};
