//! Query layer over trail stores.
//!
//! This crate provides:
//! - Decoding of binary cursor records into owned [`Event`]s
//! - Compilation of declarative [`FilterCondition`]s into store filters
//! - Lazy [`Trails`] / [`Events`] sequences with scoped cursor release
//!
//! Everything is generic over [`trailscope_store::TrailStore`]; no component
//! holds global state.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use trailscope_query::{compile_filter, FilterCondition, TrailOptions, Trails};
//! use trailscope_store::TrailDb;
//!
//! let db = TrailDb::open("events.tdb")?;
//! let filter = compile_filter(
//!     &db,
//!     &[
//!         FilterCondition::new("action", "login"),
//!         FilterCondition::new("action", "logout").new_clause(),
//!     ],
//! )?;
//!
//! let options = TrailOptions::default().as_map().with_filter(&filter);
//! for trail in Trails::new(&db) {
//!     let uuid = trail.uuid()?;
//!     for event in trail.events(&options)? {
//!         let event = event?;
//!         println!("{} {} {:?}", uuid, event.timestamp, event.fields);
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(missing_docs)]

/// Error types for query operations.
pub mod error;
/// Filter condition compiler.
pub mod filter;
/// Cursor record decoding.
pub mod record;
/// Trail and event sequences.
pub mod trails;

pub use error::QueryError;
pub use filter::{compile_filter, parse_conditions, FilterCondition};
pub use record::{read_event, Event, RecordError, RecordReader};
pub use trails::{Events, Trail, TrailEvents, TrailOptions, Trails};
