//! Subcommand implementations.

pub mod build;
pub mod get;
pub mod info;
pub mod list;
