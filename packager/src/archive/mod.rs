//! Code package serialization and validation.
//!
//! - [`entry`] - Archive entries, namespaces, and the path and mode rules.
//! - [`builder`] - Gzip-compressed tar creation from entries.
//! - [`validation`] - Policy checks on untrusted packages.

pub mod builder;
pub mod entry;
pub mod validation;

pub use builder::build_package;
pub use entry::{ArchiveEntry, EntryContent};
pub use validation::validate_package;
