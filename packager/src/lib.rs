//! Chaincode packaging library.
//!
//! This crate turns a chaincode source identifier into a deterministic,
//! gzip-compressed tar code package, validates untrusted packages before
//! they reach a build container, and generates the build script and image
//! directive used to compile a package. It is used by the `ccpack` CLI and
//! the `Platform` facade, and can be consumed directly in tests.
//!
//! # Modules
//!
//! - [`archive`] - Code package creation and validation
//! - [`build_script`] - Container build script and image directive generation
//! - [`descriptor`] - Source descriptors for the two layout conventions
//! - [`error`] - Error taxonomy and validation rules
//! - [`executor`] - External command execution abstraction
//! - [`metadata`] - Whitelist of recognized deployment metadata
//! - [`module_info`] - Module ownership queries against the toolchain
//! - [`path`] - Identifier validation and normalization
//! - [`payload`] - End-to-end deployment payload assembly
//! - [`source`] - Source file collection

pub mod archive;
pub mod build_script;
pub mod descriptor;
pub mod error;
pub mod executor;
pub mod metadata;
pub mod module_info;
pub mod path;
pub mod payload;
pub mod source;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use error::{PackagerError, Result, ValidationRule};
