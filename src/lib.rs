//! Go chaincode platform: configuration, the [`platform::Platform`] facade,
//! and the `ccpack` command line definitions.
//!
//! # Modules
//!
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - TOML configuration with `CORE_` environment overrides
//! - [`error`] - Configuration and command-line errors
//! - [`platform`] - Packaging operations bound to configuration

pub mod cli;
pub mod config;
pub mod error;
pub mod platform;

pub use config::PlatformConfig;
pub use platform::Platform;
