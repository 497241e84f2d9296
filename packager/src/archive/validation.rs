//! Code package validation.
//!
//! A package received from outside is decompressed and every entry is
//! checked before the package may reach a build container. Entries must
//! sit under `src/` or `META-INF/`, must not climb out of them, must be
//! plain files or directories, and must not carry set-user-id or
//! set-group-id bits.

use super::entry::{check_mode, check_path};
use crate::error::{PackagerError, Result, ValidationRule};
use flate2::read::GzDecoder;
use log::{debug, trace};

/// Checks every entry of a compressed code package.
///
/// Stops at the first violation. An empty, well-formed archive passes.
///
/// # Errors
///
/// Returns [`PackagerError::PackageValidation`] naming the entry and the
/// violated rule, or [`PackagerError::PackageFormat`] if the bytes are not
/// a readable gzip-compressed tar stream.
pub fn validate_package(package: &[u8]) -> Result<()> {
    let mut archive = tar::Archive::new(GzDecoder::new(package));
    let entries = archive
        .entries()
        .map_err(|e| PackagerError::package_format(&e))?;

    let mut checked = 0_usize;
    for entry in entries {
        let entry = entry.map_err(|e| PackagerError::package_format(&e))?;
        let path = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        let header = entry.header();
        let mode = header
            .mode()
            .map_err(|e| PackagerError::package_format(&e))?;
        let kind = header.entry_type();
        trace!("checking {path} (mode {mode:o}, type {kind:?})");

        let violation = check_mode(mode).or_else(|| check_path(&path)).or_else(|| {
            (!kind.is_file() && !kind.is_dir()).then_some(ValidationRule::UnsupportedEntryType)
        });
        if let Some(rule) = violation {
            debug!("rejecting code package: {rule} at {path}");
            return Err(PackagerError::PackageValidation { path, rule });
        }
        checked += 1;
    }

    debug!("code package passed validation ({checked} entries)");
    Ok(())
}
