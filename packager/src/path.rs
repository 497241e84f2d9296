//! Validation and canonicalization of chaincode source identifiers.
//!
//! Identifiers are import-style paths: alphanumeric segments separated by
//! `/`, where a segment may also contain `.`, `-`, `_` or `~`. They never
//! carry a URL scheme and never start with a separator or punctuation.

use crate::error::{PackagerError, Result};
use crate::module_info::ModuleQuery;
use camino::Utf8Path;
use log::debug;
use url::Url;

/// Characters permitted inside a segment besides ASCII alphanumerics.
const SEGMENT_PUNCTUATION: [char; 4] = ['.', '-', '_', '~'];

/// Checks that `identifier` is an acceptable chaincode import path.
///
/// # Errors
///
/// Returns [`PackagerError::InvalidPath`] naming the identifier when it
/// carries a scheme, starts with punctuation or a separator, or contains
/// an empty, relative, or otherwise malformed segment.
///
/// # Examples
///
/// ```
/// use ccpack_packager::path::validate_path;
///
/// assert!(validate_path("github.com/acme/chaincodes/noop").is_ok());
/// assert!(validate_path("https://github.com/acme/chaincodes/noop").is_err());
/// assert!(validate_path(":github.com/acme/chaincodes/noop").is_err());
/// ```
pub fn validate_path(identifier: &str) -> Result<()> {
    if identifier.is_empty() {
        return Err(PackagerError::invalid_path(identifier, "path is empty"));
    }

    if let Ok(url) = Url::parse(identifier) {
        return Err(PackagerError::invalid_path(
            identifier,
            format!("must not include a scheme (found {:?})", url.scheme()),
        ));
    }

    if !identifier.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        return Err(PackagerError::invalid_path(
            identifier,
            "must start with an alphanumeric character",
        ));
    }

    identifier
        .split('/')
        .try_for_each(|segment| validate_segment(identifier, segment))
}

fn validate_segment(identifier: &str, segment: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(PackagerError::invalid_path(identifier, "contains an empty segment"));
    }

    if segment == "." || segment == ".." {
        return Err(PackagerError::invalid_path(
            identifier,
            format!("contains a relative segment {segment:?}"),
        ));
    }

    match segment
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !SEGMENT_PUNCTUATION.contains(c))
    {
        Some(bad) => Err(PackagerError::invalid_path(
            identifier,
            format!("contains illegal character {bad:?}"),
        )),
        None => Ok(()),
    }
}

/// Returns the canonical identifier for `identifier`.
///
/// When a module owns the location the identifier collapses to the
/// package's path within that module; otherwise it is returned unchanged.
///
/// # Errors
///
/// Returns [`PackagerError::Resolution`] if the toolchain query fails.
/// A location outside any module is not an error.
pub fn normalize_path(query: &dyn ModuleQuery, identifier: &str) -> Result<String> {
    match query.module_info(Utf8Path::new(identifier))? {
        Some(info) => {
            let canonical = info.canonical_path();
            debug!("normalized {identifier} to module path {canonical}");
            Ok(canonical)
        }
        None => Ok(identifier.to_owned()),
    }
}
