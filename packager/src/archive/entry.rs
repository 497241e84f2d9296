//! Archive entries and the path rules every entry obeys.

use crate::error::ValidationRule;
use camino::Utf8PathBuf;

/// Namespace for program source.
pub const SOURCE_PREFIX: &str = "src/";

/// Namespace for deployment metadata.
pub const METADATA_PREFIX: &str = "META-INF/";

/// Set-user-id permission bit.
pub const MODE_SETUID: u32 = 0o4000;

/// Set-group-id permission bit.
pub const MODE_SETGID: u32 = 0o2000;

/// Where an entry's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryContent {
    /// Contents of a file on the local filesystem.
    File(Utf8PathBuf),
    /// In-memory contents.
    Bytes(Vec<u8>),
    /// A directory marker with no contents.
    Directory,
}

/// One entry of a code package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Namespaced path inside the archive.
    pub archive_path: String,
    /// POSIX permission and type bits.
    pub mode: u32,
    /// Entry contents.
    pub content: EntryContent,
}

impl ArchiveEntry {
    /// Creates an in-memory regular file entry.
    pub fn bytes(archive_path: impl Into<String>, mode: u32, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            archive_path: archive_path.into(),
            mode,
            content: EntryContent::Bytes(contents.into()),
        }
    }

    /// Creates a directory entry.
    pub fn directory(archive_path: impl Into<String>, mode: u32) -> Self {
        Self {
            archive_path: archive_path.into(),
            mode,
            content: EntryContent::Directory,
        }
    }
}

/// Returns the rule `mode` violates, if any.
#[must_use]
pub const fn check_mode(mode: u32) -> Option<ValidationRule> {
    if mode & (MODE_SETUID | MODE_SETGID) == 0 {
        None
    } else {
        Some(ValidationRule::PrivilegedMode)
    }
}

/// Returns the rule `path` violates, if any.
///
/// A path must begin with exactly one recognized namespace and must not
/// climb out of it.
#[must_use]
pub fn check_path(path: &str) -> Option<ValidationRule> {
    if !(path.starts_with(SOURCE_PREFIX) || path.starts_with(METADATA_PREFIX)) {
        return Some(ValidationRule::BadNamespace);
    }
    if path.split('/').any(|segment| segment == "..") {
        return Some(ValidationRule::PathTraversal);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::source("src/path/to/somewhere/main.go", None)]
    #[case::metadata("META-INF/path/to/a/meta3", None)]
    #[case::source_dir("src/path/to/directory/", None)]
    #[case::absolute("/src/path/to/somewhere/main.go", Some(ValidationRule::BadNamespace))]
    #[case::contains_prefix("pkg/src/main.go", Some(ValidationRule::BadNamespace))]
    #[case::other_namespace("bin/main", Some(ValidationRule::BadNamespace))]
    #[case::bare_namespace("src", Some(ValidationRule::BadNamespace))]
    #[case::traversal("src/../etc/passwd", Some(ValidationRule::PathTraversal))]
    fn classifies_paths(#[case] path: &str, #[case] expected: Option<ValidationRule>) {
        assert_eq!(check_path(path), expected);
    }

    #[rstest]
    #[case::plain_file(0o100_644, None)]
    #[case::executable(0o100_755, None)]
    #[case::directory(0o040_755, None)]
    #[case::setuid(0o4755, Some(ValidationRule::PrivilegedMode))]
    #[case::setgid(0o2755, Some(ValidationRule::PrivilegedMode))]
    #[case::setgid_directory(0o042_755, Some(ValidationRule::PrivilegedMode))]
    fn classifies_modes(#[case] mode: u32, #[case] expected: Option<ValidationRule>) {
        assert_eq!(check_mode(mode), expected);
    }
}
