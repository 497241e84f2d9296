//! Error types for chaincode packaging and archive validation.
//!
//! Every failure is terminal for the call that produced it. Variants carry
//! the offending identifier, path, or rule so the message can be shown to
//! an end user unchanged.

use camino::Utf8PathBuf;
use std::fmt;
use thiserror::Error;

/// The archive validation rule an entry violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationRule {
    /// The entry mode carries the set-user-id or set-group-id bit.
    PrivilegedMode,
    /// The entry path does not start with `src/` or `META-INF/`.
    BadNamespace,
    /// The entry path contains a `..` segment.
    PathTraversal,
    /// The entry is neither a regular file nor a directory.
    UnsupportedEntryType,
    /// Another entry already uses the same path.
    DuplicateEntry,
}

impl ValidationRule {
    /// Short, stable description of the rule.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::PrivilegedMode => "illegal file mode (setuid/setgid)",
            Self::BadNamespace => "illegal file name (must start with src/ or META-INF/)",
            Self::PathTraversal => "illegal file name (parent directory reference)",
            Self::UnsupportedEntryType => "illegal entry type (only files and directories)",
            Self::DuplicateEntry => "duplicate file name",
        }
    }
}

impl fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Errors raised while resolving, collecting, packaging, or validating
/// chaincode source.
#[derive(Debug, Error)]
pub enum PackagerError {
    /// The caller-supplied identifier is not an acceptable import path.
    #[error("invalid chaincode path {path:?}: {reason}")]
    InvalidPath {
        /// The rejected identifier.
        path: String,
        /// Why the identifier was rejected.
        reason: String,
    },

    /// The toolchain could not be queried for module ownership.
    #[error("failed to resolve {path}: {reason}")]
    Resolution {
        /// The identifier or directory being resolved.
        path: String,
        /// Description of the toolchain failure.
        reason: String,
    },

    /// The source root does not exist.
    #[error("chaincode source not found at {path}: no such file or directory")]
    SourceNotFound {
        /// The missing source root.
        path: Utf8PathBuf,
    },

    /// The source root exists but holds no files to package.
    #[error("no source files found under {path}")]
    EmptySource {
        /// The empty source root.
        path: Utf8PathBuf,
    },

    /// A metadata file lives outside every recognized subtree.
    #[error("metadata file {path} is not in a recognized location")]
    UnexpectedMetadata {
        /// Path of the file relative to the metadata root.
        path: String,
    },

    /// A metadata file in a recognized subtree has invalid content.
    #[error("invalid metadata file {path}: {reason}")]
    InvalidMetadata {
        /// Path of the file relative to the metadata root.
        path: String,
        /// Description of the content failure.
        reason: String,
    },

    /// The package bytes are not a readable gzip-compressed tar stream.
    #[error("malformed code package: {reason}")]
    PackageFormat {
        /// Description of the decoding failure.
        reason: String,
    },

    /// An archive entry violates the packaging security policy.
    #[error("{rule} in payload: {path}")]
    PackageValidation {
        /// The offending entry path as recorded in the archive.
        path: String,
        /// The rule the entry violated.
        rule: ValidationRule,
    },

    /// An I/O operation on an enumerated file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

impl PackagerError {
    pub(crate) fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_metadata(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidMetadata {
            path: path.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn package_format(err: &std::io::Error) -> Self {
        Self::PackageFormat {
            reason: err.to_string(),
        }
    }
}

/// Result type alias using [`PackagerError`].
pub type Result<T> = std::result::Result<T, PackagerError>;
