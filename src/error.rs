//! Error types for configuration loading and the `ccpack` command line.

use camino::Utf8PathBuf;
use ccpack_packager::PackagerError;
use thiserror::Error;

/// Errors raised while loading platform configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration {path}: {source}")]
    Read {
        /// Path of the configuration file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration text is not valid TOML for the expected schema.
    #[error("invalid configuration: {reason}")]
    Parse {
        /// Parser message.
        reason: String,
    },

    /// An environment override carries a value of the wrong type.
    #[error("invalid value {value:?} for {key}: expected {expected}")]
    InvalidOverride {
        /// Name of the environment variable.
        key: String,
        /// The rejected value.
        value: String,
        /// Description of the accepted values.
        expected: &'static str,
    },
}

/// Errors surfaced by the `ccpack` binary.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A packaging, resolution, or validation step failed.
    #[error(transparent)]
    Packager(#[from] PackagerError),

    /// An input or output file could not be accessed.
    #[error("{path}: {source}")]
    File {
        /// The file being read or written.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Writing to standard output failed.
    #[error("failed to write output: {0}")]
    Output(#[source] std::io::Error),
}

/// Result type alias using [`CliError`].
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use ccpack_packager::ValidationRule;

    #[test]
    fn packager_errors_are_shown_unchanged() {
        let err = CliError::from(PackagerError::PackageValidation {
            path: "src/path/to/setuid".to_owned(),
            rule: ValidationRule::PrivilegedMode,
        });
        assert_eq!(
            err.to_string(),
            "illegal file mode (setuid/setgid) in payload: src/path/to/setuid"
        );
    }

    #[test]
    fn invalid_override_names_the_variable() {
        let err = ConfigError::InvalidOverride {
            key: "CORE_CHAINCODE_GOLANG_DYNAMICLINK".to_owned(),
            value: "maybe".to_owned(),
            expected: "true or false",
        };
        let msg = err.to_string();
        assert!(msg.contains("CORE_CHAINCODE_GOLANG_DYNAMICLINK"));
        assert!(msg.contains("\"maybe\""));
    }
}
