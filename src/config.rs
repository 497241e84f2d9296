//! Platform configuration.
//!
//! Settings are read from a TOML file shaped like the peer's core
//! configuration:
//!
//! ```toml
//! [chaincode]
//! builder = "fabric-ccenv:latest"
//!
//! [chaincode.golang]
//! runtime = "fabric-baseos:latest"
//! dynamic_link = false
//! workspace = "/opt/gopath"
//! ```
//!
//! Every key may be overridden from the environment. Variable names are the
//! dotted key upper-cased, prefixed with `CORE_`, with dots replaced by
//! underscores (`CORE_CHAINCODE_GOLANG_RUNTIME`). Empty variables are
//! ignored.

use crate::error::ConfigError;
use camino::{Utf8Path, Utf8PathBuf};
use ccpack_packager::build_script::LinkMode;
use log::debug;
use serde::Deserialize;
use std::fs;

/// Image the compiled chaincode runs in when none is configured.
pub const DEFAULT_RUNTIME_IMAGE: &str = "fabric-baseos:latest";

/// Image the build script runs in when none is configured.
pub const DEFAULT_BUILDER_IMAGE: &str = "fabric-ccenv:latest";

/// Overrides `chaincode.builder`.
pub const ENV_BUILDER: &str = "CORE_CHAINCODE_BUILDER";

/// Overrides `chaincode.golang.runtime`.
pub const ENV_RUNTIME: &str = "CORE_CHAINCODE_GOLANG_RUNTIME";

/// Overrides `chaincode.golang.dynamic_link`.
pub const ENV_DYNAMIC_LINK: &str = "CORE_CHAINCODE_GOLANG_DYNAMICLINK";

/// Overrides `chaincode.golang.workspace`.
pub const ENV_WORKSPACE: &str = "CORE_CHAINCODE_GOLANG_WORKSPACE";

/// Top-level platform configuration.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PlatformConfig {
    /// Chaincode build settings.
    pub chaincode: ChaincodeConfig,
}

/// The `[chaincode]` table.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ChaincodeConfig {
    /// Image the build script runs in.
    pub builder: String,
    /// Go-specific settings.
    pub golang: GolangConfig,
}

impl Default for ChaincodeConfig {
    fn default() -> Self {
        Self {
            builder: DEFAULT_BUILDER_IMAGE.to_owned(),
            golang: GolangConfig::default(),
        }
    }
}

/// The `[chaincode.golang]` table.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GolangConfig {
    /// Image named in the generated image directive.
    pub runtime: String,
    /// Link the chaincode binary dynamically instead of statically.
    #[serde(alias = "dynamicLink")]
    pub dynamic_link: bool,
    /// Legacy workspace root. When unset the toolchain is asked for it.
    pub workspace: Option<Utf8PathBuf>,
}

impl Default for GolangConfig {
    fn default() -> Self {
        Self {
            runtime: DEFAULT_RUNTIME_IMAGE.to_owned(),
            dynamic_link: false,
            workspace: None,
        }
    }
}

impl PlatformConfig {
    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML, mistyped values,
    /// or unknown keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use ccpack::config::PlatformConfig;
    ///
    /// let config = PlatformConfig::from_toml_str("[chaincode.golang]\nruntime = \"buildimage\"\n")?;
    /// assert_eq!(config.chaincode.golang.runtime, "buildimage");
    /// # Ok::<(), ccpack::error::ConfigError>(())
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })
    }

    /// Reads and parses the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read and
    /// [`ConfigError::Parse`] if its contents are invalid.
    pub fn from_path(path: &Utf8Path) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        debug!("loaded configuration from {path}");
        Self::from_toml_str(&source)
    }

    /// Loads configuration from `path` (or defaults) and applies overrides
    /// from the process environment.
    ///
    /// # Errors
    ///
    /// Propagates file and override errors.
    pub fn load(path: Option<&Utf8Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, Self::from_path, |key| std::env::var(key).ok())
    }

    /// Loads configuration using the supplied file loader and environment
    /// lookup.
    ///
    /// Exists so tests can substitute both sources without touching the
    /// filesystem or the process environment.
    ///
    /// # Errors
    ///
    /// Propagates errors from `loader` and from applying overrides.
    ///
    /// # Examples
    ///
    /// ```
    /// use ccpack::config::PlatformConfig;
    ///
    /// let config = PlatformConfig::load_with(
    ///     None,
    ///     |_| unreachable!("no file requested"),
    ///     |key| (key == "CORE_CHAINCODE_GOLANG_RUNTIME").then(|| "buildimage".to_owned()),
    /// )?;
    /// assert_eq!(config.chaincode.golang.runtime, "buildimage");
    /// # Ok::<(), ccpack::error::ConfigError>(())
    /// ```
    pub fn load_with<L, E>(path: Option<&Utf8Path>, loader: L, env: E) -> Result<Self, ConfigError>
    where
        L: FnOnce(&Utf8Path) -> Result<Self, ConfigError>,
        E: Fn(&str) -> Option<String>,
    {
        let base = match path {
            Some(path) => loader(path)?,
            None => Self::default(),
        };
        base.with_env_overrides(env)
    }

    /// Applies `CORE_`-prefixed overrides found through `env`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] if the dynamic-link
    /// override is not a boolean.
    pub fn with_env_overrides<E>(mut self, env: E) -> Result<Self, ConfigError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| env(key).filter(|value| !value.is_empty());

        if let Some(builder) = lookup(ENV_BUILDER) {
            self.chaincode.builder = builder;
        }
        if let Some(runtime) = lookup(ENV_RUNTIME) {
            self.chaincode.golang.runtime = runtime;
        }
        if let Some(value) = lookup(ENV_DYNAMIC_LINK) {
            self.chaincode.golang.dynamic_link = parse_bool(ENV_DYNAMIC_LINK, &value)?;
        }
        if let Some(workspace) = lookup(ENV_WORKSPACE) {
            self.chaincode.golang.workspace = Some(Utf8PathBuf::from(workspace));
        }
        Ok(self)
    }

    /// Link mode selected by `chaincode.golang.dynamic_link`.
    #[must_use]
    pub const fn link_mode(&self) -> LinkMode {
        LinkMode::from_dynamic_flag(self.chaincode.golang.dynamic_link)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim() {
        "1" | "t" | "T" => Ok(true),
        "0" | "f" | "F" => Ok(false),
        v if v.eq_ignore_ascii_case("true") => Ok(true),
        v if v.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(ConfigError::InvalidOverride {
            key: key.to_owned(),
            value: value.to_owned(),
            expected: "true or false",
        }),
    }
}
