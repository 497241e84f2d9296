//! The Go chaincode platform.
//!
//! [`Platform`] binds a [`PlatformConfig`] to a module ownership query and
//! exposes every packaging operation behind one value, the way a peer
//! addresses a language platform.

use crate::config::PlatformConfig;
use camino::Utf8Path;
use ccpack_packager::Result;
use ccpack_packager::archive::validate_package;
use ccpack_packager::build_script::{BuildOptions, generate_build_script, generate_dockerfile};
use ccpack_packager::descriptor::{SourceDescriptor, describe_code};
use ccpack_packager::executor::SystemCommandExecutor;
use ccpack_packager::module_info::{GoModuleQuery, ModuleQuery};
use ccpack_packager::path;
use ccpack_packager::payload::get_deployment_payload;
use log::debug;

/// Identifier of the Go platform.
pub const PLATFORM_NAME: &str = "GOLANG";

/// Packaging operations for Go chaincode.
#[derive(Debug, Clone)]
pub struct Platform<Q = GoModuleQuery<SystemCommandExecutor>> {
    config: PlatformConfig,
    query: Q,
}

impl Platform {
    /// Creates a platform that consults the installed `go` toolchain.
    #[must_use]
    pub const fn new(config: PlatformConfig) -> Self {
        Self::with_query(config, GoModuleQuery::new(SystemCommandExecutor))
    }
}

impl<Q: ModuleQuery> Platform<Q> {
    /// Creates a platform using `query` for module ownership lookups.
    pub const fn with_query(config: PlatformConfig, query: Q) -> Self {
        Self { config, query }
    }

    /// The platform identifier.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        PLATFORM_NAME
    }

    /// The configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// Checks that `identifier` is an acceptable chaincode path.
    ///
    /// # Errors
    ///
    /// Returns [`ccpack_packager::PackagerError::InvalidPath`].
    pub fn validate_path(&self, identifier: &str) -> Result<()> {
        path::validate_path(identifier)
    }

    /// Returns the canonical identifier for `identifier`.
    ///
    /// # Errors
    ///
    /// Returns [`ccpack_packager::PackagerError::Resolution`] if the
    /// toolchain cannot be queried.
    pub fn normalize_path(&self, identifier: &str) -> Result<String> {
        path::normalize_path(&self.query, identifier)
    }

    /// Resolves `identifier` into a source descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`ccpack_packager::PackagerError::InvalidPath`] for an empty
    /// identifier and [`ccpack_packager::PackagerError::Resolution`] if
    /// the toolchain cannot be queried.
    pub fn describe_code(&self, identifier: &str) -> Result<SourceDescriptor> {
        describe_code(&self.query, self.workspace_override(), identifier)
    }

    /// Packages the chaincode at `identifier`.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing stage.
    pub fn get_deployment_payload(&self, identifier: &str) -> Result<Vec<u8>> {
        debug!("{PLATFORM_NAME}: packaging {identifier}");
        get_deployment_payload(&self.query, self.workspace_override(), identifier)
    }

    /// Checks an untrusted code package.
    ///
    /// # Errors
    ///
    /// Returns [`ccpack_packager::PackagerError::PackageValidation`] or
    /// [`ccpack_packager::PackagerError::PackageFormat`].
    pub fn validate_code_package(&self, package: &[u8]) -> Result<()> {
        validate_package(package)
    }

    /// Linker options selected by the dynamic-link setting.
    #[must_use]
    pub const fn get_ld_flags_opts(&self) -> &'static str {
        self.config.link_mode().ldflags()
    }

    /// Build script compiling `identifier` with the configured link mode.
    #[must_use]
    pub fn generate_build_script(&self, identifier: &str) -> String {
        generate_build_script(identifier, self.config.link_mode())
    }

    /// Image directive for the configured runtime image.
    #[must_use]
    pub fn generate_dockerfile(&self) -> String {
        generate_dockerfile(&self.config.chaincode.golang.runtime)
    }

    /// Builder image and script for compiling `identifier`.
    #[must_use]
    pub fn docker_build_options(&self, identifier: &str) -> BuildOptions {
        BuildOptions {
            image: self.config.chaincode.builder.clone(),
            script: self.generate_build_script(identifier),
        }
    }

    fn workspace_override(&self) -> Option<&Utf8Path> {
        self.config.chaincode.golang.workspace.as_deref()
    }
}
