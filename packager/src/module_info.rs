//! Module ownership queries against the Go toolchain.
//!
//! A directory is owned by a module when `go env GOMOD`, run inside it,
//! names a manifest file. The toolchain reports an empty string or the
//! null device otherwise. For owned directories `go list -json -find`
//! supplies the package directory, its import path, and the module's
//! declared path and root.
//!
//! Packages in the legacy workspace layout have their imports resolved
//! with `go list -deps` in workspace mode, so every non-standard
//! dependency can travel in the package alongside the chaincode.

use crate::error::{PackagerError, Result};
use crate::executor::{CommandExecutor, stdout_or_error};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, trace};
use serde::Deserialize;

/// Name of the module manifest file.
pub const MODULE_MANIFEST: &str = "go.mod";

/// Name of the module dependency lock file.
pub const MODULE_LOCK: &str = "go.sum";

/// Values `go env GOMOD` prints when no module owns the directory.
const NO_MODULE_MARKERS: [&str; 3] = ["", "/dev/null", "NUL"];

/// Facts about the module that owns a source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Absolute directory of the package itself.
    pub dir: Utf8PathBuf,
    /// Import path of the package.
    pub import_path: String,
    /// Declared module path from the manifest; may be empty.
    pub module_path: String,
    /// Absolute root directory of the module.
    pub module_root: Utf8PathBuf,
}

impl ModuleInfo {
    /// Path of the package directory relative to the module root.
    ///
    /// Empty when the package is the module root.
    #[must_use]
    pub fn relative_dir(&self) -> Utf8PathBuf {
        self.dir
            .strip_prefix(&self.module_root)
            .map(Utf8Path::to_path_buf)
            .unwrap_or_default()
    }

    /// The identifier that addresses this package going forward.
    ///
    /// The module root prefix is stripped from the package directory and
    /// the remainder is appended to the declared module path, so packages
    /// in a module with no declared prefix collapse to their path relative
    /// to the module root.
    #[must_use]
    pub fn canonical_path(&self) -> String {
        let relative = self.relative_dir();
        let segments = [self.module_path.as_str(), relative.as_str()];
        segments
            .iter()
            .filter(|segment| !segment.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// A package reached from a chaincode's import graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyPackage {
    /// Import path of the package.
    pub import_path: String,
    /// Absolute directory holding the package's files.
    pub dir: Utf8PathBuf,
    /// Whether the package ships with the toolchain.
    pub standard: bool,
    /// Names of the files the build uses, relative to `dir`.
    pub files: Vec<String>,
}

/// Capability for asking the toolchain about source layout.
#[cfg_attr(test, mockall::automock)]
pub trait ModuleQuery {
    /// Returns the owning module of `dir`, or `None` when no module owns
    /// it or the directory does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::Resolution`] if the toolchain cannot be
    /// invoked or reports a failure.
    fn module_info(&self, dir: &Utf8Path) -> Result<Option<ModuleInfo>>;

    /// Returns the root of the legacy workspace.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::Resolution`] if the toolchain cannot be
    /// invoked or no workspace is configured.
    fn workspace_root(&self) -> Result<Utf8PathBuf>;

    /// Resolves the import graph of `import_path` inside the legacy
    /// workspace rooted at `workspace_root`.
    ///
    /// The result includes the package itself and every package it
    /// transitively imports.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::Resolution`] if the toolchain cannot be
    /// invoked or any import cannot be resolved.
    fn workspace_dependencies(
        &self,
        workspace_root: &Utf8Path,
        import_path: &str,
    ) -> Result<Vec<DependencyPackage>>;
}

/// [`ModuleQuery`] backed by the `go` command.
#[derive(Debug, Clone, Default)]
pub struct GoModuleQuery<E> {
    executor: E,
}

impl<E: CommandExecutor> GoModuleQuery<E> {
    /// Wraps `executor` as a module query.
    pub const fn new(executor: E) -> Self {
        Self { executor }
    }

    fn module_file(&self, dir: &Utf8Path) -> Result<String> {
        let output = self.executor.run(Some(dir), "go", &["env", "GOMOD"])?;
        stdout_or_error(&output, dir.as_str(), "go env GOMOD")
    }

    fn list_package(&self, dir: &Utf8Path) -> Result<ModuleInfo> {
        let output = self.executor.run(
            Some(dir),
            "go",
            &["list", "-json", "-find", "-mod=readonly", "."],
        )?;
        let json = stdout_or_error(&output, dir.as_str(), "go list")?;
        parse_package_listing(dir, &json)
    }
}

impl<E: CommandExecutor> ModuleQuery for GoModuleQuery<E> {
    fn module_info(&self, dir: &Utf8Path) -> Result<Option<ModuleInfo>> {
        if !dir.is_dir() {
            trace!("{dir} is not a directory; treating as outside any module");
            return Ok(None);
        }

        let mod_file = self.module_file(dir)?;
        if NO_MODULE_MARKERS.contains(&mod_file.as_str()) {
            debug!("{dir} is not owned by a module");
            return Ok(None);
        }

        debug!("{dir} is owned by module file {mod_file}");
        self.list_package(dir).map(Some)
    }

    fn workspace_root(&self) -> Result<Utf8PathBuf> {
        let output = self.executor.run(None, "go", &["env", "GOPATH"])?;
        let gopath = stdout_or_error(&output, "GOPATH", "go env GOPATH")?;
        first_path_element(&gopath).ok_or_else(|| PackagerError::Resolution {
            path: "GOPATH".to_owned(),
            reason: "GOPATH is not set".to_owned(),
        })
    }

    fn workspace_dependencies(
        &self,
        workspace_root: &Utf8Path,
        import_path: &str,
    ) -> Result<Vec<DependencyPackage>> {
        let output = self.executor.run_with_env(
            Some(workspace_root),
            &[("GOPATH", workspace_root.as_str()), ("GO111MODULE", "off")],
            "go",
            &["list", "-e", "-deps", "-json", import_path],
        )?;
        let json = stdout_or_error(&output, import_path, "go list -deps")?;
        let packages = parse_dependency_listing(import_path, &json)?;
        debug!(
            "{import_path} resolves to {} packages in {workspace_root}",
            packages.len()
        );
        Ok(packages)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PackageListing {
    dir: Utf8PathBuf,
    import_path: String,
    module: Option<ModuleListing>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ModuleListing {
    #[serde(default)]
    path: String,
    dir: Utf8PathBuf,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DependencyListing {
    import_path: String,
    dir: Utf8PathBuf,
    standard: bool,
    go_files: Vec<String>,
    cgo_files: Vec<String>,
    c_files: Vec<String>,
    #[serde(rename = "CXXFiles")]
    cxx_files: Vec<String>,
    h_files: Vec<String>,
    s_files: Vec<String>,
    syso_files: Vec<String>,
    embed_files: Vec<String>,
    error: Option<ListingError>,
    deps_errors: Vec<ListingError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListingError {
    err: String,
}

impl DependencyListing {
    fn first_error(&self) -> Option<&str> {
        self.error
            .iter()
            .chain(&self.deps_errors)
            .map(|e| e.err.as_str())
            .next()
    }

    fn into_package(self) -> DependencyPackage {
        let files = [
            self.go_files,
            self.cgo_files,
            self.c_files,
            self.cxx_files,
            self.h_files,
            self.s_files,
            self.syso_files,
            self.embed_files,
        ]
        .concat();
        DependencyPackage {
            import_path: self.import_path,
            dir: self.dir,
            standard: self.standard,
            files,
        }
    }
}

/// Parses the stream of JSON objects `go list -deps -json` prints.
fn parse_dependency_listing(import_path: &str, json: &str) -> Result<Vec<DependencyPackage>> {
    let mut packages = Vec::new();
    for listing in serde_json::Deserializer::from_str(json).into_iter::<DependencyListing>() {
        let listing = listing.map_err(|e| PackagerError::Resolution {
            path: import_path.to_owned(),
            reason: format!("unreadable go list output: {e}"),
        })?;
        if let Some(reason) = listing.first_error() {
            return Err(PackagerError::Resolution {
                path: import_path.to_owned(),
                reason: reason.to_owned(),
            });
        }
        trace!("{import_path} depends on {}", listing.import_path);
        packages.push(listing.into_package());
    }
    Ok(packages)
}

fn parse_package_listing(dir: &Utf8Path, json: &str) -> Result<ModuleInfo> {
    let listing: PackageListing =
        serde_json::from_str(json).map_err(|e| PackagerError::Resolution {
            path: dir.to_string(),
            reason: format!("unreadable go list output: {e}"),
        })?;

    let module = listing.module.ok_or_else(|| PackagerError::Resolution {
        path: dir.to_string(),
        reason: "go list reported no module for a module-owned directory".to_owned(),
    })?;

    Ok(ModuleInfo {
        dir: listing.dir,
        import_path: listing.import_path,
        module_path: module.path,
        module_root: module.dir,
    })
}

fn first_path_element(list: &str) -> Option<Utf8PathBuf> {
    std::env::split_paths(list)
        .find(|p| !p.as_os_str().is_empty())
        .and_then(|p| Utf8PathBuf::from_path_buf(p).ok())
}
