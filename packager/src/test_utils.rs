//! Shared test doubles for the packager crate.

use crate::error::{PackagerError, Result};
use crate::executor::CommandExecutor;
use crate::module_info::{DependencyPackage, ModuleInfo, ModuleQuery};
use camino::{Utf8Path, Utf8PathBuf};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a successful command `Output` with the given stdout.
#[must_use]
pub fn stdout_output(stdout: &str) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// Working directory the command must be run in, if any.
    pub dir: Option<Utf8PathBuf>,
    /// The command to execute (e.g., "go").
    pub cmd: &'static str,
    /// The arguments to pass to the command.
    pub args: Vec<&'static str>,
    /// Environment variables the command must be given.
    pub env: Vec<(&'static str, &'static str)>,
    /// The result to return when this command is invoked.
    pub result: Result<Output>,
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Replays expected invocations in order and reports any divergence as
/// [`PackagerError::StubMismatch`].
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
        }
    }

    /// Returns `true` once every expected invocation has been consumed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.expected.borrow().is_empty()
    }
}

impl CommandExecutor for StubExecutor {
    fn run_with_env(
        &self,
        dir: Option<&Utf8Path>,
        env: &[(&str, &str)],
        cmd: &str,
        args: &[&str],
    ) -> Result<Output> {
        let call = self
            .expected
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| PackagerError::StubMismatch {
                message: format!("unexpected invocation: {cmd} {}", args.join(" ")),
            })?;

        let matches = call.cmd == cmd
            && call.args.as_slice() == args
            && call.dir.as_deref() == dir
            && call.env.as_slice() == env;
        if !matches {
            return Err(PackagerError::StubMismatch {
                message: format!(
                    "expected {} {} in {:?} with {:?}, got {cmd} {} in {dir:?} with {env:?}",
                    call.cmd,
                    call.args.join(" "),
                    call.dir,
                    call.env,
                    args.join(" "),
                ),
            });
        }

        call.result
    }
}

/// A `ModuleQuery` answering from a fixed directory table.
///
/// Directories absent from the table are reported as not owned by any
/// module, and import paths absent from the dependency table have no
/// dependencies.
#[derive(Debug, Default)]
pub struct StaticModuleQuery {
    modules: HashMap<Utf8PathBuf, ModuleInfo>,
    workspace: Option<Utf8PathBuf>,
    dependencies: HashMap<String, Vec<DependencyPackage>>,
    unresolved: HashMap<String, String>,
}

impl StaticModuleQuery {
    /// Creates an empty query that knows of no modules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `info` as the answer for `dir`.
    #[must_use]
    pub fn with_module(mut self, dir: impl Into<Utf8PathBuf>, info: ModuleInfo) -> Self {
        self.modules.insert(dir.into(), info);
        self
    }

    /// Sets the legacy workspace root reported by the query.
    #[must_use]
    pub fn with_workspace(mut self, root: impl Into<Utf8PathBuf>) -> Self {
        self.workspace = Some(root.into());
        self
    }

    /// Registers `packages` as the import graph of `import_path`.
    #[must_use]
    pub fn with_dependencies(
        mut self,
        import_path: impl Into<String>,
        packages: Vec<DependencyPackage>,
    ) -> Self {
        self.dependencies.insert(import_path.into(), packages);
        self
    }

    /// Makes `import_path` fail to resolve because it imports `missing`.
    #[must_use]
    pub fn with_unresolved_import(
        mut self,
        import_path: impl Into<String>,
        missing: impl Into<String>,
    ) -> Self {
        self.unresolved.insert(import_path.into(), missing.into());
        self
    }
}

impl ModuleQuery for StaticModuleQuery {
    fn module_info(&self, dir: &Utf8Path) -> Result<Option<ModuleInfo>> {
        Ok(self.modules.get(dir).cloned())
    }

    fn workspace_root(&self) -> Result<Utf8PathBuf> {
        self.workspace
            .clone()
            .ok_or_else(|| PackagerError::StubMismatch {
                message: "no workspace root configured".to_owned(),
            })
    }

    fn workspace_dependencies(
        &self,
        workspace_root: &Utf8Path,
        import_path: &str,
    ) -> Result<Vec<DependencyPackage>> {
        if let Some(missing) = self.unresolved.get(import_path) {
            return Err(PackagerError::Resolution {
                path: import_path.to_owned(),
                reason: format!(
                    "cannot find package \"{missing}\" in {workspace_root}/src/{missing}"
                ),
            });
        }
        Ok(self
            .dependencies
            .get(import_path)
            .cloned()
            .unwrap_or_default())
    }
}
