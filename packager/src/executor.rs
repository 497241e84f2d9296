//! Abstraction over the external toolchain process.
//!
//! Module ownership and workspace discovery shell out to the Go toolchain.
//! Routing every invocation through [`CommandExecutor`] lets tests replace
//! the toolchain with scripted responses.

use crate::error::{PackagerError, Result};
use camino::Utf8Path;
use std::process::{Command, Output};

/// Abstraction for running external commands.
pub trait CommandExecutor {
    /// Runs `cmd` with `args` inside `dir` and returns the captured output.
    ///
    /// When `dir` is `None` the command inherits the caller's working
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::Resolution`] if the command cannot be
    /// spawned.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ccpack_packager::executor::{CommandExecutor, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor;
    /// let output = executor.run(None, "go", &["env", "GOPATH"])?;
    /// assert!(output.status.success());
    /// # Ok::<(), ccpack_packager::error::PackagerError>(())
    /// ```
    fn run(&self, dir: Option<&Utf8Path>, cmd: &str, args: &[&str]) -> Result<Output> {
        self.run_with_env(dir, &[], cmd, args)
    }

    /// Runs `cmd` like [`CommandExecutor::run`] with `env` added to the
    /// inherited environment.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::Resolution`] if the command cannot be
    /// spawned.
    fn run_with_env(
        &self,
        dir: Option<&Utf8Path>,
        env: &[(&str, &str)],
        cmd: &str,
        args: &[&str],
    ) -> Result<Output>;
}

/// Executes commands on the host system.
///
/// Blocks until the child exits; there is no timeout. Callers embedding
/// this in a service should bound the call themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run_with_env(
        &self,
        dir: Option<&Utf8Path>,
        env: &[(&str, &str)],
        cmd: &str,
        args: &[&str],
    ) -> Result<Output> {
        let mut command = Command::new(cmd);
        command.args(args).envs(env.iter().copied());
        if let Some(dir) = dir {
            command.current_dir(dir);
        }
        command.output().map_err(|e| PackagerError::Resolution {
            path: dir.map_or_else(|| cmd.to_owned(), ToString::to_string),
            reason: format!("failed to run {cmd}: {e}"),
        })
    }
}

/// Returns trimmed stdout, or an error carrying trimmed stderr when the
/// command exited unsuccessfully.
pub(crate) fn stdout_or_error(output: &Output, path: &str, what: &str) -> Result<String> {
    if output.status.success() {
        return Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned());
    }

    Err(PackagerError::Resolution {
        path: path.to_owned(),
        reason: format!("{what} failed: {}", stderr_message(output)),
    })
}

fn stderr_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        "unknown error".to_owned()
    } else {
        trimmed.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{failure_output, stdout_output};

    #[test]
    fn stdout_is_trimmed_on_success() {
        let output = stdout_output("/home/user/go\n");
        let text = stdout_or_error(&output, "cc", "go env").expect("success output");
        assert_eq!(text, "/home/user/go");
    }

    #[test]
    fn failure_carries_stderr() {
        let output = failure_output("go: cannot find main module");
        let err = stdout_or_error(&output, "cc", "go list").expect_err("failure output");
        let msg = err.to_string();
        assert!(msg.contains("go list failed"));
        assert!(msg.contains("cannot find main module"));
    }

    #[test]
    fn failure_without_stderr_is_reported_as_unknown() {
        let output = failure_output("   ");
        let err = stdout_or_error(&output, "cc", "go env").expect_err("failure output");
        assert!(err.to_string().contains("unknown error"));
    }
}
