//! `ccpack` CLI entrypoint.
//!
//! Packages Go chaincode, validates received packages, and prints the
//! container build script and image directive for a chaincode.

use camino::Utf8Path;
use ccpack::cli::{Cli, Command, PackageArgs};
use ccpack::config::PlatformConfig;
use ccpack::error::{CliError, Result};
use ccpack::platform::Platform;
use ccpack_packager::module_info::ModuleQuery;
use clap::Parser;
use std::fs;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    let mut stdout = std::io::stdout().lock();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<()> {
    let config = PlatformConfig::load(cli.config.as_deref())?;
    let platform = Platform::new(config);
    execute(&platform, &cli.command, stdout, stderr)
}

/// Runs one subcommand against `platform`.
fn execute<Q: ModuleQuery>(
    platform: &Platform<Q>,
    command: &Command,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<()> {
    match command {
        Command::Package(args) => package(platform, args, stdout, stderr),
        Command::Validate { package } => {
            let bytes = read_file(package)?;
            platform.validate_code_package(&bytes)?;
            write_line(stdout, format_args!("{package}: valid code package"))
        }
        Command::Normalize { identifier } => {
            platform.validate_path(identifier)?;
            let normalized = platform.normalize_path(identifier)?;
            write_line(stdout, normalized)
        }
        Command::BuildScript {
            identifier,
            with_image,
        } => {
            let options = platform.docker_build_options(identifier);
            if *with_image {
                write_line(stdout, format_args!("# image: {}", options.image))?;
            }
            stdout
                .write_all(options.script.as_bytes())
                .map_err(CliError::Output)
        }
        Command::Dockerfile => write_line(stdout, platform.generate_dockerfile()),
    }
}

fn package<Q: ModuleQuery>(
    platform: &Platform<Q>,
    args: &PackageArgs,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<()> {
    let bytes = platform.get_deployment_payload(&args.identifier)?;
    match &args.output {
        Some(path) => {
            fs::write(path, &bytes).map_err(|source| CliError::File {
                path: path.clone(),
                source,
            })?;
            write_stderr_line(
                stderr,
                format_args!("wrote {} bytes to {path}", bytes.len()),
            );
            Ok(())
        }
        None => stdout.write_all(&bytes).map_err(CliError::Output),
    }
}

fn read_file(path: &Utf8Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| CliError::File {
        path: path.to_owned(),
        source,
    })
}

fn write_line(out: &mut dyn Write, message: impl std::fmt::Display) -> Result<()> {
    writeln!(out, "{message}").map_err(CliError::Output)
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, err);
            1
        }
    }
}

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use ccpack_packager::PackagerError;
    use ccpack_packager::module_info::ModuleInfo;
    use ccpack_packager::test_utils::StaticModuleQuery;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct Outcome {
        result: Result<()>,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
    }

    impl Outcome {
        fn stdout_text(&self) -> String {
            String::from_utf8(self.stdout.clone()).expect("stdout was not UTF-8")
        }
    }

    #[fixture]
    fn workspace() -> TempDir {
        let temp = tempfile::tempdir().expect("temp dir");
        let source = temp.path().join("src/chaincodes/noop");
        fs::create_dir_all(&source).expect("mkdir");
        fs::write(source.join("chaincode.go"), "package main\n").expect("write");
        temp
    }

    fn utf8(temp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8 temp dir")
    }

    fn platform_for(workspace: &TempDir) -> Platform<StaticModuleQuery> {
        let mut config = PlatformConfig::default();
        config.chaincode.golang.runtime = "buildimage".to_owned();
        config.chaincode.golang.workspace = Some(utf8(workspace));
        Platform::with_query(config, StaticModuleQuery::new())
    }

    fn execute_with(platform: &Platform<StaticModuleQuery>, command: Command) -> Outcome {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let result = execute(platform, &command, &mut stdout, &mut stderr);
        Outcome {
            result,
            stdout,
            stderr,
        }
    }

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(()), &mut stderr);
        assert_eq!(exit_code, 0);
        assert!(stderr.is_empty());
    }

    #[test]
    fn exit_code_for_run_result_prints_error_and_returns_one() {
        let err = CliError::from(PackagerError::EmptySource {
            path: Utf8PathBuf::from("/go/src/chaincodes/empty"),
        });

        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Err(err), &mut stderr);
        assert_eq!(exit_code, 1);

        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(stderr_text.contains("no source files found under /go/src/chaincodes/empty"));
    }

    #[rstest]
    fn package_then_validate_round_trips(workspace: TempDir) {
        let platform = platform_for(&workspace);
        let output = utf8(&workspace).join("noop.tar.gz");

        let packaged = execute_with(
            &platform,
            Command::Package(PackageArgs {
                identifier: "chaincodes/noop".to_owned(),
                output: Some(output.clone()),
            }),
        );
        assert!(packaged.result.is_ok(), "{:?}", packaged.result);
        assert!(String::from_utf8_lossy(&packaged.stderr).contains("noop.tar.gz"));

        let validated = execute_with(&platform, Command::Validate { package: output });
        assert!(validated.result.is_ok(), "{:?}", validated.result);
        assert!(validated.stdout_text().contains("valid code package"));
    }

    #[rstest]
    fn package_without_output_writes_the_archive_to_stdout(workspace: TempDir) {
        let platform = platform_for(&workspace);
        let outcome = execute_with(
            &platform,
            Command::Package(PackageArgs {
                identifier: "chaincodes/noop".to_owned(),
                output: None,
            }),
        );
        assert!(outcome.result.is_ok(), "{:?}", outcome.result);
        assert!(platform.validate_code_package(&outcome.stdout).is_ok());
    }

    #[rstest]
    fn validate_reports_unreadable_files(workspace: TempDir) {
        let platform = platform_for(&workspace);
        let outcome = execute_with(
            &platform,
            Command::Validate {
                package: utf8(&workspace).join("missing.tar.gz"),
            },
        );
        assert!(matches!(outcome.result, Err(CliError::File { .. })));
    }

    #[rstest]
    fn normalize_prints_the_module_relative_path(workspace: TempDir) {
        let mut config = PlatformConfig::default();
        config.chaincode.golang.workspace = Some(utf8(&workspace));
        let query = StaticModuleQuery::new().with_module(
            "testdata/ccmodule",
            ModuleInfo {
                dir: Utf8PathBuf::from("/work/testdata/ccmodule"),
                import_path: "ccmodule".to_owned(),
                module_path: String::new(),
                module_root: Utf8PathBuf::from("/work/testdata"),
            },
        );
        let platform = Platform::with_query(config, query);

        let outcome = execute_with(
            &platform,
            Command::Normalize {
                identifier: "testdata/ccmodule".to_owned(),
            },
        );
        assert!(outcome.result.is_ok(), "{:?}", outcome.result);
        assert_eq!(outcome.stdout_text(), "ccmodule\n");
    }

    #[rstest]
    fn normalize_rejects_scheme_prefixed_paths(workspace: TempDir) {
        let outcome = execute_with(
            &platform_for(&workspace),
            Command::Normalize {
                identifier: "https://github.com/acme/cc".to_owned(),
            },
        );
        assert!(matches!(
            outcome.result,
            Err(CliError::Packager(PackagerError::InvalidPath { .. }))
        ));
    }

    #[rstest]
    #[case::script_only(false)]
    #[case::with_image(true)]
    fn build_script_prints_the_script(workspace: TempDir, #[case] with_image: bool) {
        let outcome = execute_with(
            &platform_for(&workspace),
            Command::BuildScript {
                identifier: "the-path".to_owned(),
                with_image,
            },
        );
        assert!(outcome.result.is_ok(), "{:?}", outcome.result);
        let text = outcome.stdout_text();
        assert_eq!(text.starts_with("# image: fabric-ccenv:latest\n"), with_image);
        assert!(text.ends_with("echo Done!\n"));
    }

    #[rstest]
    fn dockerfile_prints_the_runtime_directive(workspace: TempDir) {
        let outcome = execute_with(&platform_for(&workspace), Command::Dockerfile);
        assert_eq!(
            outcome.stdout_text(),
            "FROM buildimage\nADD binpackage.tar /usr/local/bin\n"
        );
    }
}
