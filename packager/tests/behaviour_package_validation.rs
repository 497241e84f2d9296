//! Behaviour-driven tests for code package validation.
//!
//! Scenarios drive `validate_package` with packages produced by the
//! builder and with hand-written headers a hostile peer could send.

use ccpack_packager::archive::{ArchiveEntry, build_package, validate_package};
use ccpack_packager::{PackagerError, ValidationRule};
use flate2::Compression;
use flate2::write::GzEncoder;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tar::{EntryType, Header};

#[derive(Default)]
struct ValidationWorld {
    built: Vec<ArchiveEntry>,
    raw: Vec<(String, u32, EntryType)>,
    package: Option<Vec<u8>>,
    outcome: Option<Result<(), PackagerError>>,
}

#[fixture]
fn world() -> ValidationWorld {
    ValidationWorld::default()
}

fn parse_mode(mode: &str) -> u32 {
    u32::from_str_radix(mode, 8).expect("octal mode")
}

fn parse_rule(rule: &str) -> ValidationRule {
    match rule {
        "privileged mode" => ValidationRule::PrivilegedMode,
        "bad namespace" => ValidationRule::BadNamespace,
        "path traversal" => ValidationRule::PathTraversal,
        "unsupported entry type" => ValidationRule::UnsupportedEntryType,
        other => panic!("unknown rule {other}"),
    }
}

/// Writes headers verbatim, bypassing the builder's path checks.
fn raw_package(entries: &[(String, u32, EntryType)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (name, mode, kind) in entries {
        let payload: &[u8] = if kind.is_dir() { &[] } else { b"payload" };
        let mut header = Header::new_old();
        header.as_old_mut().name[..name.len()].copy_from_slice(name.as_bytes());
        header.set_mode(*mode);
        header.set_entry_type(*kind);
        header.set_size(payload.len() as u64);
        header.set_cksum();
        builder.append(&header, payload).expect("append raw entry");
    }
    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish gzip")
}

#[given("a source file \"{path}\" with mode \"{mode}\"")]
fn given_source_file(world: &mut ValidationWorld, path: String, mode: String) {
    world
        .built
        .push(ArchiveEntry::bytes(path, parse_mode(&mode), "contents"));
}

#[given("a raw entry \"{path}\" with mode \"{mode}\"")]
fn given_raw_entry(world: &mut ValidationWorld, path: String, mode: String) {
    world.raw.push((path, parse_mode(&mode), EntryType::Regular));
}

#[given("a raw directory \"{path}\" with mode \"{mode}\"")]
fn given_raw_directory(world: &mut ValidationWorld, path: String, mode: String) {
    world.raw.push((path, parse_mode(&mode), EntryType::Directory));
}

#[given("package bytes \"{bytes}\"")]
fn given_package_bytes(world: &mut ValidationWorld, bytes: String) {
    world.package = Some(bytes.into_bytes());
}

#[when("the package is validated")]
fn when_validated(world: &mut ValidationWorld) {
    let package = match world.package.take() {
        Some(bytes) => bytes,
        None if world.raw.is_empty() => build_package(&world.built).expect("build package"),
        None => raw_package(&world.raw),
    };
    world.outcome = Some(validate_package(&package));
}

#[then("validation succeeds")]
fn then_succeeds(world: &mut ValidationWorld) {
    let outcome = world.outcome.take().expect("validated");
    assert!(outcome.is_ok(), "expected success: {outcome:?}");
}

#[then("validation fails with rule \"{rule}\" at \"{path}\"")]
fn then_fails_with_rule(world: &mut ValidationWorld, rule: String, path: String) {
    let expected_rule = parse_rule(&rule);
    match world.outcome.take().expect("validated") {
        Err(PackagerError::PackageValidation { path: actual, rule }) => {
            assert_eq!(rule, expected_rule);
            assert_eq!(actual, path);
        }
        other => panic!("expected a {rule} violation, got {other:?}"),
    }
}

#[then("validation fails with a format error")]
fn then_format_error(world: &mut ValidationWorld) {
    let outcome = world.outcome.take().expect("validated");
    assert!(
        matches!(outcome, Err(PackagerError::PackageFormat { .. })),
        "expected a format error: {outcome:?}"
    );
}

#[scenario(
    path = "tests/features/package_validation.feature",
    name = "A package built from a source tree passes validation"
)]
fn scenario_built_package_passes(world: ValidationWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/package_validation.feature",
    name = "A set-user-id binary is rejected"
)]
fn scenario_setuid_rejected(world: ValidationWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/package_validation.feature",
    name = "A set-group-id directory is rejected"
)]
fn scenario_setgid_directory_rejected(world: ValidationWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/package_validation.feature",
    name = "An absolute path is rejected"
)]
fn scenario_absolute_path_rejected(world: ValidationWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/package_validation.feature",
    name = "A path escaping its namespace is rejected"
)]
fn scenario_traversal_rejected(world: ValidationWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/package_validation.feature",
    name = "Bytes that are not a package are a format error"
)]
fn scenario_garbage_is_format_error(world: ValidationWorld) {
    let _ = world;
}
