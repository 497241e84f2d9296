//! Behaviour-driven tests for platform configuration loading.
//!
//! Scenarios write real configuration files and run the loader inside a
//! scoped process environment so `CORE_` overrides are exercised end to
//! end.

use camino::Utf8PathBuf;
use ccpack::config::{ENV_BUILDER, ENV_DYNAMIC_LINK, ENV_RUNTIME, ENV_WORKSPACE, PlatformConfig};
use ccpack::error::ConfigError;
use ccpack_packager::build_script::LinkMode;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::collections::BTreeMap;
use std::fs;
use tempfile::TempDir;

#[derive(Default)]
struct ConfigWorld {
    temp_dir: Option<TempDir>,
    config_file: Option<Utf8PathBuf>,
    env: BTreeMap<String, String>,
    outcome: Option<Result<PlatformConfig, ConfigError>>,
}

#[fixture]
fn world() -> ConfigWorld {
    ConfigWorld {
        temp_dir: Some(TempDir::new().expect("temp dir")),
        ..ConfigWorld::default()
    }
}

fn write_config(world: &mut ConfigWorld, contents: &str) {
    let dir = world.temp_dir.as_ref().expect("temp_dir set").path();
    let path = Utf8PathBuf::from_path_buf(dir.join("core.toml")).expect("utf8 temp dir");
    fs::write(&path, contents).expect("write config");
    world.config_file = Some(path);
}

fn loaded(world: &ConfigWorld) -> &PlatformConfig {
    match world.outcome.as_ref().expect("configuration should be loaded") {
        Ok(config) => config,
        Err(error) => panic!("expected configuration loading to succeed: {error}"),
    }
}

#[given("no configuration file")]
fn no_file(world: &mut ConfigWorld) {
    world.config_file = None;
}

#[given("a configuration file setting runtime \"{runtime}\" and dynamic linking")]
fn file_with_runtime(world: &mut ConfigWorld, runtime: String) {
    write_config(
        world,
        &format!("[chaincode.golang]\nruntime = \"{runtime}\"\ndynamic_link = true\n"),
    );
}

#[given("a configuration file containing \"{contents}\"")]
fn file_containing(world: &mut ConfigWorld, contents: String) {
    write_config(world, &contents.replace("\\n", "\n"));
}

#[given("the environment sets \"{key}\" to \"{value}\"")]
fn environment_sets(world: &mut ConfigWorld, key: String, value: String) {
    world.env.insert(key, value);
}

#[when("the platform configuration is loaded")]
fn load(world: &mut ConfigWorld) {
    let vars: Vec<(&str, Option<&str>)> = [ENV_BUILDER, ENV_RUNTIME, ENV_DYNAMIC_LINK, ENV_WORKSPACE]
        .into_iter()
        .map(|key| (key, world.env.get(key).map(String::as_str)))
        .collect();
    let path = world.config_file.clone();
    let outcome = temp_env::with_vars(vars, || PlatformConfig::load(path.as_deref()));
    world.outcome = Some(outcome);
}

#[then("the runtime image is \"{image}\"")]
fn runtime_image_is(world: &mut ConfigWorld, image: String) {
    assert_eq!(loaded(world).chaincode.golang.runtime, image);
}

#[then("the build links statically")]
fn links_statically(world: &mut ConfigWorld) {
    assert_eq!(loaded(world).link_mode(), LinkMode::Static);
}

#[then("the build links dynamically")]
fn links_dynamically(world: &mut ConfigWorld) {
    assert_eq!(loaded(world).link_mode(), LinkMode::Dynamic);
}

#[then("a configuration error mentioning \"{snippet}\" is reported")]
fn error_mentions(world: &mut ConfigWorld, snippet: String) {
    match world.outcome.as_ref().expect("configuration should be loaded") {
        Err(error) => assert!(
            error.to_string().contains(&snippet),
            "expected error '{error}' to mention '{snippet}'"
        ),
        Ok(config) => panic!("expected configuration loading to fail but got {config:?}"),
    }
}

#[scenario(
    path = "tests/features/config_loading.feature",
    name = "Defaults apply without a file or environment"
)]
fn scenario_defaults(world: ConfigWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/config_loading.feature",
    name = "File values select the runtime image and link mode"
)]
fn scenario_file_values(world: ConfigWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/config_loading.feature",
    name = "Environment overrides file values"
)]
fn scenario_environment_overrides(world: ConfigWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/config_loading.feature",
    name = "Unknown keys are rejected"
)]
fn scenario_unknown_keys(world: ConfigWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/config_loading.feature",
    name = "Malformed overrides are rejected"
)]
fn scenario_malformed_override(world: ConfigWorld) {
    let _ = world;
}
