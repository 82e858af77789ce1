//! Binary-level smoke tests.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;

fn upi() -> Command {
    Command::cargo_bin("upi").unwrap()
}

fn write_environment(dir: &Path) {
    let project = dir.join("game");
    fs::create_dir_all(project.join("Content")).unwrap();
    fs::write(project.join("Game.uproject"), "{}").unwrap();

    // Engine root pinned to an existing directory so discovery is skipped.
    fs::write(
        dir.join("environment.json"),
        json!({
            "project_root_path": "game/",
            "engine_root_path": dir,
            "artifacts_root_path": "artifacts/",
            "cache_root_path": "cache/",
            "artifact_name": "ci"
        })
        .to_string(),
    )
    .unwrap();
}

fn write_defaults(dir: &Path) {
    let commandlets = dir.join("defaults").join("commandlets");
    fs::create_dir_all(&commandlets).unwrap();
    fs::write(
        commandlets.join("package-info.json"),
        r#"{"command": "PkgInfoCommandlet", "flags": ["AssetRegistryDump"]}"#,
    )
    .unwrap();
    fs::write(
        commandlets.join("compile-blueprints.json"),
        r#"{"command": "CompileAllBlueprints", "ignore_exit_code": true}"#,
    )
    .unwrap();
}

#[test]
fn help_mentions_the_tool() {
    upi()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Unreal Package Inspector"));
}

#[test]
fn show_without_generated_config_fails() {
    let dir = tempfile::tempdir().unwrap();

    upi()
        .args(["--project-root"])
        .arg(dir.path())
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no generated config"));
}

#[test]
fn generate_then_show_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    write_environment(dir.path());
    write_defaults(dir.path());

    upi()
        .args(["config", "generate", "--environment"])
        .arg(dir.path().join("environment.json"))
        .arg("--defaults")
        .arg(dir.path().join("defaults"))
        .assert()
        .success()
        .stdout(predicate::str::contains("generated"));

    upi()
        .args(["--project-root"])
        .arg(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PkgInfoCommandlet"));
}

#[test]
fn commandlet_list_names_config_entries() {
    let dir = tempfile::tempdir().unwrap();
    write_environment(dir.path());
    write_defaults(dir.path());

    upi()
        .args(["config", "generate", "--environment"])
        .arg(dir.path().join("environment.json"))
        .arg("--defaults")
        .arg(dir.path().join("defaults"))
        .assert()
        .success();

    upi()
        .args(["--project-root"])
        .arg(dir.path())
        .args(["commandlet", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("package-info"));
}

#[test]
fn inspect_run_on_empty_project_needs_no_engine() {
    let dir = tempfile::tempdir().unwrap();
    write_environment(dir.path());
    write_defaults(dir.path());

    upi()
        .args(["config", "generate", "--environment"])
        .arg(dir.path().join("environment.json"))
        .arg("--defaults")
        .arg(dir.path().join("defaults"))
        .assert()
        .success();

    // No content files: the whole run is cache math, zero invocations.
    upi()
        .args(["--project-root"])
        .arg(dir.path())
        .args(["inspect", "run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("engine invocations: 0"));
}

#[test]
fn unknown_commandlet_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    write_environment(dir.path());
    write_defaults(dir.path());

    upi()
        .args(["config", "generate", "--environment"])
        .arg(dir.path().join("environment.json"))
        .arg("--defaults")
        .arg(dir.path().join("defaults"))
        .assert()
        .success();

    upi()
        .args(["--project-root"])
        .arg(dir.path())
        .args(["commandlet", "run", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown commandlet"));
}
