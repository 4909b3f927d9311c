// ABOUTME: Integration tests for the radi CLI commands.
// ABOUTME: Runs the binary against temporary projects using only the local builder.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

const PROJECT: &str = r#"name: demo
builders:
  - type: local
    implementations: [config, setting, project, command]
    settings:
      user_config_dir: false
"#;

fn radi_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("radi"));
    cmd.env_remove("RADI_LOG");
    cmd
}

fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "project.yml", PROJECT);
    dir
}

fn write(root: &Path, name: &str, contents: &str) {
    let dir = root.join(".radi");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(name), contents).unwrap();
}

#[test]
fn help_shows_commands() {
    radi_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("info"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn init_creates_project_file() {
    let dir = tempfile::tempdir().unwrap();

    radi_cmd()
        .current_dir(dir.path())
        .args(["init", "--name", "shop"])
        .assert()
        .success();

    let content = fs::read_to_string(dir.path().join(".radi/project.yml")).unwrap();
    assert!(content.contains("name: shop"));
    assert!(content.contains("type: local"));
}

#[test]
fn init_refuses_to_overwrite_existing_project() {
    let dir = project();

    radi_cmd()
        .current_dir(dir.path())
        .args(["init", "--name", "shop"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    radi_cmd()
        .current_dir(dir.path())
        .args(["init", "--name", "shop", "--force"])
        .assert()
        .success();
}

#[test]
fn list_shows_activated_operations() {
    let dir = project();

    radi_cmd()
        .arg("-C")
        .arg(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("setting.get"))
        .stdout(predicate::str::contains("project.info"))
        .stdout(predicate::str::contains("orchestrate.up").not());
}

#[test]
fn list_hides_internal_operations_unless_all() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "project.yml",
        &PROJECT.replace("[config, setting, project, command]", "[security]"),
    );

    radi_cmd()
        .arg("-C")
        .arg(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("security.user"))
        .stdout(predicate::str::contains("security.authorize").not());

    radi_cmd()
        .arg("-C")
        .arg(dir.path())
        .args(["list", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("security.authorize"));
}

#[test]
fn list_works_from_a_subdirectory() {
    let dir = project();
    let nested = dir.path().join("src/app");
    fs::create_dir_all(&nested).unwrap();

    radi_cmd()
        .current_dir(&nested)
        .args(["--quiet", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.list\n"));
}

#[test]
fn info_describes_properties() {
    let dir = project();

    radi_cmd()
        .arg("-C")
        .arg(dir.path())
        .args(["info", "setting.set"])
        .assert()
        .success()
        .stdout(predicate::str::contains("setting.key (string, required)"))
        .stdout(predicate::str::contains("[default: project]"));
}

#[test]
fn setting_round_trip() {
    let dir = project();

    radi_cmd()
        .arg("-C")
        .arg(dir.path())
        .args(["run", "setting.set", "-p", "setting.key=region", "-p", "setting.value=fi-hel1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("setting.set ok"));

    let output = radi_cmd()
        .arg("-C")
        .arg(dir.path())
        .args(["--json", "run", "setting.get", "-p", "setting.key=region"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["success"], true);
    assert_eq!(report["properties"]["setting.value"], "fi-hel1");
}

#[test]
fn failing_command_exits_non_zero() {
    let dir = project();
    write(dir.path(), "commands.yml", "broken:\n  exec: exit 4\n");

    radi_cmd()
        .arg("-C")
        .arg(dir.path())
        .args(["run", "command.exec", "-p", "command.id=broken"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("exited with code 4"));
}

#[test]
fn unknown_operation_fails() {
    let dir = project();

    radi_cmd()
        .arg("-C")
        .arg(dir.path())
        .args(["run", "orchestrate.up"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: unknown operation: orchestrate.up"));
}

#[test]
fn output_properties_cannot_be_assigned() {
    let dir = project();

    radi_cmd()
        .arg("-C")
        .arg(dir.path())
        .args(["run", "config.list", "-p", "config.keys=a"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn malformed_assignment_is_rejected() {
    let dir = project();

    radi_cmd()
        .arg("-C")
        .arg(dir.path())
        .args(["run", "setting.get", "-p", "setting.key"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "invalid property assignment 'setting.key', expected ID=VALUE",
        ));
}

#[test]
fn missing_project_is_reported() {
    let dir = tempfile::tempdir().unwrap();

    radi_cmd()
        .current_dir(dir.path())
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no radi project found"));
}
