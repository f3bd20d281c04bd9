//! CLI smoke tests for stitch.
//!
//! These tests verify that all CLI commands run without panicking and
//! return appropriate exit codes.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the stitch binary.
fn stitch_cmd() -> Command {
  cargo_bin_cmd!("stitch")
}

/// Create a temp directory with a config file.
fn temp_config(content: &str) -> TempDir {
  let temp = TempDir::new().unwrap();
  fs::write(temp.path().join("stitch.toml"), content).unwrap();
  temp
}

fn write_output(root: &Path, module: &str, path: &str, content: &str) {
  let file = root.join("build/classes").join(module).join(path);
  fs::create_dir_all(file.parent().unwrap()).unwrap();
  fs::write(file, content).unwrap();
}

const BASICS_CONFIG: &str = r#"
[project]
group = "io.spbx"
name = "basics"
version = "0.1.1"

[[modules]]
name = "shared"
aggregated = true
outputs = ["build/classes/shared"]
dependencies = [
  { coordinate = "org.jetbrains:annotations:24.1.0", scope = "compile-only" },
  { coordinate = "com.google.guava:guava:33.2.0-jre", scope = "implementation", exported = true },
]

[[modules]]
name = "buffers"
aggregated = true
outputs = ["build/classes/buffers"]
dependencies = [{ module = "shared", scope = "implementation" }]

[[modules]]
name = "main"
aggregated = true
outputs = ["build/classes/main"]
dependencies = [
  { module = "buffers", scope = "implementation" },
  { coordinate = "io.netty:netty-all:4.1.110.Final", scope = "runtime-only" },
]

[assembly]
exclusions = ["**/templates**"]

[publish]
name = "Basics"
licenses = [{ name = "Apache-2.0", url = "https://www.apache.org/licenses/LICENSE-2.0" }]
"#;

const CYCLIC_CONFIG: &str = r#"
[project]
group = "g"
name = "n"
version = "1"

[[modules]]
name = "a"
dependencies = [{ module = "b", scope = "implementation" }]

[[modules]]
name = "b"
dependencies = [{ module = "a", scope = "compile-only" }]
"#;

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_works() {
  stitch_cmd()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_works() {
  stitch_cmd()
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("stitch"));
}

#[test]
fn subcommand_help_works() {
  for cmd in &["check", "resolve", "assemble", "publish"] {
    stitch_cmd()
      .arg(cmd)
      .arg("--help")
      .assert()
      .success()
      .stdout(predicate::str::contains("Usage"));
  }
}

// =============================================================================
// check
// =============================================================================

#[test]
fn check_valid_config() {
  let temp = temp_config(BASICS_CONFIG);

  stitch_cmd()
    .arg("--config")
    .arg(temp.path().join("stitch.toml"))
    .arg("check")
    .assert()
    .success()
    .stdout(predicate::str::contains("io.spbx:basics:0.1.1 is consistent"));
}

#[test]
fn check_reports_cycle() {
  let temp = temp_config(CYCLIC_CONFIG);

  stitch_cmd()
    .arg("--config")
    .arg(temp.path().join("stitch.toml"))
    .arg("check")
    .assert()
    .failure()
    .stderr(predicate::str::contains("a -> b -> a"));
}

#[test]
fn check_nonexistent_config_fails() {
  stitch_cmd()
    .arg("--config")
    .arg("/nonexistent/path/stitch.toml")
    .arg("check")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to load"));
}

// =============================================================================
// resolve
// =============================================================================

#[test]
fn resolve_prints_classpaths() {
  let temp = temp_config(BASICS_CONFIG);

  stitch_cmd()
    .arg("--config")
    .arg(temp.path().join("stitch.toml"))
    .args(["resolve", "--module", "shared"])
    .assert()
    .success()
    .stdout(predicate::str::contains("org.jetbrains:annotations:24.1.0"))
    .stdout(predicate::str::contains("compile:"));
}

#[test]
fn resolve_json_output() {
  let temp = temp_config(BASICS_CONFIG);

  let output = stitch_cmd()
    .arg("--config")
    .arg(temp.path().join("stitch.toml"))
    .args(["--format", "json", "resolve"])
    .output()
    .unwrap();

  assert!(output.status.success());
  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["order"], serde_json::json!(["shared", "buffers", "main"]));
  assert!(json["modules"]["main"]["runtime"].is_array());
}

#[test]
fn resolve_unknown_module_fails() {
  let temp = temp_config(BASICS_CONFIG);

  stitch_cmd()
    .arg("--config")
    .arg(temp.path().join("stitch.toml"))
    .args(["resolve", "--module", "nope"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Unknown module 'nope'"));
}

// =============================================================================
// assemble
// =============================================================================

#[test]
fn assemble_writes_jar() {
  let temp = temp_config(BASICS_CONFIG);
  write_output(temp.path(), "shared", "io/spbx/Shared.class", "shared");
  write_output(temp.path(), "shared", "templates/page.html", "<html/>");
  write_output(temp.path(), "main", "io/spbx/Main.class", "main");

  stitch_cmd()
    .arg("--config")
    .arg(temp.path().join("stitch.toml"))
    .arg("assemble")
    .assert()
    .success()
    .stdout(predicate::str::contains("Wrote"));

  assert!(temp.path().join("build/libs/basics-0.1.1.jar").exists());
}

#[test]
fn assemble_warns_on_collision() {
  let temp = temp_config(BASICS_CONFIG);
  write_output(temp.path(), "buffers", "X", "buffers");
  write_output(temp.path(), "main", "X", "main");
  let out = temp.path().join("dist");

  stitch_cmd()
    .arg("--config")
    .arg(temp.path().join("stitch.toml"))
    .arg("assemble")
    .arg("--out")
    .arg(&out)
    .assert()
    .success()
    .stderr(predicate::str::contains("X provided by both buffers and main"));

  assert!(out.join("basics-0.1.1.jar").exists());
}

// =============================================================================
// publish
// =============================================================================

#[test]
fn publish_writes_pom() {
  let temp = temp_config(BASICS_CONFIG);
  let out = temp.path().join("publications");

  stitch_cmd()
    .arg("--config")
    .arg(temp.path().join("stitch.toml"))
    .arg("publish")
    .arg("--out")
    .arg(&out)
    .assert()
    .success()
    .stdout(predicate::str::contains("Published io.spbx:basics:0.1.1"));

  let pom = fs::read_to_string(out.join("basics-0.1.1.pom")).unwrap();
  assert!(pom.contains("<artifactId>guava</artifactId>"));
  assert!(pom.contains("<artifactId>netty-all</artifactId>"));
  assert!(!pom.contains("annotations"));
  assert!(out.join("basics-0.1.1.json").exists());
}
