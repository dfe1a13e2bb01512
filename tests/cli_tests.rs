//! CLI integration tests for the `themesmith` binary.
//!
//! Runs the binary against temporary themes and checks exit codes and output.

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Run themesmith with the given arguments; returns (stdout, stderr, exit code).
fn run(root: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_themesmith"))
        .args(args)
        .arg("--root")
        .arg(root)
        .output()
        .expect("Failed to execute themesmith");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.code().unwrap_or(-1))
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_build_exit_zero() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write(root, "sass/style.scss", ".a {\n  color: red;\n}\n");
    write(root, "js/lib/lib.js", "function lib() { return 1; }\n");
    write(root, "js/main.js", "lib();\n");

    let (stdout, stderr, code) = run(root, &["build"]);
    assert_eq!(code, 0, "stdout: {}\nstderr: {}", stdout, stderr);
    assert!(stdout.contains("'build' succeeded"));
    assert!(root.join("js/dist/app.min.js").exists());
    assert!(root.join("css/maps/style.css.map").exists());
}

#[test]
fn test_lint_violation_exit_one() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write(root, "sass/style.scss", "#id {\n  color: red;\n}\n");

    let (stdout, _, code) = run(root, &["lint"]);
    assert_eq!(code, 1);
    assert!(stdout.contains("no-ids"));
    assert!(stdout.contains("'lint' failed at sass-lint"));
}

#[test]
fn test_unknown_task_exit_two() {
    let temp = TempDir::new().unwrap();
    let (_, stderr, code) = run(temp.path(), &["run", "deploy"]);
    assert_eq!(code, 2);
    assert!(stderr.contains("Unknown task 'deploy'"));
}

#[test]
fn test_invalid_config_exit_two() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "themesmith.toml", "[theme]\nname = \"acme\"\n\n[watch]\ndebounce_ms = 0\n");
    let (_, stderr, code) = run(temp.path(), &["build"]);
    assert_eq!(code, 2);
    assert!(stderr.contains("watch.debounce_ms"));
}

#[test]
fn test_relative_config_path_uses_current_dir() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write(root, "themesmith.toml", "[theme]\nname = \"acme\"\n");
    write(root, "sass/style.scss", ".a {\n  color: red;\n}\n");

    let output = Command::new(env!("CARGO_BIN_EXE_themesmith"))
        .args(["--config", "themesmith.toml", "lint"])
        .current_dir(root)
        .output()
        .expect("Failed to execute themesmith");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr);
    assert!(String::from_utf8_lossy(&output.stdout).contains("'lint' succeeded"));
}

#[test]
fn test_dry_run_writes_nothing() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "sass/style.scss", ".a {\n  color: red;\n}\n");

    let (stdout, _, code) = run(temp.path(), &["build", "--dry-run"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("dry run: sass -> js-babel -> js-uglify"));
    assert!(!temp.path().join("css").exists());
}

#[test]
fn test_list_shows_sequences() {
    let temp = TempDir::new().unwrap();
    let (stdout, _, code) = run(temp.path(), &["list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("sass -> js-babel -> js-uglify"));
    assert!(stdout.contains("sass-lint -> js-lint"));
    assert!(stdout.contains("js/dist/*.js"));
}
