//! Integration tests for the portpatch CLI

use std::process::Command;

fn portpatch() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_portpatch"));
    // Keep a developer's own config and environment out of the tests
    cmd.env_remove("PORTPATCH_SOURCES")
        .env_remove("PORTPATCH_REFERENCE")
        .env_remove("PORTPATCH_COLOR")
        .env_remove("PORTPATCH_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_version() {
    let output = portpatch()
        .arg("--version")
        .output()
        .expect("Failed to execute portpatch");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("portpatch"));
}

#[test]
fn test_cli_help() {
    let output = portpatch()
        .arg("--help")
        .output()
        .expect("Failed to execute portpatch");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("run"));
    assert!(stdout.contains("resolve"));
    assert!(stdout.contains("apply"));
}

#[test]
fn test_cli_invalid_command() {
    let output = portpatch()
        .arg("invalid-command")
        .output()
        .expect("Failed to execute portpatch");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unrecognized subcommand"));
}

#[test]
fn test_run_requires_tree() {
    let output = portpatch()
        .arg("run")
        .output()
        .expect("Failed to execute portpatch");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--tree"));
}

#[test]
fn test_missing_config_file_is_reported() {
    let temp = tempfile::tempdir().unwrap();
    let output = portpatch()
        .args(["--config"])
        .arg(temp.path().join("missing.toml"))
        .args(["apply", "--tree"])
        .arg(temp.path())
        .output()
        .expect("Failed to execute portpatch");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Configuration error"));
}

#[test]
fn test_apply_with_empty_local_dir_reports_zero() {
    let temp = tempfile::tempdir().unwrap();
    let tree = temp.path().join("tree");
    let local = temp.path().join("local");
    std::fs::create_dir_all(&tree).unwrap();
    std::fs::create_dir_all(&local).unwrap();
    let config = temp.path().join("config.toml");
    std::fs::write(&config, "[patch]\nprogram = \"sh\"\n").unwrap();

    let output = portpatch()
        .arg("--config")
        .arg(&config)
        .args(["--json", "apply", "--tree"])
        .arg(&tree)
        .arg("--local-patches")
        .arg(&local)
        .output()
        .expect("Failed to execute portpatch");

    assert!(output.status.success(), "{output:?}");
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["type"], "Apply");
    assert_eq!(json["data"]["applied"], 0);
    assert_eq!(json["data"]["skipped"], 0);
}
