//! Integration tests for the `aerolite` CLI binary.
//!
//! These tests validate argument parsing, help output, shell completions,
//! and error handling — all without requiring cloud access.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `aerolite` binary with env isolation.
///
/// Clears all `AEROLITE_*` env vars and points config directories at a
/// fresh temp dir so tests never touch the user's real configuration.
/// The temp dir is returned so it outlives the command.
fn aerolite_cmd() -> (assert_cmd::Command, tempfile::TempDir) {
    let home = tempfile::tempdir().expect("temp home dir");
    let mut cmd = cargo_bin_cmd!("aerolite");
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .env_remove("AEROLITE_PROFILE")
        .env_remove("AEROLITE_API_BASE")
        .env_remove("AEROLITE_REFRESH_TOKEN")
        .env_remove("AEROLITE_OUTPUT")
        .env_remove("AEROLITE_TIMEOUT");
    (cmd, home)
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let (mut cmd, _home) = aerolite_cmd();
    let output = cmd.output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let (mut cmd, _home) = aerolite_cmd();
    cmd.arg("--help").assert().success().stdout(
        predicate::str::contains("air quality")
            .and(predicate::str::contains("devices"))
            .and(predicate::str::contains("telemetry"))
            .and(predicate::str::contains("watch")),
    );
}

#[test]
fn test_version_flag() {
    let (mut cmd, _home) = aerolite_cmd();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("aerolite"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    let (mut cmd, _home) = aerolite_cmd();
    cmd.args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    let (mut cmd, _home) = aerolite_cmd();
    cmd.args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("aerolite"));
}

// ── Subcommand help ─────────────────────────────────────────────────

#[test]
fn test_devices_help() {
    let (mut cmd, _home) = aerolite_cmd();
    cmd.args(["devices", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("list").and(predicate::str::contains("get")));
}

#[test]
fn test_watch_help() {
    let (mut cmd, _home) = aerolite_cmd();
    cmd.args(["watch", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--interval").and(predicate::str::contains("--cycles")));
}

// ── Error handling ──────────────────────────────────────────────────

#[test]
fn test_unknown_command_fails() {
    let (mut cmd, _home) = aerolite_cmd();
    cmd.arg("frobnicate").assert().failure().code(2);
}

#[test]
fn test_devices_without_credentials_exits_auth_code() {
    let (mut cmd, _home) = aerolite_cmd();
    let output = cmd.args(["devices", "list"]).output().unwrap();
    assert_eq!(output.status.code(), Some(3), "Expected auth exit code 3");
    let text = combined_output(&output);
    assert!(
        text.contains("auth login"),
        "Expected re-auth hint in output:\n{text}"
    );
}

#[test]
fn test_unknown_profile_fails() {
    let (mut cmd, _home) = aerolite_cmd();
    let output = cmd
        .args(["--profile", "nonexistent", "devices", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(
        text.contains("nonexistent"),
        "Expected profile name in output:\n{text}"
    );
}

#[test]
fn test_watch_interval_floor() {
    let (mut cmd, _home) = aerolite_cmd();
    let output = cmd.args(["watch", "--interval", "5"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected usage exit code 2");
    let text = combined_output(&output);
    assert!(
        text.contains("at least 30"),
        "Expected interval floor message in output:\n{text}"
    );
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_prints_path() {
    let (mut cmd, _home) = aerolite_cmd();
    cmd.args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_show_reads_profile_from_home() {
    let (mut cmd, home) = aerolite_cmd();
    // XDG_CONFIG_HOME points at the temp dir, so the config lives at
    // <tmp>/aerolite-cli/config.toml.
    let config_dir = home.path().join("aerolite-cli");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        "default_profile = \"lab\"\n\n[profiles.lab]\nrefresh_token = \"super-secret\"\n",
    )
    .unwrap();

    let output = cmd.args(["config", "show"]).output().unwrap();
    let text = combined_output(&output);
    assert!(output.status.success(), "config show failed:\n{text}");
    assert!(
        text.contains("lab"),
        "Expected the profile to be listed:\n{text}"
    );
    assert!(
        !text.contains("super-secret"),
        "Token must be redacted in config show:\n{text}"
    );
}
