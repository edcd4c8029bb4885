//! Integration tests for the `miwifi` CLI binary.
//!
//! These tests validate argument parsing, help output, shell completions,
//! config handling, and error reporting without a live router.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

const NONEXISTENT: &str = "/tmp/miwifi-cli-test-nonexistent";

/// Build a [`Command`] for the `miwifi` binary with env isolation.
///
/// Clears all `MIWIFI_*` env vars and points config lookups at a
/// nonexistent path so tests never touch the user's real configuration.
fn miwifi_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("miwifi");
    cmd.env("HOME", NONEXISTENT)
        .env("XDG_CONFIG_HOME", NONEXISTENT)
        .env("MIWIFI_CONFIG", format!("{NONEXISTENT}/config.toml"))
        .env_remove("MIWIFI_PROFILE")
        .env_remove("MIWIFI_HOST")
        .env_remove("MIWIFI_USERNAME")
        .env_remove("MIWIFI_PASSWORD")
        .env_remove("MIWIFI_OUTPUT")
        .env_remove("MIWIFI_INSECURE")
        .env_remove("MIWIFI_TIMEOUT")
        .env_remove("MIWIFI_DEFAULT_PROFILE")
        .env_remove("RUST_LOG")
        // Never an interactive terminal, so no password prompt.
        .write_stdin("");
    cmd
}

/// A command whose config file lives at `path`.
fn miwifi_cmd_with_config(path: &Path) -> assert_cmd::Command {
    let mut cmd = miwifi_cmd();
    cmd.env("MIWIFI_CONFIG", path);
    cmd
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
    let output = miwifi_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    miwifi_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("MiWiFi")
            .and(predicate::str::contains("readings"))
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("endpoints")),
    );
}

#[test]
fn test_version_flag() {
    miwifi_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("miwifi"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    miwifi_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    miwifi_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Offline commands ────────────────────────────────────────────────

#[test]
fn test_endpoints_lists_names_and_paths() {
    miwifi_cmd()
        .args(["endpoints", "--output", "plain"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("cpe_detect")
                .and(predicate::str::contains("wan_statistics"))
                .and(predicate::str::contains("msgbox_count")),
        );

    miwifi_cmd()
        .arg("endpoints")
        .assert()
        .success()
        .stdout(predicate::str::contains("xqdtcustom/cpe_detect"));
}

#[test]
fn test_config_path_honours_override() {
    miwifi_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(NONEXISTENT));
}

#[test]
fn test_config_show_no_config() {
    // A missing file renders the built-in defaults.
    miwifi_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("refresh_interval"));
}

#[test]
fn test_config_init_writes_profile() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("miwifi").join("config.toml");

    miwifi_cmd_with_config(&path)
        .args([
            "--host",
            "10.0.0.1",
            "config",
            "init",
            "--name",
            "cpe",
            "--password-env",
            "CPE_PASSWORD",
        ])
        .assert()
        .success();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("default_profile = \"cpe\""), "{written}");
    assert!(written.contains("host = \"10.0.0.1\""), "{written}");
    assert!(written.contains("password_env = \"CPE_PASSWORD\""), "{written}");

    // A second init for the same name needs --force.
    let output = miwifi_cmd_with_config(&path)
        .args(["config", "init", "--name", "cpe"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("already exists"));

    miwifi_cmd_with_config(&path)
        .args(["config", "show", "--output", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"cpe\""));
}

#[test]
fn test_config_show_redacts_passwords() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[profiles.home]\nhost = \"192.168.31.1\"\npassword = \"hunter2\"\n",
    )
    .unwrap();

    miwifi_cmd_with_config(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hunter2").not().and(predicate::str::contains("********")));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = miwifi_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success(), "Expected failure for invalid subcommand");
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_readings_without_router_config() {
    let output = miwifi_cmd().arg("readings").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("No router configured"));
}

#[test]
fn test_missing_password_is_an_auth_error() {
    let output = miwifi_cmd()
        .args(["--host", "127.0.0.1", "readings"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("No password configured"));
}

#[test]
fn test_unknown_endpoint_fails_before_login() {
    let output = miwifi_cmd()
        .env("MIWIFI_PASSWORD", "pw")
        // Nothing listens here; reaching the network would be a connection error.
        .args(["--host", "127.0.0.1:9", "get", "reboot"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Unknown endpoint 'reboot'"));
}

#[test]
fn test_unknown_reading_fails_before_login() {
    let output = miwifi_cmd()
        .env("MIWIFI_PASSWORD", "pw")
        .args(["--host", "127.0.0.1:9", "readings", "warp_factor"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Unknown reading 'warp_factor'"));
}

#[test]
fn test_read_key_and_index_conflict() {
    let output = miwifi_cmd()
        .args([
            "read",
            "cpe_detect",
            "net.ipv4info.dns",
            "--key",
            "ip",
            "--index",
            "0",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("cannot be used with"));
}

#[test]
fn test_invalid_timeout() {
    let output = miwifi_cmd()
        .args(["--timeout", "soon", "readings"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--timeout"));
}

#[test]
fn test_unknown_profile() {
    let output = miwifi_cmd()
        .args(["--profile", "office", "readings"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Profile 'office' not found"));
}
