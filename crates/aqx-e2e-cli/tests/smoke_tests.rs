//! Smoke tests for the aqx-e2e CLI
//!
//! None of these launch a browser.

#![allow(deprecated)] // Command::cargo_bin
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;

/// Get a command for the aqx-e2e binary
fn aqx() -> Command {
    let mut cmd = Command::cargo_bin("aqx-e2e").expect("aqx-e2e binary should exist");
    cmd.env_remove("AQX_USERNAME")
        .env_remove("AQX_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_version_flag() {
    aqx()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_flag() {
    aqx()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("TARGET"))
        .stdout(predicate::str::contains("--shared-session"))
        .stdout(predicate::str::contains("--headed"));
}

#[test]
fn test_list_prints_catalogue() {
    aqx()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("AUTH-001"))
        .stdout(predicate::str::contains("TRD-008"))
        .stdout(predicate::str::contains("POS-003"))
        .stdout(predicate::str::contains("NTF-001"));
}

#[test]
fn test_invalid_target_fails() {
    aqx()
        .arg("WORKFLOW")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown target: WORKFLOW"));
}

#[test]
fn test_unknown_scenario_fails_before_launch() {
    aqx()
        .args(["test:AUTH-999", "--color", "never"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("AUTH-999"));
}

#[test]
fn test_bad_color_value_rejected() {
    aqx().args(["--color", "rainbow"]).assert().failure();
}
