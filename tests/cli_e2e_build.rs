//! End-to-end tests for the `build` and `rebuild` commands
//!
//! These tests invoke the actual CLI binary and validate its behavior
//! from a user's perspective.

mod common;

use common::prelude::*;

/// Test that --help flag shows help information
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_build_help() {
    let mut cmd = cargo_bin_cmd!("volt");

    cmd.arg("build")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Install the active profile's plugins",
        ));
}

/// Test that a missing lock.json produces an error
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_rebuild_missing_lock_json() {
    let fixture = TestFixture::new();
    let mut cmd = cargo_bin_cmd!("volt");

    cmd.env("VOLTPATH", fixture.volt_dir())
        .env("VOLT_VIM_DIR", fixture.vim_dir())
        .arg("rebuild")
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not read lock.json"));
}

/// Test that a missing vim binary fails before anything is written
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_build_missing_vim() {
    let fixture = TestFixture::new();
    fixture.write_lock_json(&[]);
    let mut cmd = cargo_bin_cmd!("volt");

    cmd.env("VOLTPATH", fixture.volt_dir())
        .env("VOLT_VIM_DIR", fixture.vim_dir())
        .arg("build")
        .arg("--vim")
        .arg(fixture.temp.path().join("missing-vim"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("vim executable not found"));

    fixture.temp.child("vim").assert(predicate::path::missing());
}

/// Test the full link build through the binary, with a fake vim
#[test]
#[cfg(unix)]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_build_links_and_runs_helptags() {
    if !git_available() {
        return;
    }
    let fixture = TestFixture::new();
    let head = fixture.git_working_copy(
        "host/org/plugin",
        &[("plugin/p.vim", "\" p"), ("doc/p.txt", "*p.txt*")],
    );
    fixture.write_lock_json(&[("git", "host/org/plugin", head.as_str())]);
    let vim = fixture.fake_vim();
    let mut cmd = cargo_bin_cmd!("volt");

    cmd.env("VOLTPATH", fixture.volt_dir())
        .env("VOLT_VIM_DIR", fixture.vim_dir())
        .env("VOLT_VIM", &vim)
        .arg("build")
        .assert()
        .success()
        .stdout(predicate::str::contains("Installed 1 repositories"));

    fixture
        .temp
        .child("vim/pack/volt/opt/host_org_plugin")
        .assert(predicate::path::is_symlink());
    fixture
        .temp
        .child("volt/build-info.json")
        .assert(predicate::str::contains(head.as_str()));
    assert!(fixture.vim_log().contains("helptags"));
    fixture.temp.child("volt/trx.lock").assert(predicate::path::missing());
}

/// Test that a held transaction lock blocks a second run
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_rebuild_blocked_by_transaction() {
    let fixture = TestFixture::new();
    fixture.write_lock_json(&[]);
    fixture.temp.child("volt/trx.lock").write_str("1").unwrap();
    let mut cmd = cargo_bin_cmd!("volt");

    cmd.env("VOLTPATH", fixture.volt_dir())
        .env("VOLT_VIM_DIR", fixture.vim_dir())
        .arg("rebuild")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to begin transaction"));
}
