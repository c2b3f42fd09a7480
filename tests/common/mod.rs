//! Shared test utilities for integration and E2E tests.
//!
//! Add `mod common;` to a test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! let fixture = TestFixture::new();
//! let head = fixture.git_working_copy("host/org/plugin", &[("plugin/p.vim", "")]);
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_fs::prelude::*;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::git_available;
    pub use super::TestFixture;
}

/// Whether a usable `git` binary is on PATH
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .current_dir(dir)
        .args(["-c", "user.name=volt", "-c", "user.email=volt@example.com"])
        .args(["-c", "commit.gpgsign=false", "-c", "init.defaultBranch=master"])
        .args(args)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

/// A volt directory and a Vim directory inside one temporary root.
#[allow(dead_code)]
pub struct TestFixture {
    pub temp: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    pub fn new() -> Self {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("volt").create_dir_all().unwrap();
        Self { temp }
    }

    pub fn volt_dir(&self) -> PathBuf {
        self.temp.path().join("volt")
    }

    pub fn vim_dir(&self) -> PathBuf {
        self.temp.path().join("vim")
    }

    pub fn repos_dir(&self, repos_path: &str) -> PathBuf {
        self.volt_dir().join("repos").join(repos_path)
    }

    /// Write lock.json with one "default" profile selecting every entry
    pub fn write_lock_json(&self, repos: &[(&str, &str, &str)]) {
        let entries: Vec<_> = repos
            .iter()
            .map(|(t, p, v)| serde_json::json!({ "type": t, "path": p, "version": v }))
            .collect();
        let paths: Vec<_> = repos.iter().map(|(_, p, _)| *p).collect();
        let lock = serde_json::json!({
            "version": 2,
            "current_profile_name": "default",
            "repos": entries,
            "profiles": [{
                "name": "default",
                "repos_path": paths,
                "use_vimrc": true,
                "use_gvimrc": true
            }]
        });
        fs::write(
            self.volt_dir().join("lock.json"),
            serde_json::to_string_pretty(&lock).unwrap(),
        )
        .unwrap();
    }

    /// Create a committed working copy at the repository's source location
    pub fn git_working_copy(&self, repos_path: &str, files: &[(&str, &str)]) -> String {
        let dir = self.repos_dir(repos_path);
        fs::create_dir_all(&dir).unwrap();
        git(&dir, &["init", "-q"]);
        self.commit(repos_path, files)
    }

    pub fn commit(&self, repos_path: &str, files: &[(&str, &str)]) -> String {
        let dir = self.repos_dir(repos_path);
        for (path, content) in files {
            let full = dir.join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
        git(&dir, &["add", "-A"]);
        git(&dir, &["commit", "-q", "--allow-empty", "-m", "commit"]);
        git(&dir, &["rev-parse", "HEAD"])
    }

    /// Turn the working copy at `repos_path` into a bare repository in place
    pub fn make_bare(&self, repos_path: &str) {
        let dir = self.repos_dir(repos_path);
        let tmp = self.temp.path().join("bare-tmp");
        git(
            self.temp.path(),
            &["clone", "-q", "--bare", dir.to_str().unwrap(), tmp.to_str().unwrap()],
        );
        fs::remove_dir_all(&dir).unwrap();
        fs::rename(&tmp, &dir).unwrap();
    }

    /// A stand-in `vim` that appends its arguments to `vim.log`
    #[cfg(unix)]
    pub fn fake_vim(&self) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = self.temp.path().join("bin/vim");
        let log = self.temp.path().join("vim.log");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            format!("#!/bin/sh\necho \"$@\" >> '{}'\n", log.display()),
        )
        .unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    pub fn vim_log(&self) -> String {
        fs::read_to_string(self.temp.path().join("vim.log")).unwrap_or_default()
    }
}
