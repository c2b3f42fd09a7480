//! Filesystem layout and repository path escaping
//!
//! Two roots are involved in every build:
//!
//! - the volt directory (`$VOLTPATH`, default `~/volt`) holding `lock.json`,
//!   `build-info.json`, the cloned repositories under `repos/`, and the
//!   per-profile startup file sources under `rc/<profile>/`;
//! - the Vim directory (default `~/.vim`, `~/vimfiles` on Windows) holding
//!   the generated `vimrc`/`gvimrc` and the package tree `pack/volt/`.
//!
//! Under `pack/volt/`, `opt/` holds link-build destinations and `start/`
//! holds fully copied destinations. Destination names are flat, escaped
//! repository paths (see [`encode_repos_path`]).

use std::path::{Path, PathBuf};

/// File name of the vimrc source under `rc/<profile>/`
pub const VIMRC_SRC: &str = "vimrc.vim";
/// File name of the gvimrc source under `rc/<profile>/`
pub const GVIMRC_SRC: &str = "gvimrc.vim";

/// Escape a repository path into a single, flat directory name.
///
/// `_` becomes `__` and `/` becomes `_`, in one left-to-right pass, so
/// `a/b` and `a_b` map to `a_b` and `a__b`. The escaping is not injective
/// once `_` sits next to `/` (`a_/b` and `a/_b` both give `a___b`); lock
/// files whose profiles contain such a pair are rejected by
/// [`crate::lockjson::LockJson::parse`].
pub fn encode_repos_path(repos_path: &str) -> String {
    let mut encoded = String::with_capacity(repos_path.len() + 8);
    for c in repos_path.chars() {
        match c {
            '_' => encoded.push_str("__"),
            '/' => encoded.push('_'),
            c => encoded.push(c),
        }
    }
    encoded
}

/// Resolved locations of everything a build reads or writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    volt_dir: PathBuf,
    vim_dir: PathBuf,
}

impl Layout {
    pub fn new(volt_dir: impl Into<PathBuf>, vim_dir: impl Into<PathBuf>) -> Self {
        Self {
            volt_dir: volt_dir.into(),
            vim_dir: vim_dir.into(),
        }
    }

    pub fn volt_dir(&self) -> &Path {
        &self.volt_dir
    }

    pub fn vim_dir(&self) -> &Path {
        &self.vim_dir
    }

    pub fn lock_json(&self) -> PathBuf {
        self.volt_dir.join("lock.json")
    }

    pub fn build_info(&self) -> PathBuf {
        self.volt_dir.join("build-info.json")
    }

    pub fn trx_lock(&self) -> PathBuf {
        self.volt_dir.join("trx.lock")
    }

    /// Where the repository identified by `repos_path` is cloned
    pub fn full_repos_path(&self, repos_path: &str) -> PathBuf {
        let mut path = self.volt_dir.join("repos");
        for part in repos_path.split('/').filter(|p| !p.is_empty()) {
            path.push(part);
        }
        path
    }

    /// Source of a profile-specific startup file
    pub fn rc_file_of(&self, profile: &str, name: &str) -> PathBuf {
        self.volt_dir.join("rc").join(profile).join(name)
    }

    pub fn vimrc(&self) -> PathBuf {
        self.vim_dir.join("vimrc")
    }

    pub fn gvimrc(&self) -> PathBuf {
        self.vim_dir.join("gvimrc")
    }

    /// Root of the link-build destinations
    pub fn opt_dir(&self) -> PathBuf {
        self.vim_dir.join("pack").join("volt").join("opt")
    }

    /// Root of the fully copied destinations, replaced wholesale on rebuild
    pub fn start_dir(&self) -> PathBuf {
        self.vim_dir.join("pack").join("volt").join("start")
    }

    pub fn pack_repos_path(&self, repos_path: &str) -> PathBuf {
        self.opt_dir().join(encode_repos_path(repos_path))
    }

    pub fn start_repos_path(&self, repos_path: &str) -> PathBuf {
        self.start_dir().join(encode_repos_path(repos_path))
    }
}

/// Default volt directory: `$HOME/volt`
pub fn default_volt_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("volt")
}

/// Default Vim directory: `$HOME/.vim`, or `$HOME/vimfiles` on Windows
pub fn default_vim_dir() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    if cfg!(windows) {
        home.join("vimfiles")
    } else {
        home.join(".vim")
    }
}
