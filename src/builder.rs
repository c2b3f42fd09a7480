//! # Build Orchestration
//!
//! Reproduces the active profile's repositories inside the Vim package tree.
//!
//! Two build modes exist:
//!
//! - **Link build** (`volt build`): working copies are exposed under
//!   `pack/volt/opt/` through links, bare repositories are extracted at their
//!   pinned commit, and help tags are regenerated for each destination.
//! - **Full rebuild** (`volt rebuild`): `pack/volt/start/` is retired and
//!   every repository is reconstructed into it by content, git repositories
//!   from their pinned commit and static ones by directory copy.
//!
//! Both modes run in the same order: guard and install the startup files,
//! prepare the destination root, fan out one worker per repository, join
//! any background removal, and finally write build-info.json. A failure at
//! any step ends the build; build-info.json is only written on success.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use log::{debug, info};

use crate::buildinfo::BuildInfo;
use crate::error::{Error, Result};
use crate::git;
use crate::installer;
use crate::lockjson::{LockJson, Repos, ReposType};
use crate::materialize::{self, LinkStrategy};
use crate::path::{encode_repos_path, Layout};
use crate::rcfile;
use crate::retire::{self, PendingRemoval};
use crate::transaction::Transaction;
use crate::vim::{self, Vim};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Link working copies into the opt directory
    Link,
    /// Reconstruct everything by content into the start directory
    Full,
}

/// What to do with one repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Write the pinned commit's tree into the destination
    ExtractSnapshot,
    /// Link the destination to the source
    Link,
    /// Recursively copy the source directory
    CopyDir,
}

/// Choose how `repos`, cloned at `src`, is materialized in `mode`
pub fn select_action(mode: BuildMode, repos: &Repos, src: &Path) -> Result<Action> {
    match (&repos.r#type, mode) {
        (ReposType::Git, BuildMode::Link) => {
            if git::is_bare_repository(src)? {
                Ok(Action::ExtractSnapshot)
            } else {
                Ok(Action::Link)
            }
        }
        (ReposType::Git, BuildMode::Full) => Ok(Action::ExtractSnapshot),
        (ReposType::Static, BuildMode::Link) => Ok(Action::Link),
        (ReposType::Static, BuildMode::Full) => Ok(Action::CopyDir),
        (ReposType::Other(t), _) => Err(Error::InvalidType {
            path: repos.path.clone(),
            r#type: t.clone(),
        }),
    }
}

/// Runs builds against one filesystem layout
pub struct Builder<'a> {
    layout: &'a Layout,
    linker: LinkStrategy,
}

impl<'a> Builder<'a> {
    pub fn new(layout: &'a Layout) -> Self {
        Self {
            layout,
            linker: LinkStrategy::detect(),
        }
    }

    /// Link build into the opt directory.
    ///
    /// With `full`, the whole opt directory is retired first; otherwise
    /// each destination is replaced in place and entries that left the
    /// profile are pruned.
    pub fn build(
        &self,
        _trx: &Transaction,
        lock_json: &LockJson,
        vim: &dyn Vim,
        full: bool,
    ) -> Result<BuildInfo> {
        let profile = lock_json.current_profile()?;
        let repos_list = lock_json.repos_list_by_profile(profile)?;

        info!("Installing vimrc and gvimrc ...");
        rcfile::install_all(self.layout, profile)?;

        let opt_dir = self.layout.opt_dir();
        let pending = if full {
            retire::retire(&opt_dir)?
        } else {
            fs::create_dir_all(&opt_dir).map_err(|e| Error::Retire {
                path: opt_dir.display().to_string(),
                message: format!("could not create: {}", e),
            })?;
            self.prune(&opt_dir, &repos_list)?;
            None
        };

        info!("Installing all repositories files ...");
        let installed = installer::install_all(&repos_list, |repos| {
            self.install_linked(repos, vim)
        });
        finish(installed, pending)?;

        let build_info = BuildInfo::from_repos_list(&repos_list);
        build_info.write(&self.layout.build_info())?;
        Ok(build_info)
    }

    /// Full rebuild into the start directory
    pub fn rebuild(&self, _trx: &Transaction, lock_json: &LockJson) -> Result<BuildInfo> {
        let profile = lock_json.current_profile()?;
        let repos_list = lock_json.repos_list_by_profile(profile)?;
        let start_dir = self.layout.start_dir();

        info!("Rebuilding {} directory ...", start_dir.display());
        info!("Installing vimrc and gvimrc ...");
        rcfile::install_all(self.layout, profile)?;

        let pending = retire::retire(&start_dir)?;

        info!("Installing all repositories files ...");
        let installed = installer::install_all(&repos_list, |repos| self.install_copied(repos));
        finish(installed, pending)?;

        let build_info = BuildInfo::from_repos_list(&repos_list);
        build_info.write(&self.layout.build_info())?;
        Ok(build_info)
    }

    /// Remove opt entries that no longer belong to the profile
    fn prune(&self, opt_dir: &Path, repos_list: &[Repos]) -> Result<()> {
        let wanted: HashSet<String> = repos_list
            .iter()
            .map(|r| encode_repos_path(&r.path))
            .collect();
        for entry in fs::read_dir(opt_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !wanted.contains(&name) {
                debug!("Removing {} ...", entry.path().display());
                materialize::remove_destination(&entry.path())?;
            }
        }
        Ok(())
    }

    fn install_linked(&self, repos: &Repos, vim: &dyn Vim) -> Result<()> {
        let src = self.layout.full_repos_path(&repos.path);
        let dst = self.layout.pack_repos_path(&repos.path);

        let action = select_action(BuildMode::Link, repos, &src)?;
        self.materialize(action, repos, &src, &dst)?;
        vim::regenerate_helptags(vim, &dst)?;

        info!("Installing {} repository {} ... Done.", repos.r#type, repos.path);
        Ok(())
    }

    fn install_copied(&self, repos: &Repos) -> Result<()> {
        let src = self.layout.full_repos_path(&repos.path);
        let dst = self.layout.start_repos_path(&repos.path);

        let action = select_action(BuildMode::Full, repos, &src)?;
        self.materialize(action, repos, &src, &dst)?;

        info!("Installing {} repository {} ... Done.", repos.r#type, repos.path);
        Ok(())
    }

    /// Replace `dst` with `src` as `action` says, in either build mode
    fn materialize(&self, action: Action, repos: &Repos, src: &Path, dst: &Path) -> Result<()> {
        materialize::remove_destination(dst)?;
        match action {
            Action::ExtractSnapshot => {
                materialize::write_snapshot(src, &repos.version, dst)?;
            }
            Action::Link => self.linker.link(src, dst)?,
            Action::CopyDir => {
                materialize::copy_dir(src, dst).map_err(|e| {
                    Error::Io(std::io::Error::other(format!(
                        "failed to copy static directory: {}",
                        e
                    )))
                })?;
            }
        }
        Ok(())
    }
}

/// Join the background removal, then report install errors before it
fn finish(installed: Result<()>, pending: Option<PendingRemoval>) -> Result<()> {
    let removed = match pending {
        Some(pending) => pending.wait(),
        None => Ok(()),
    };
    installed?;
    removed
}
