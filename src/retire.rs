//! Directory retirement
//!
//! Replaces a live directory without exposing a half-built tree and without
//! waiting for a slow recursive delete:
//!
//! 1. rename the live directory to `<name>.old<token>` next to it,
//! 2. recreate the live directory, empty,
//! 3. delete the renamed copy on a dedicated thread while the caller
//!    repopulates the live directory,
//! 4. join the deletion with [`PendingRemoval::wait`] at the very end.
//!
//! If the rename fails nothing has been touched and nothing is cleaned up.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use log::info;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Background deletion of a retired directory
#[derive(Debug)]
pub struct PendingRemoval {
    retired: PathBuf,
    live: PathBuf,
    done: JoinHandle<io::Result<()>>,
}

impl PendingRemoval {
    /// A removal of `live` whose background deletion fails with `message`
    #[cfg(test)]
    pub(crate) fn failed(live: &Path, message: &str) -> Self {
        let message = message.to_string();
        PendingRemoval {
            retired: retired_name(live),
            live: live.to_path_buf(),
            done: thread::spawn(move || Err(io::Error::other(message))),
        }
    }

    /// Where the old copy was moved to
    pub fn retired_path(&self) -> &Path {
        &self.retired
    }

    /// Block until the deletion has finished and report its outcome
    pub fn wait(self) -> Result<()> {
        let outcome = self
            .done
            .join()
            .unwrap_or_else(|_| Err(io::Error::other("background removal panicked")));
        outcome.map_err(|e| Error::Retire {
            path: self.live.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// Sibling name for a retired copy of `live`
fn retired_name(live: &Path) -> PathBuf {
    let token = Uuid::new_v4().simple().to_string();
    let mut name = live
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".old{}", token));
    live.with_file_name(name)
}

/// Retire `live` and recreate it empty.
///
/// Returns `None` when `live` did not exist; it is still created.
pub fn retire(live: &Path) -> Result<Option<PendingRemoval>> {
    let pending = if live.symlink_metadata().is_ok() {
        let retired = retired_name(live);
        fs::rename(live, &retired).map_err(|e| Error::Retire {
            path: live.display().to_string(),
            message: format!("could not rename to '{}': {}", retired.display(), e),
        })?;

        info!("Removing {} ...", live.display());

        let target = retired.clone();
        let done = thread::Builder::new()
            .name("volt-retire".to_string())
            .spawn(move || fs::remove_dir_all(&target))
            .map_err(|e| Error::Retire {
                path: live.display().to_string(),
                message: format!("could not start removal of '{}': {}", retired.display(), e),
            })?;

        Some(PendingRemoval {
            retired,
            live: live.to_path_buf(),
            done,
        })
    } else {
        None
    };

    fs::create_dir_all(live)?;
    Ok(pending)
}
