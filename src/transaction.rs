//! Process-wide build lock
//!
//! A [`Transaction`] is taken by the command layer and handed to the build
//! core by reference; the core never creates or releases one. The lock is a
//! file created exclusively, holding the owner's pid, and removed on drop.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::warn;

use crate::error::{Error, Result};

#[derive(Debug)]
pub struct Transaction {
    path: PathBuf,
}

impl Transaction {
    /// Take the lock at `path`; fails if another process holds it
    pub fn begin(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| Error::Transaction {
                message: if e.kind() == io::ErrorKind::AlreadyExists {
                    format!(
                        "'{}' exists; another volt process may be running",
                        path.display()
                    )
                } else {
                    format!("{}: {}", path.display(), e)
                },
            })?;
        write_owner(&mut file, path)?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Record our pid in the freshly created lock; remove the lock if that fails
fn write_owner(file: &mut impl Write, path: &Path) -> Result<()> {
    write!(file, "{}", std::process::id())
        .and_then(|()| file.flush())
        .map_err(|e| {
            if let Err(remove) = fs::remove_file(path) {
                warn!("Failed to remove {}: {}", path.display(), remove);
            }
            Error::Transaction {
                message: format!("{}: {}", path.display(), e),
            }
        })
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("Failed to remove {}: {}", self.path.display(), e);
        }
    }
}
