//! Filesystem materialization of plugin destinations
//!
//! Two interchangeable ways to make a repository appear under the Vim
//! package tree:
//!
//! - **Link**: the destination is a symbolic link (or, on Windows, a
//!   directory junction) resolving to the source. Nothing is copied.
//! - **Copy**: the destination is written out file by file, either from a
//!   pinned git snapshot or by recursively copying a plain directory.
//!
//! Parent directories of a link destination are the caller's
//! responsibility; copies create whatever directories they need.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::git::{FileMode, Snapshot, TreeEntry};

/// How the host links a destination directory to its source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStrategy {
    /// Native symbolic link
    Symlink,
    /// `mklink /J` directory junction, for hosts without usable symlinks
    Junction,
}

impl LinkStrategy {
    /// Pick the strategy for the current host
    pub fn detect() -> Self {
        if cfg!(windows) {
            LinkStrategy::Junction
        } else {
            LinkStrategy::Symlink
        }
    }

    /// Make `dst` resolve to `src`. Fails if `dst` already exists.
    pub fn link(self, src: &Path, dst: &Path) -> Result<()> {
        if dst.symlink_metadata().is_ok() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("'{}' already exists", dst.display()),
            )));
        }

        match self {
            LinkStrategy::Symlink => symlink_dir(src, dst).map_err(Error::Io),
            LinkStrategy::Junction => {
                let status = Command::new("cmd")
                    .args(["/c", "mklink", "/J"])
                    .arg(dst)
                    .arg(src)
                    .status()?;
                if status.success() {
                    Ok(())
                } else {
                    Err(Error::Io(io::Error::other(format!(
                        "mklink /J '{}' '{}' exited with {}",
                        dst.display(),
                        src.display(),
                        status
                    ))))
                }
            }
        }
    }
}

#[cfg(unix)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(src, dst)
}

/// Remove a previously materialized destination, whether link or directory
pub fn remove_destination(dst: &Path) -> Result<()> {
    let metadata = match dst.symlink_metadata() {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    let file_type = metadata.file_type();
    if file_type.is_symlink() {
        // Directory symlinks and junctions on Windows need remove_dir.
        fs::remove_file(dst).or_else(|_| fs::remove_dir(dst))?;
    } else if file_type.is_dir() {
        fs::remove_dir_all(dst)?;
    } else {
        fs::remove_file(dst)?;
    }
    Ok(())
}

/// Join the raw tree path of `entry` onto `dst`, byte for byte
#[cfg(unix)]
fn entry_target(dst: &Path, entry: &TreeEntry) -> Result<PathBuf> {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let mut target = dst.to_path_buf();
    for part in entry.path.split(|b| *b == b'/').filter(|p| !p.is_empty()) {
        target.push(OsStr::from_bytes(part));
    }
    Ok(target)
}

#[cfg(not(unix))]
fn entry_target(dst: &Path, entry: &TreeEntry) -> Result<PathBuf> {
    let path = std::str::from_utf8(&entry.path).map_err(|_| {
        Error::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("path '{}' is not valid UTF-8", entry.display_path()),
        ))
    })?;
    let mut target = dst.to_path_buf();
    for part in path.split('/').filter(|p| !p.is_empty()) {
        target.push(part);
    }
    Ok(target)
}

/// Write one tree entry below `dst`, creating parents and applying its mode
pub fn write_entry(dst: &Path, entry: &TreeEntry) -> Result<()> {
    let target = entry_target(dst, entry)?;

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }

    #[cfg(unix)]
    {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;
        if entry.mode == FileMode::Symlink {
            std::os::unix::fs::symlink(OsStr::from_bytes(&entry.content), &target)?;
            return Ok(());
        }
    }

    fs::write(&target, &entry.content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&target, fs::Permissions::from_mode(entry.mode.permissions()))?;
    }
    Ok(())
}

/// Reconstruct the tree of `commit` from `repo` into `dst`.
///
/// Any single file failure aborts the whole extraction. Returns the number
/// of files written.
pub fn write_snapshot(repo: &Path, commit: &str, dst: &Path) -> Result<usize> {
    let snapshot = Snapshot::open(repo, commit)?;
    fs::create_dir_all(dst)?;

    let mut written = 0;
    for entry in snapshot.files()? {
        let entry = entry?;
        write_entry(dst, &entry).map_err(|e| Error::Git {
            path: repo.display().to_string(),
            message: format!("failed to write '{}': {}", entry.display_path(), e),
        })?;
        written += 1;
    }
    Ok(written)
}

/// Recursively copy the directory `src` to `dst`, keeping permissions
pub fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    if !src.is_dir() {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("'{}' is not a directory", src.display()),
        )));
    }

    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(|e| Error::Io(io::Error::other(e.to_string())))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| Error::Io(io::Error::other(e.to_string())))?;
        let target = dst.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            // fs::copy carries the permission bits over.
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    let target = fs::read_link(src)?;
    std::os::unix::fs::symlink(target, dst)?;
    Ok(())
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    if src.is_dir() {
        copy_dir(src, dst)
    } else {
        fs::copy(src, dst)?;
        Ok(())
    }
}
