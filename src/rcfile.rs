//! Managed startup files (vimrc / gvimrc)
//!
//! Every startup file volt writes begins with [`MAGIC_COMMENT`]. A file at a
//! managed location without that exact first line belongs to the user, and
//! its presence blocks the whole build before anything is written.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::lockjson::Profile;
use crate::path::{Layout, GVIMRC_SRC, VIMRC_SRC};

/// Ownership marker; must stay byte-identical with files written earlier.
pub const MAGIC_COMMENT: &str =
    "\" NOTE: this file was generated by volt. please modify original file.\n";

/// A startup file location together with its per-profile source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RcTarget {
    pub src: PathBuf,
    pub dst: PathBuf,
}

/// The startup files `profile` asks volt to manage
pub fn managed_targets(layout: &Layout, profile: &Profile) -> Vec<RcTarget> {
    let mut targets = Vec::with_capacity(2);
    if profile.use_vimrc {
        targets.push(RcTarget {
            src: layout.rc_file_of(&profile.name, VIMRC_SRC),
            dst: layout.vimrc(),
        });
    }
    if profile.use_gvimrc {
        targets.push(RcTarget {
            src: layout.rc_file_of(&profile.name, GVIMRC_SRC),
            dst: layout.gvimrc(),
        });
    }
    targets
}

/// Fail unless `path` starts with the ownership marker
pub fn should_have_magic_comment(path: &Path) -> Result<()> {
    let not_managed = || Error::RcFile {
        path: path.display().to_string(),
        message: "does not have magic comment".to_string(),
    };

    let mut file = File::open(path).map_err(|e| Error::RcFile {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let magic = MAGIC_COMMENT.as_bytes();
    let mut head = vec![0u8; magic.len()];
    match file.read_exact(&mut head) {
        Ok(()) if head == magic => Ok(()),
        Ok(()) => Err(not_managed()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(not_managed()),
        Err(e) => Err(Error::RcFile {
            path: path.display().to_string(),
            message: e.to_string(),
        }),
    }
}

/// Check every existing destination before anything is modified
pub fn guard(targets: &[RcTarget]) -> Result<()> {
    for target in targets {
        if target.dst.symlink_metadata().is_ok() {
            should_have_magic_comment(&target.dst).map_err(|e| Error::RcFile {
                path: target.dst.display().to_string(),
                message: format!("already exists user vimrc or gvimrc: {}", e),
            })?;
        }
    }
    Ok(())
}

/// Replace `target.dst` with the marker followed by `target.src`.
///
/// A missing source leaves the destination absent and is not an error.
pub fn install(target: &RcTarget) -> Result<()> {
    if target.dst.symlink_metadata().is_ok() {
        should_have_magic_comment(&target.dst)?;
    }

    match fs::remove_file(&target.dst) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(Error::RcFile {
                path: target.dst.display().to_string(),
                message: format!("failed to remove: {}", e),
            })
        }
    }

    let mut reader = match File::open(&target.src) {
        Ok(reader) => reader,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    if let Some(parent) = target.dst.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = File::create(&target.dst)?;
    writer.write_all(MAGIC_COMMENT.as_bytes())?;
    io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Guard then install every managed startup file of `profile`
pub fn install_all(layout: &Layout, profile: &Profile) -> Result<()> {
    let targets = managed_targets(layout, profile);
    guard(&targets)?;
    for target in &targets {
        install(target)?;
    }
    Ok(())
}
