//! Vim collaborator: locating the executable and regenerating help tags

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// Operations the build needs from the editor - allows mocking in tests
pub trait Vim: Send + Sync {
    /// Run `:helptags` on `doc_dir`
    fn helptags(&self, doc_dir: &Path) -> Result<()>;
}

/// A located Vim binary
#[derive(Debug, Clone)]
pub struct VimExecutable {
    path: PathBuf,
}

impl VimExecutable {
    /// Use `explicit` if given, otherwise look `vim` up on `PATH`
    pub fn locate(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => which::which(path).map_err(|e| Error::VimNotFound {
                message: format!("{}: {}", path.display(), e),
            })?,
            None => which::which("vim").map_err(|e| Error::VimNotFound {
                message: e.to_string(),
            })?,
        };
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Vim for VimExecutable {
    fn helptags(&self, doc_dir: &Path) -> Result<()> {
        let status = Command::new(&self.path)
            .args(["-u", "NONE", "-i", "NONE", "-N", "-es", "-c"])
            .arg(format!("silent! helptags {}", doc_dir.display()))
            .args(["-c", "quit"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;
        if !status.success() {
            return Err(Error::Io(std::io::Error::other(format!(
                "failed to make tags file of '{}': vim exited with {}",
                doc_dir.display(),
                status
            ))));
        }
        Ok(())
    }
}

/// Regenerate help tags for an installed destination if it ships docs
pub fn regenerate_helptags(vim: &dyn Vim, dst: &Path) -> Result<()> {
    let doc = dst.join("doc");
    if doc.is_dir() {
        vim.helptags(&doc)?;
    }
    Ok(())
}
