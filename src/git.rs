//! # Git Snapshot Extraction
//!
//! Reads the exact file tree of one pinned commit out of a repository's
//! object store, using the system `git` binary.
//!
//! A commit is only ever addressed by its full object id. Anything that is
//! not a full 40 (SHA-1) or 64 (SHA-256) character hex id is rejected before
//! git is invoked, so branch and tag names can never be resolved by accident.
//!
//! Entries are listed up front with `git ls-tree`, which holds only paths,
//! modes and object ids. Contents are then streamed lazily through a single
//! `git cat-file --batch` process, one blob at a time, so only one file's
//! content is ever held in memory.

use std::borrow::Cow;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use crate::error::{Error, Result};

/// Permission class of a tracked file, as stored in a git tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// `100644`
    Regular,
    /// `100755`
    Executable,
    /// `120000`; the content is the link target
    Symlink,
}

impl FileMode {
    /// Parse a git tree mode. Gitlinks (submodules) yield `None`.
    pub fn from_git(mode: &str) -> Result<Option<Self>> {
        match mode {
            "100644" | "100664" => Ok(Some(FileMode::Regular)),
            "100755" => Ok(Some(FileMode::Executable)),
            "120000" => Ok(Some(FileMode::Symlink)),
            "160000" => Ok(None),
            other => Err(Error::Git {
                path: String::new(),
                message: format!("failed to convert file mode: unsupported mode {}", other),
            }),
        }
    }

    /// Unix permission bits for this mode
    pub fn permissions(self) -> u32 {
        match self {
            FileMode::Regular => 0o644,
            FileMode::Executable => 0o755,
            FileMode::Symlink => 0o777,
        }
    }
}

/// One tracked file of a pinned commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Slash-separated path relative to the repository root, exactly as
    /// stored in the tree; git does not require it to be UTF-8
    pub path: Vec<u8>,
    pub mode: FileMode,
    pub content: Vec<u8>,
}

impl TreeEntry {
    /// The path for messages; invalid UTF-8 is replaced
    pub fn display_path(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.path)
    }
}

/// Returns true for a full hex object id (SHA-1 or SHA-256)
pub fn is_full_commit_id(version: &str) -> bool {
    (version.len() == 40 || version.len() == 64) && version.bytes().all(|b| b.is_ascii_hexdigit())
}

/// The directory git should treat as `GIT_DIR` for `repo`
fn git_dir(repo: &Path) -> PathBuf {
    let dot_git = repo.join(".git");
    if dot_git.exists() {
        dot_git
    } else {
        repo.to_path_buf()
    }
}

fn git_command(repo: &Path) -> Command {
    let mut cmd = Command::new("git");
    cmd.arg("--git-dir").arg(git_dir(repo));
    cmd
}

/// Run a git subcommand against `repo` and return its stdout
fn run_git(repo: &Path, args: &[&str]) -> Result<Vec<u8>> {
    let output = git_command(repo)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| Error::Git {
            path: repo.display().to_string(),
            message: format!("failed to run git {}: {}", args.join(" "), e),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Git {
            path: repo.display().to_string(),
            message: format!("git {} failed: {}", args.join(" "), stderr.trim()),
        });
    }
    Ok(output.stdout)
}

/// Open `repo` and report whether it is a bare repository
pub fn is_bare_repository(repo: &Path) -> Result<bool> {
    if !repo.is_dir() {
        return Err(Error::Git {
            path: repo.display().to_string(),
            message: "failed to open repository: no such directory".to_string(),
        });
    }
    let stdout = run_git(repo, &["rev-parse", "--is-bare-repository"]).map_err(|e| {
        Error::Git {
            path: repo.display().to_string(),
            message: format!("failed to open repository: {}", e),
        }
    })?;
    Ok(String::from_utf8_lossy(&stdout).trim() == "true")
}

/// Listed, not yet read, tree entry
#[derive(Debug, Clone)]
struct PendingEntry {
    path: Vec<u8>,
    mode: FileMode,
    oid: String,
}

/// The file tree of one pinned commit
#[derive(Debug)]
pub struct Snapshot {
    repo: PathBuf,
    commit: String,
    entries: Vec<PendingEntry>,
}

impl Snapshot {
    /// Resolve `commit` in `repo` and list every tracked file of its tree
    pub fn open(repo: &Path, commit: &str) -> Result<Self> {
        let path = repo.display().to_string();
        if !is_full_commit_id(commit) {
            return Err(Error::Git {
                path,
                message: format!("'{}' is not a full commit id", commit),
            });
        }

        let object_type = run_git(repo, &["cat-file", "-t", commit]).map_err(|e| Error::Git {
            path: path.clone(),
            message: format!("failed to get commit object {}: {}", commit, e),
        })?;
        let object_type = String::from_utf8_lossy(&object_type);
        if object_type.trim() != "commit" {
            return Err(Error::Git {
                path,
                message: format!("{} is a {}, not a commit", commit, object_type.trim()),
            });
        }

        let listing = run_git(repo, &["ls-tree", "-r", "-z", "--full-tree", commit]).map_err(
            |e| Error::Git {
                path: path.clone(),
                message: format!("failed to get tree {}: {}", commit, e),
            },
        )?;

        let mut entries = Vec::new();
        for record in listing.split(|b| *b == 0).filter(|r| !r.is_empty()) {
            let malformed = || Error::Git {
                path: path.clone(),
                message: format!(
                    "malformed tree entry: {}",
                    String::from_utf8_lossy(record)
                ),
            };
            let tab = record.iter().position(|b| *b == b'\t').ok_or_else(malformed)?;
            let (meta, file_path) = (&record[..tab], &record[tab + 1..]);
            let meta = std::str::from_utf8(meta).map_err(|_| malformed())?;
            let mut fields = meta.split(' ');
            let (mode, oid) = match (fields.next(), fields.next(), fields.next()) {
                (Some(mode), Some(_kind), Some(oid)) => (mode, oid),
                _ => return Err(malformed()),
            };
            let mode = match FileMode::from_git(mode) {
                Ok(Some(mode)) => mode,
                Ok(None) => continue,
                Err(e) => {
                    return Err(Error::Git {
                        path: path.clone(),
                        message: format!("{}: {}", String::from_utf8_lossy(file_path), e),
                    })
                }
            };
            entries.push(PendingEntry {
                path: file_path.to_vec(),
                mode,
                oid: oid.to_string(),
            });
        }

        Ok(Self {
            repo: repo.to_path_buf(),
            commit: commit.to_string(),
            entries,
        })
    }

    pub fn commit(&self) -> &str {
        &self.commit
    }

    /// Number of tracked files in the tree
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Start streaming file contents
    pub fn files(&self) -> Result<Files> {
        let mut child = git_command(&self.repo)
            .args(["cat-file", "--batch"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Git {
                path: self.repo.display().to_string(),
                message: format!("failed to run git cat-file --batch: {}", e),
            })?;

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::Git {
                    path: self.repo.display().to_string(),
                    message: "git cat-file --batch has no pipes".to_string(),
                });
            }
        };

        Ok(Files {
            repo: self.repo.display().to_string(),
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout),
            pending: self.entries.clone().into_iter(),
        })
    }
}

/// Lazy iterator over the files of a [`Snapshot`]
pub struct Files {
    repo: String,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    pending: std::vec::IntoIter<PendingEntry>,
}

impl Files {
    fn read_blob(&mut self, entry: &PendingEntry) -> Result<Vec<u8>> {
        let stdin = self.stdin.as_mut().ok_or_else(|| Error::Git {
            path: self.repo.clone(),
            message: "git cat-file --batch is closed".to_string(),
        })?;
        writeln!(stdin, "{}", entry.oid)?;
        stdin.flush()?;

        let mut header = String::new();
        self.stdout.read_line(&mut header)?;
        let header = header.trim_end();
        let mut fields = header.split(' ');
        let size = match (fields.next(), fields.next(), fields.next()) {
            (Some(_), Some("blob"), Some(size)) => size.parse::<usize>().ok(),
            _ => None,
        };
        let size = size.ok_or_else(|| Error::Git {
            path: self.repo.clone(),
            message: format!(
                "failed get file contents of {}: unexpected object header '{}'",
                String::from_utf8_lossy(&entry.path),
                header
            ),
        })?;

        let mut content = vec![0u8; size];
        self.stdout.read_exact(&mut content)?;
        let mut newline = [0u8; 1];
        self.stdout.read_exact(&mut newline)?;
        Ok(content)
    }
}

impl Iterator for Files {
    type Item = Result<TreeEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.pending.next()?;
        Some(self.read_blob(&entry).map(|content| TreeEntry {
            path: entry.path,
            mode: entry.mode,
            content,
        }))
    }
}

impl Drop for Files {
    fn drop(&mut self) {
        // Closing stdin makes cat-file exit on its own.
        drop(self.stdin.take());
        if self.pending.len() > 0 {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}
