//! # Error Handling
//!
//! This module defines the centralized error type for the `volt` build
//! engine. It uses `thiserror` to derive a single `Error` enum whose
//! variants cover every failure the engine can report.
//!
//! The engine never retries and never aggregates: every failure surfaces as
//! one terminal error at the top level, and its message carries the context
//! (repository path, file, git command) a user needs to act on it.
//!
//! Failure categories, in the order a build can hit them:
//!
//! - Precondition errors: lock file unreadable, editor missing, a managed
//!   startup file without its ownership marker. Raised before any mutation.
//! - Retirement errors: the live directory could not be renamed away, or
//!   the background deletion of the retired copy failed.
//! - Per-repository errors: git, link, copy, or invalid-type failures,
//!   delivered through that repository's install result.

use thiserror::Error;

/// Main error type for volt build operations
#[derive(Error, Debug)]
pub enum Error {
    /// lock.json could not be read, parsed, or failed validation.
    #[error("could not read lock.json: {message}")]
    LockFile { message: String },

    /// The requested profile does not exist in lock.json.
    #[error("profile '{name}' does not exist")]
    Profile { name: String },

    /// The editor executable could not be located.
    #[error("vim executable not found: {message}")]
    VimNotFound { message: String },

    /// A managed startup file is missing its marker, or installing it failed.
    #[error("'{path}': {message}")]
    RcFile { path: String, message: String },

    /// An error occurred while reading a repository's object store.
    #[error("git error for '{path}': {message}")]
    Git { path: String, message: String },

    /// Installing one repository failed.
    #[error("failed to install repository '{path}': {message}")]
    Install { path: String, message: String },

    /// A repository of an unrecognized type was requested.
    #[error("invalid repository type '{r#type}' for '{path}'")]
    InvalidType { path: String, r#type: String },

    /// The live directory could not be retired, or its old copy removed.
    #[error("failed to remove '{path}': {message}")]
    Retire { path: String, message: String },

    /// The process-wide build lock could not be taken.
    #[error("failed to begin transaction: {message}")]
    Transaction { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_install() {
        let error = Error::Install {
            path: "github.com/tyru/caw.vim".to_string(),
            message: "failed to open repository".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("failed to install repository"));
        assert!(display.contains("github.com/tyru/caw.vim"));
        assert!(display.contains("failed to open repository"));
    }

    #[test]
    fn test_error_display_invalid_type() {
        let error = Error::InvalidType {
            path: "localhost/local/foo".to_string(),
            r#type: "svn".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("invalid repository type"));
        assert!(display.contains("svn"));
    }

    #[test]
    fn test_error_display_rc_file() {
        let error = Error::RcFile {
            path: "/home/u/.vim/vimrc".to_string(),
            message: "does not have magic comment".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "'/home/u/.vim/vimrc': does not have magic comment"
        );
    }

    #[test]
    fn test_error_display_retire() {
        let error = Error::Retire {
            path: "/home/u/.vim/pack/volt/start".to_string(),
            message: "permission denied".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.starts_with("failed to remove"));
        assert!(display.contains("permission denied"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();
        let display = format!("{}", error);
        assert!(display.contains("I/O error"));
        assert!(display.contains("File not found"));
    }

    #[test]
    fn test_error_from_json_error() {
        let json_error = serde_json::from_str::<serde_json::Value>("{unclosed").unwrap_err();
        let error: Error = json_error.into();
        assert!(error.to_string().contains("JSON error"));
    }
}
