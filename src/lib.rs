//! # Volt Build Engine
//!
//! This library reproduces a declarative, already-resolved set of Vim plugin
//! repositories inside Vim's runtime directory tree. It is used by the `volt`
//! command-line tool; lock file resolution, cloning and fetching happen
//! elsewhere and are assumed to be done.
//!
//! ## Core Concepts
//!
//! - **Lock file (`lockjson`)**: every repository pinned to an exact version,
//!   plus profiles selecting subsets of them.
//! - **Layout (`path`)**: where sources live and where destinations go, and
//!   the flat escaping of repository paths into directory names.
//! - **Snapshots (`git`)**: the exact file tree of a pinned commit, read from
//!   the object store one file at a time.
//! - **Materialization (`materialize`)**: links for working copies, file
//!   writes for snapshots, recursive copies for static directories.
//! - **Retirement (`retire`)**: swapping out a live directory atomically while
//!   its old copy is deleted in the background.
//! - **Startup files (`rcfile`)**: generated vimrc/gvimrc guarded by an
//!   ownership marker.
//! - **Installation (`installer`, `builder`)**: one concurrent worker per
//!   repository, all results drained, then `build-info.json` written.
//!
//! ## Execution Flow
//!
//! The entry point is [`builder::Builder`]:
//!
//! 1.  **Guard**: refuse to run if a managed startup file was edited by hand.
//! 2.  **Startup files**: install vimrc/gvimrc for the active profile.
//! 3.  **Prepare**: retire or create the destination root.
//! 4.  **Install**: materialize every repository concurrently.
//! 5.  **Join**: wait for the background removal of the retired tree.
//! 6.  **Record**: write `build-info.json`.
//!
//! A process-wide [`transaction::Transaction`] must be held by the caller for
//! the whole build.

pub mod builder;
pub mod buildinfo;
pub mod error;
pub mod git;
pub mod installer;
pub mod lockjson;
pub mod materialize;
pub mod path;
pub mod rcfile;
pub mod retire;
pub mod transaction;
pub mod vim;

#[cfg(test)]
mod path_proptest;
