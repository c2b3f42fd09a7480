//! Build command implementation
//!
//! Links (or, for bare repositories, extracts) every repository of the
//! active profile under `pack/volt/opt`, regenerates help tags, and records
//! the result in build-info.json.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use volt::builder::Builder;
use volt::lockjson::LockJson;
use volt::path::Layout;
use volt::transaction::Transaction;
use volt::vim::VimExecutable;

/// Arguments for the build command
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Retire the whole opt directory instead of replacing entries in place
    #[arg(short, long)]
    pub full: bool,

    /// Vim executable used to regenerate help tags
    #[arg(long, value_name = "PATH", env = "VOLT_VIM")]
    pub vim: Option<PathBuf>,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the build command
pub fn execute(args: BuildArgs, layout: &Layout) -> Result<()> {
    let start_time = Instant::now();

    let trx = Transaction::begin(&layout.trx_lock())?;
    let vim = VimExecutable::locate(args.vim.as_deref())?;
    let lock_json = LockJson::read(&layout.lock_json())?;

    let build_info = Builder::new(layout)
        .build(&trx, &lock_json, &vim, args.full)
        .context("Failed to build")?;

    if !args.quiet {
        println!(
            "Installed {} repositories in {:.2}s",
            build_info.repos.len(),
            start_time.elapsed().as_secs_f64()
        );
    }
    Ok(())
}
