//! Rebuild command implementation
//!
//! Replaces `pack/volt/start` wholesale: the old tree is retired and deleted
//! in the background while every repository is reconstructed from its
//! pinned commit (git) or copied (static).

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use volt::builder::Builder;
use volt::lockjson::LockJson;
use volt::path::Layout;
use volt::transaction::Transaction;

/// Arguments for the rebuild command
#[derive(Args, Debug)]
pub struct RebuildArgs {
    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the rebuild command
pub fn execute(args: RebuildArgs, layout: &Layout) -> Result<()> {
    let start_time = Instant::now();

    let trx = Transaction::begin(&layout.trx_lock())?;
    let lock_json = LockJson::read(&layout.lock_json())?;

    let build_info = Builder::new(layout)
        .rebuild(&trx, &lock_json)
        .context("Failed to rebuild")?;

    if !args.quiet {
        println!(
            "Rebuilt {} with {} repositories in {:.2}s",
            layout.start_dir().display(),
            build_info.repos.len(),
            start_time.elapsed().as_secs_f64()
        );
    }
    Ok(())
}
