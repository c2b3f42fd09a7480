//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use volt::path::{default_vim_dir, default_volt_dir, Layout};

use crate::commands;

/// Volt - reproduce locked Vim plugins in the Vim package tree
#[derive(Parser, Debug)]
#[command(name = "volt")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Volt directory holding lock.json and the cloned repositories
    #[arg(long, global = true, value_name = "PATH", env = "VOLTPATH")]
    volt_path: Option<PathBuf>,

    /// Vim user directory (~/.vim or ~/vimfiles)
    #[arg(long, global = true, value_name = "PATH", env = "VOLT_VIM_DIR")]
    vim_dir: Option<PathBuf>,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install the active profile's plugins under pack/volt/opt
    Build(commands::build::BuildArgs),

    /// Rebuild pack/volt/start from pinned commits
    Rebuild(commands::rebuild::RebuildArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        let layout = Layout::new(
            self.volt_path.unwrap_or_else(default_volt_dir),
            self.vim_dir.unwrap_or_else(default_vim_dir),
        );

        match self.command {
            Commands::Build(args) => commands::build::execute(args, &layout),
            Commands::Rebuild(args) => commands::rebuild::execute(args, &layout),
        }
    }
}

/// `RUST_LOG` wins over `--log-level` when set
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
