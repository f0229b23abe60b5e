//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - run: start a demo worker, request shutdown, report what it processed
//! - phases: list phases and the forward-only edges

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// lifecycle - shutdown signal and phase tracker demo
#[derive(Parser, Debug)]
#[command(name = "lifecycle")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a demo worker and shut it down
    Run {
        /// Milliseconds to let the worker run before requesting shutdown
        #[arg(long)]
        run_ms: Option<u64>,

        /// Milliseconds between synthetic work items
        #[arg(long)]
        item_interval_ms: Option<u64>,
    },

    /// List worker phases and allowed forward transitions
    Phases,
}
