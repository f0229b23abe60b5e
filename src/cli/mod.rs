//! CLI module for lifecycle - command-line interface and subcommands.
//!
//! Provides the demo entry point: run a reference worker and stop it, or list
//! the conventional phases.

pub mod commands;

pub use commands::Cli;
