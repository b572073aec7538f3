//! CLI module - Command-line interface for Dramarr
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Dramarr - MyDramaList metadata mirror
/// Keeps a local JSON database of drama titles in sync with the catalog
#[derive(Parser)]
#[command(name = "dramarr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default search paths
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load this and next year's dramas, new episodes and updates (default)
    #[command(alias = "sync")]
    Run,

    /// Walk the next window of catalog ids from the saved cursor
    Rescan {
        /// Number of ids to visit (defaults to rescan.window)
        #[arg(long)]
        window: Option<u64>,
    },

    /// Strip stray fields and flatten tags in the database
    Clean,

    /// Create default config file
    #[command(alias = "init")]
    InitConfig,
}

pub use commands::*;
