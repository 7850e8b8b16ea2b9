//! CLI module - Command-line interface for useradmin
//!
//! This module provides a structured CLI using clap for argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// useradmin - user records behind HTTP Basic authentication
#[derive(Parser)]
#[command(name = "useradmin")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of the default search paths
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP API (default)
    #[command(alias = "daemon")]
    Serve,

    /// Create default config file
    Init,

    /// Print an Argon2 hash for use as `admin.password_hash`
    HashPassword {
        /// Plaintext password to hash
        password: String,
    },
}
