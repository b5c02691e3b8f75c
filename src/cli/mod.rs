//! CLI module - Command-line interface for KrishiMarg
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// KrishiMarg - weather and advisory service for farmers
#[derive(Parser)]
#[command(name = "krishimarg")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server and the cache sweeper (default)
    #[command(alias = "daemon", alias = "-d", alias = "--daemon")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Delete expired cache rows and alerts once
    Sweep,

    /// Print the detected language code of some text
    #[command(alias = "detect")]
    DetectLanguage {
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Manage API tokens
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },
}

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Create or rotate the token of a user and print it
    Issue {
        /// Username
        username: String,
    },
}

pub use commands::*;
