//! CLI interface using clap.
//!
//! Provides command-line arguments and subcommands for the tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// mail-transcript - Export a mail archive into one plain-text transcript.
#[derive(Parser, Debug)]
#[command(name = "mail-transcript")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (defaults to the user config directory).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export every message of an archive into a single transcript file.
    Export {
        /// Archive to read (mail directory or .mbox file).
        source: PathBuf,

        /// Transcript file to write (truncated if it exists).
        #[arg(short, long, conflicts_with = "output_dir")]
        output: Option<PathBuf>,

        /// Directory for an auto-named transcript
        /// (`<archive>_content_<timestamp>.txt`).
        #[arg(short = 'd', long)]
        output_dir: Option<PathBuf>,

        /// Truncate message bodies longer than this many characters.
        #[arg(short, long)]
        max_body_length: Option<usize>,

        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the folder tree of an archive with message counts.
    Tree {
        /// Archive to inspect.
        source: PathBuf,
    },

    /// Show the effective configuration.
    Config {
        /// Write the default configuration file if it does not exist.
        #[arg(long)]
        init: bool,
    },
}
