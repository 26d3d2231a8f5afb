use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "supsync")]
#[command(author, version, about = "Re-time PGS subtitle streams against a reference audio track")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sync every .sup file in a directory
    Sync {
        /// Directory containing the .sup files
        #[arg(required = true)]
        dir: PathBuf,

        /// Reference audio (default: first audio file in the parent directory)
        #[arg(short, long)]
        audio: Option<PathBuf>,

        /// Number of files aligned concurrently
        #[arg(short = 'j', long)]
        max_workers: Option<usize>,

        /// Keep intermediate timing files
        #[arg(long)]
        keep_temp: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the segments of a .sup file
    Inspect {
        /// File to inspect
        #[arg(required = true)]
        file: PathBuf,

        /// Also show display events and epochs
        #[arg(long)]
        events: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that the aligner is available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
