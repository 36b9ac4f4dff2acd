//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// eslink - ESLint jobs through a background worker
#[derive(Parser)]
#[command(name = "eslink")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the eslink-worker binary
    #[arg(long, global = true, env = "ESLINK_WORKER")]
    pub worker: Option<PathBuf>,

    /// Settings file (JSON, linter-eslint option names)
    #[arg(short, long, global = true)]
    pub settings: Option<PathBuf>,

    /// Project root used to relativize file paths
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Lint a file
    Lint {
        /// File to lint
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Fix a file in place
    Fix {
        /// File to fix
        file: PathBuf,
    },

    /// Show which ESLint installation and configuration apply to a file
    Debug {
        /// File to inspect
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
