//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod compile;
mod info;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// doodlecss - Compile doodle token trees into grid CSS
#[derive(Parser)]
#[command(name = "doodlecss")]
#[command(about = "doodlecss - Compile doodle token trees (.json, .json5) into grid CSS")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile token files to CSS
    Compile {
        /// Token files or directories of token files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file or directory.
        /// If omitted with a single file: print to stdout
        /// If omitted with a directory: {input}.css next to each input
        /// If directory (ends with /): dir/{input}.css
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Default grid when the tokens declare none (e.g. "5x5")
        #[arg(long)]
        grid: Option<String>,

        /// Seed for random functions
        #[arg(long)]
        seed: Option<u64>,

        /// Minify the CSS output
        #[arg(long)]
        minify: bool,

        /// Write the full result as JSON instead of CSS
        #[arg(long)]
        json: bool,

        /// Path to doodle.toml (default: discovered from the working directory)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Recompile token files in a directory whenever they change
    Watch {
        /// Directory to watch
        dir: PathBuf,

        /// Output directory (default: next to each input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Path to doodle.toml
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List registered functions and selector predicates
    Functions,
}

/// Install the stderr log subscriber. `RUST_LOG` takes precedence over `-v`.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // a subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Compile { inputs, output, grid, seed, minify, json, config } => {
            compile::run_compile(
                &inputs,
                output.as_deref(),
                grid,
                seed,
                minify,
                json,
                config.as_deref(),
            )
        }
        Commands::Watch { dir, output, config } => {
            compile::run_watch(&dir, output.as_deref(), config.as_deref())
        }
        Commands::Functions => info::run_functions(),
    }
}
