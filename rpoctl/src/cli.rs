//! Command-line interface definition.

use crate::{io::IOArgs, io::PathOrStd, steps::Step};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Run the retail price optimization pipeline against a warehouse.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file.
    #[arg(short, long, env = "APP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// The available sub-commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Optimize every pricing row and replace the output table
    Optimize,

    /// Smooth the weekly elasticity history
    Smooth,

    /// Flatten sub-threshold moves out of the weekly price history
    Unify,

    /// Run several steps in sequence, continuing past failed steps
    Run {
        /// The steps to run, in order (defaults to `unify smooth optimize`)
        #[arg(value_enum)]
        steps: Vec<Step>,
    },

    /// Optimize a JSON snapshot without touching the warehouse
    Solve {
        #[command(flatten)]
        io: IOArgs,
    },

    /// Load a JSON dataset into the warehouse input tables
    Import {
        /// The dataset JSON file ("-" implies stdin)
        #[arg(value_parser = clap::value_parser!(PathOrStd))]
        input: PathOrStd,
    },
}
