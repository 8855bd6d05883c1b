//! CLI module for Oak
//!
//! Provides command-line interface parsing and handling for the `oak` binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod commands;
pub mod output;

use crate::utils::config::OakConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Oak - Pokémon research orchestrator
#[derive(Parser, Debug)]
#[command(
    name = "oak",
    author = "Dirmacs <build@dirmacs.com>",
    version,
    about = "Oak - Pokémon research orchestrator",
    long_about = "Oak - Pokémon research orchestrator\n\n\
                  Plans a research goal, samples Pokémon of the matching type from PokéAPI,\n\
                  derives weakness statistics, and writes a report.\n\n\
                  Configuration is read from oak.toml (or --config), then OAK_* environment variables.",
    after_help = "EXAMPLES:\n    \
                  oak research \"Analyze Fire-type Pokémon weaknesses\"\n    \
                  oak research \"water defense\" --chart-dir out --csv out/water.csv\n    \
                  oak analyze dragon --sample-bound 5\n    \
                  oak lookup charizard\n    \
                  oak cache stats"
)]
pub struct Cli {
    /// Path to the configuration file (default: ./oak.toml if present)
    #[arg(short, long, global = true, env = "OAK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Bypass the entity cache for this run
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Maximum entities fetched in detail per category
    #[arg(long, global = true)]
    pub sample_bound: Option<usize>,

    /// Maximum orchestrator rounds
    #[arg(long, global = true)]
    pub max_rounds: Option<usize>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full plan, collect, report workflow for a goal
    Research {
        /// Research goal, e.g. "Analyze Fire-type Pokémon weaknesses"
        goal: String,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory for the weakness distribution chart
        #[arg(long)]
        chart_dir: Option<PathBuf>,

        /// Export sampled entity stats as CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Print the turn transcript after the report
        #[arg(long)]
        transcript: bool,
    },

    /// Show the research plan for a goal without running it
    Plan {
        /// Research goal
        goal: String,
    },

    /// Analyze one category directly and print the report
    Analyze {
        /// Category name, e.g. fire
        category: String,

        /// Directory for the weakness distribution chart
        #[arg(long)]
        chart_dir: Option<PathBuf>,

        /// Export sampled entity stats as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Look up a single Pokémon
    Lookup {
        /// Pokémon name
        name: String,
    },

    /// Manage the entity cache
    #[command(subcommand)]
    Cache(CacheCommands),
}

/// Cache management subcommands
#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Show cache location and entry counts
    Stats,

    /// Remove every cached entity
    Clear,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Apply flag overrides on top of file and environment configuration.
    pub fn apply_overrides(&self, config: &mut OakConfig) {
        if let Some(bound) = self.sample_bound {
            config.analysis.sample_bound = bound;
        }
        if let Some(rounds) = self.max_rounds {
            config.orchestrator.max_rounds = rounds;
        }
        if self.verbose {
            config.logging.level = "oak=debug".to_string();
        }
    }
}
