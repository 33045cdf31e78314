//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use upkit_core::TimeUnit;

/// Upkit - Tag and budget reports for Up Bank accounts
#[derive(Parser)]
#[command(name = "upkit")]
#[command(about = "Spend-by-tag and budget variance reports from the Up Bank API", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to <config dir>/upkit/config.toml, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Up personal access token (defaults to the UP_TOKEN environment variable)
    #[arg(long, global = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Spend breakdown for every tag, with one sheet per tag
    Tags {
        /// Account display name, e.g. "2Up Spending"
        #[arg(short, long)]
        account: String,

        #[command(flatten)]
        window: WindowArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Spend breakdown for selected tags only
    Tag {
        /// Account display name
        #[arg(short, long)]
        account: String,

        /// Tag to analyse (repeatable, matched exactly)
        #[arg(short, long = "tag", required = true)]
        tags: Vec<String>,

        #[command(flatten)]
        window: WindowArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Weekly spend per tag against a budget file
    Budget {
        /// Account display name
        #[arg(short, long)]
        account: String,

        /// Budget file (CSV or JSON with tag and weekly_budget), relative to the input dir if not found
        #[arg(short, long)]
        budget: PathBuf,

        /// Percentage of budget at or below which spend is flagged as under
        #[arg(long)]
        lower: Option<f64>,

        /// Percentage of budget at or above which spend is flagged as exceeding
        #[arg(long)]
        upper: Option<f64>,

        #[command(flatten)]
        window: WindowArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Withdrawals that have no tag
    Untagged {
        /// Account display name
        #[arg(short, long)]
        account: String,

        #[command(flatten)]
        window: WindowArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print a timestamp shifted back in time
    Offset {
        /// Timestamp (YYYY-MM-DD HH:MM:SS), defaults to now
        #[arg(long)]
        from: Option<String>,

        /// Unit: hours, days, weeks, months
        #[arg(long, default_value = "months")]
        unit: TimeUnit,

        /// How many units to go back
        #[arg(long, default_value = "1")]
        amount: u32,
    },
}

/// Report window selection
#[derive(Args, Debug, Clone)]
pub struct WindowArgs {
    /// Window start (YYYY-MM-DD HH:MM:SS)
    #[arg(long)]
    pub from: Option<String>,

    /// Window end (YYYY-MM-DD HH:MM:SS), defaults to now
    #[arg(long)]
    pub to: Option<String>,

    /// Window length when --from is not given
    #[arg(long, default_value = "1")]
    pub last: u32,

    /// Unit for --last: hours, days, weeks, months
    #[arg(long, default_value = "months")]
    pub unit: TimeUnit,

    /// Maximum transactions to fetch (0 = no limit)
    #[arg(long, default_value = "0")]
    pub limit: usize,
}

/// Where to write the report
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output directory (defaults to the configured output dir)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Output file name (defaults to a timestamped name)
    #[arg(short, long)]
    pub output: Option<String>,
}
