//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Context name used when none is given.
pub const DEFAULT_CONTEXT: &str = "default";

/// Invoice tables from clocked time.
///
/// Reads per-task clock totals exported by an outline time tracker and
/// renders a billing table with hours, cost and totals.
#[derive(Debug, Parser)]
#[command(name = "cb", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Render an invoice table from clock data.
    Report(ReportArgs),

    /// Switch time cells between decimal hours and h:mm durations.
    Toggle {
        /// Editing context whose display mode is flipped.
        #[arg(long, default_value = DEFAULT_CONTEXT)]
        context: String,

        /// Regenerate the report from this clock data after toggling.
        #[arg(long)]
        input: Option<PathBuf>,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Show effective defaults and toggled display modes.
    Status,
}

/// Arguments for rendering a report.
#[derive(Debug, Clone, Args)]
pub struct ReportArgs {
    /// Clock data as JSON (`-` reads stdin).
    #[arg(long)]
    pub input: PathBuf,

    /// Editing context used to look up the toggled display mode.
    #[arg(long, default_value = DEFAULT_CONTEXT)]
    pub context: String,

    /// Print billable data as JSON instead of a table.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub render: RenderArgs,
}

impl ReportArgs {
    /// Table output for `input` in `context`.
    pub fn new(input: PathBuf, context: String, render: RenderArgs) -> Self {
        Self {
            input,
            context,
            json: false,
            render,
        }
    }
}

/// Options and output placement shared by `report` and `toggle`.
#[derive(Debug, Clone, Default, Args)]
pub struct RenderArgs {
    /// Invoice options as a JSON object.
    #[arg(long, conflicts_with = "params")]
    pub options: Option<String>,

    /// Invoice options as an Org block parameter line (e.g. `:rate 90 :accuracy 2`).
    #[arg(long)]
    pub params: Option<String>,

    /// Insert the table into this file instead of printing it.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Byte offset in the output file where the table is inserted (default: end).
    #[arg(long, requires = "output")]
    pub at: Option<usize>,

    /// Leave the table unaligned.
    #[arg(long)]
    pub no_align: bool,
}
