//! Command-line parsing for the forecast comparison client.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the workflow code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_REPORT_FILENAME, DEFAULT_REPORT_TITLE, DEFAULT_SERVER_URL, Method};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "fcmp",
    version,
    about = "Compare interpolation/regression forecasts and export a PDF report"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive TUI (default).
    ///
    /// Pick a dataset, choose methods in order, set the horizon, compare and
    /// export, all against the same prediction service as `fcmp compare`.
    Tui(SessionArgs),
    /// Run one comparison non-interactively and print the series summary.
    Compare(CompareArgs),
}

/// Options shared by every command.
#[derive(Debug, Args, Clone)]
pub struct SessionArgs {
    /// Prediction-service base URL.
    #[arg(long, default_value = DEFAULT_SERVER_URL)]
    pub server: String,

    /// Reject non-numeric horizons instead of treating them as 0.
    #[arg(long)]
    pub strict_horizon: bool,

    /// Upper bound for the forecast horizon.
    #[arg(long)]
    pub max_horizon: Option<u32>,

    /// Report title.
    #[arg(long, default_value = DEFAULT_REPORT_TITLE)]
    pub title: String,

    /// Report output path.
    #[arg(short = 'o', long, default_value = DEFAULT_REPORT_FILENAME)]
    pub output: PathBuf,

    /// HTTP timeout (seconds).
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Write logs to this file (the TUI logs nowhere otherwise).
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Options for a one-shot comparison.
#[derive(Debug, Args, Clone)]
pub struct CompareArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Dataset to upload before comparing (optional: the server may have data already).
    #[arg(short = 'f', long, value_name = "CSV")]
    pub file: Option<PathBuf>,

    /// Methods to compare, in order (repeat or comma-separate).
    #[arg(short = 'm', long = "method", value_enum, value_delimiter = ',')]
    pub methods: Vec<Method>,

    /// Number of future points to predict (raw text, validated per horizon policy).
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub horizon: String,

    /// Also export the PDF report to `--output`.
    #[arg(long)]
    pub export: bool,
}
