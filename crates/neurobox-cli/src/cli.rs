//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use neurobox_model::{DEFAULT_GROUP_COL, DEFAULT_TIME_COL};

#[derive(Parser)]
#[command(
    name = "neurobox",
    version,
    about = "Align neural recordings to events and run table pipelines",
    long_about = "Align time-series observations to discrete events per group,\n\
                  and run JSON-described transform pipelines over CSV tables."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Attach each observation's latency, event time or event index.
    Align(AlignArgs),

    /// Run a pipeline file over a CSV table.
    Run(RunArgs),

    /// List the steps of a pipeline file.
    Steps(StepsArgs),
}

#[derive(Parser)]
pub struct AlignArgs {
    /// Observation table (CSV).
    #[arg(long = "data", value_name = "CSV")]
    pub data: PathBuf,

    /// Event table (CSV).
    #[arg(long = "events", value_name = "CSV")]
    pub events: PathBuf,

    /// What to attach to each observation.
    #[arg(long = "mode", value_enum, default_value = "latency")]
    pub mode: AlignModeArg,

    /// Let events up to this long after an observation claim it.
    #[arg(long = "time-before", value_name = "SECONDS")]
    pub time_before: Option<f64>,

    /// Leave observations further than this from their event unassigned.
    #[arg(long = "max-latency", value_name = "SECONDS")]
    pub max_latency: Option<f64>,

    #[arg(long = "data-group-col", default_value = DEFAULT_GROUP_COL)]
    pub data_group_col: String,

    #[arg(long = "events-group-col", default_value = DEFAULT_GROUP_COL)]
    pub events_group_col: String,

    #[arg(long = "data-time-col", default_value = DEFAULT_TIME_COL)]
    pub data_time_col: String,

    #[arg(long = "events-time-col", default_value = DEFAULT_TIME_COL)]
    pub events_time_col: String,

    /// Name of the result column (default depends on --mode).
    #[arg(long = "returned-col", value_name = "NAME")]
    pub returned_col: Option<String>,

    /// Where to write the aligned table (CSV).
    #[arg(long = "output", short = 'o', value_name = "CSV")]
    pub output: PathBuf,
}

#[derive(Parser)]
pub struct RunArgs {
    /// Pipeline description (JSON).
    #[arg(long = "pipeline", value_name = "JSON")]
    pub pipeline: PathBuf,

    /// Input table (CSV).
    #[arg(long = "input", value_name = "CSV")]
    pub input: PathBuf,

    /// Where to write the result (CSV).
    #[arg(long = "output", short = 'o', value_name = "CSV")]
    pub output: PathBuf,
}

#[derive(Parser)]
pub struct StepsArgs {
    /// Pipeline description (JSON).
    #[arg(long = "pipeline", value_name = "JSON")]
    pub pipeline: PathBuf,
}

/// Result written by `align`.
#[derive(Clone, Copy, ValueEnum)]
pub enum AlignModeArg {
    /// Observation time minus event time.
    Latency,
    /// Timestamp of the governing event.
    Event,
    /// Position of the governing event within its group.
    Index,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
