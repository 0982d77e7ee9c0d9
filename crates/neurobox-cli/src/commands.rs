use std::path::PathBuf;

use anyhow::{Context, Result};
use neurobox_align::{align_to_events, get_closest_event, get_closest_event_idx};
use neurobox_cli::io::{read_csv, write_csv};
use neurobox_cli::pipeline_file::load_pipeline;
use neurobox_model::{
    AlignOptions, ClosestEventOptions, DEFAULT_ALIGNED_COL, DEFAULT_EVENT_COL,
    DEFAULT_EVENT_INDEX_COL, EventColumns,
};
use polars::prelude::DataFrame;
use tracing::{info, info_span};

use crate::cli::{AlignArgs, AlignModeArg, RunArgs, StepsArgs};
use crate::summary::print_steps;

/// Shape and location of a written table.
pub struct RunSummary {
    pub rows: usize,
    pub columns: usize,
    pub output: PathBuf,
}

pub fn run_align(args: &AlignArgs) -> Result<RunSummary> {
    let span = info_span!("align", data = %args.data.display());
    let _guard = span.enter();
    let data = read_csv(&args.data)?;
    let events = read_csv(&args.events)?;
    let columns = EventColumns {
        data_group_col: args.data_group_col.clone(),
        events_group_col: args.events_group_col.clone(),
        events_time_col: args.events_time_col.clone(),
        data_time_col: args.data_time_col.clone(),
    };

    let aligned = match args.mode {
        AlignModeArg::Latency => {
            let options = AlignOptions {
                time_before_event: args.time_before,
                max_latency: args.max_latency,
                columns,
                returned_colname: returned_col(args, DEFAULT_ALIGNED_COL),
            };
            align_to_events(&data, &events, &options)?
        }
        AlignModeArg::Event => {
            let options = closest_options(args, columns, DEFAULT_EVENT_COL);
            get_closest_event(&data, &events, &options)?
        }
        AlignModeArg::Index => {
            let options = closest_options(args, columns, DEFAULT_EVENT_INDEX_COL);
            get_closest_event_idx(&data, &events, &options)?
        }
    };
    info!(rows = aligned.height(), "aligned observations");
    write_output(&aligned, &args.output)
}

pub fn run_pipeline(args: &RunArgs) -> Result<RunSummary> {
    let span = info_span!("run", pipeline = %args.pipeline.display());
    let _guard = span.enter();
    let pipeline = load_pipeline(&args.pipeline)?;
    let input = read_csv(&args.input)?;
    let output = pipeline
        .transform(&input)
        .with_context(|| format!("run pipeline {}", args.pipeline.display()))?;
    info!(steps = pipeline.len(), rows = output.height(), "pipeline finished");
    write_output(&output, &args.output)
}

pub fn run_steps(args: &StepsArgs) -> Result<()> {
    let pipeline = load_pipeline(&args.pipeline)?;
    print_steps(&args.pipeline, &pipeline);
    Ok(())
}

fn returned_col(args: &AlignArgs, default: &str) -> String {
    args.returned_col
        .clone()
        .unwrap_or_else(|| default.to_string())
}

fn closest_options(args: &AlignArgs, columns: EventColumns, default: &str) -> ClosestEventOptions {
    ClosestEventOptions {
        time_before: args.time_before,
        time_after: args.max_latency,
        columns,
        returned_colname: returned_col(args, default),
    }
}

fn write_output(df: &DataFrame, path: &std::path::Path) -> Result<RunSummary> {
    write_csv(df, path)?;
    Ok(RunSummary {
        rows: df.height(),
        columns: df.width(),
        output: path.to_path_buf(),
    })
}
