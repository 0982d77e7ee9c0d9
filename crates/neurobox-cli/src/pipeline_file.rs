//! Loading pipelines from JSON step lists.
//!
//! ```json
//! {
//!   "steps": [
//!     {"step": "align_to_events", "params": {"max_latency": 3.0}, "events": "events.csv"},
//!     {"step": "drop_cols", "params": {"columns": ["group"]}}
//!   ]
//! }
//! ```
//!
//! Relative `events` paths are resolved against the JSON file's directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use neurobox_core::{Pipeline, Step};
use serde::Deserialize;
use serde_json::Value;

use crate::io::read_csv;

/// The JSON document describing a pipeline.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineFile {
    pub steps: Vec<StepEntry>,
}

/// One step of a [`PipelineFile`].
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepEntry {
    pub step: String,
    #[serde(default)]
    pub params: Value,
    /// Event table for the alignment steps.
    #[serde(default)]
    pub events: Option<PathBuf>,
}

/// Read and build the pipeline described by `path`.
pub fn load_pipeline(path: &Path) -> Result<Pipeline> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read pipeline {}", path.display()))?;
    let file: PipelineFile = serde_json::from_str(&text)
        .with_context(|| format!("parse pipeline {}", path.display()))?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));

    let mut steps = Vec::with_capacity(file.steps.len());
    for (index, entry) in file.steps.into_iter().enumerate() {
        let events = match &entry.events {
            Some(events) => Some(read_csv(&base.join(events))?),
            None => None,
        };
        let step = Step::from_params(&entry.step, entry.params, events)
            .with_context(|| format!("step {index} ({})", entry.step))?;
        steps.push(step);
    }
    tracing::info!(path = %path.display(), steps = steps.len(), "loaded pipeline");
    Ok(Pipeline::new(steps)?)
}
