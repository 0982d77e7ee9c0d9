//! Ordered pipeline of table transforms.
//!
//! A [`Pipeline`] owns its steps by value. Cloning it copies every step and
//! parameter record, so editing a clone never touches the original.
//!
//! # Example
//!
//! ```ignore
//! use neurobox_core::{Pipeline, Step};
//!
//! let mut pipeline = Pipeline::default();
//! pipeline.append_step(Step::from_params("pivot", Value::Null, None)?)?;
//! pipeline.edit_step_param(0, "time_col", json!("t"))?;
//! let wide = pipeline.transform(&long)?;
//! ```

use std::fmt;

use polars::prelude::DataFrame;
use serde_json::Value;

use crate::error::PipelineError;
use crate::step::Step;

/// An ordered, editable sequence of steps.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    steps: Vec<Step>,
}

impl Pipeline {
    /// Create a pipeline, validating every step's parameters.
    pub fn new(steps: Vec<Step>) -> Result<Self, PipelineError> {
        for step in &steps {
            step.validate()?;
        }
        Ok(Self { steps })
    }

    /// Add a step to the end of the pipeline.
    pub fn append_step(&mut self, step: Step) -> Result<(), PipelineError> {
        step.validate()?;
        self.steps.push(step);
        Ok(())
    }

    /// Insert a step before position `index`; `index == len` appends.
    pub fn insert_step(&mut self, index: usize, step: Step) -> Result<(), PipelineError> {
        if index > self.steps.len() {
            return Err(self.out_of_range(index));
        }
        step.validate()?;
        self.steps.insert(index, step);
        Ok(())
    }

    /// Remove and return the step at `index`.
    pub fn remove_step(&mut self, index: usize) -> Result<Step, PipelineError> {
        if index >= self.steps.len() {
            return Err(self.out_of_range(index));
        }
        Ok(self.steps.remove(index))
    }

    /// Replace one named parameter of the step at `index`.
    ///
    /// # Errors
    ///
    /// [`PipelineError::StepIndexOutOfRange`] for a bad index,
    /// [`PipelineError::UnknownParameter`] when the step has no such
    /// parameter and [`PipelineError::InvalidParameter`] when the value does
    /// not fit or fails validation. The step is unchanged on error.
    pub fn edit_step_param(
        &mut self,
        index: usize,
        name: &str,
        value: Value,
    ) -> Result<(), PipelineError> {
        let len = self.steps.len();
        let step = self
            .steps
            .get_mut(index)
            .ok_or(PipelineError::StepIndexOutOfRange { index, len })?;
        step.set_param(name, value)?;
        tracing::debug!(index, step = step.name(), param = name, "edited step parameter");
        Ok(())
    }

    /// Run every step in order, each on the previous step's output.
    ///
    /// The first failing step aborts the run and its error is returned as is.
    /// An empty pipeline returns a copy of `df`.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame, PipelineError> {
        let mut current = df.clone();
        for (index, step) in self.steps.iter().enumerate() {
            let span = tracing::debug_span!("pipeline_step", index, step = step.name());
            let _guard = span.enter();
            current = step.apply(&current)?;
            tracing::debug!(
                rows = current.height(),
                columns = current.width(),
                "step finished"
            );
        }
        Ok(current)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// List step names in execution order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(Step::name).collect()
    }

    fn out_of_range(&self, index: usize) -> PipelineError {
        PipelineError::StepIndexOutOfRange {
            index,
            len: self.steps.len(),
        }
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return writeln!(f, "(empty pipeline)");
        }
        for (index, step) in self.steps.iter().enumerate() {
            writeln!(f, "{index}: {step}")?;
        }
        Ok(())
    }
}
