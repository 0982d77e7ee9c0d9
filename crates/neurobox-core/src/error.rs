//! Error types for pipeline construction and execution.

use neurobox_align::AlignError;
use neurobox_model::ParameterError;
use neurobox_transform::TransformError;
use thiserror::Error;

/// Errors raised while building, editing or running a [`crate::Pipeline`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("step index {index} is out of range for a pipeline of {len} steps")]
    StepIndexOutOfRange { index: usize, len: usize },

    #[error("step '{step}' has no parameter '{name}'")]
    UnknownParameter { step: String, name: String },

    #[error("unknown step: {0}")]
    UnknownStep(String),

    #[error("step '{0}' needs an events table")]
    EventsRequired(String),

    #[error("step '{0}' does not take an events table")]
    UnexpectedEvents(String),

    #[error(transparent)]
    InvalidParameter(#[from] ParameterError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Align(#[from] AlignError),

    /// Failure of a user-supplied step, passed through as returned.
    #[error(transparent)]
    Custom(anyhow::Error),
}
