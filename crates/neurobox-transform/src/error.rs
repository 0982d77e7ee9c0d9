//! Error types for table transforms.

use neurobox_model::ParameterError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors that can occur while transforming a table.
#[derive(Debug, Error)]
pub enum TransformError {
    /// A column named by the parameters is not in the table.
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    /// The transform would create a second column with this name.
    #[error("column already exists: {0}")]
    ColumnExists(String),

    /// Pivoting found more than one value for the same cell.
    #[error("duplicate entry for time {time} and unit '{unit}'")]
    DuplicateEntry { time: f64, unit: String },

    #[error(transparent)]
    InvalidParameter(#[from] ParameterError),

    #[error("polars error: {0}")]
    PolarsError(#[from] PolarsError),
}
