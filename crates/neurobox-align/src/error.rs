//! Error types for event alignment.

use neurobox_model::ParameterError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Which of the two input tables a column was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableRole {
    Data,
    Events,
}

impl std::fmt::Display for TableRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Data => f.write_str("data"),
            Self::Events => f.write_str("events"),
        }
    }
}

/// Errors that can occur while aligning observations to events.
#[derive(Debug, Error)]
pub enum AlignError {
    /// A required group or time column is absent.
    #[error("column '{column}' not found in {table} table")]
    ColumnNotFound { column: String, table: TableRole },

    /// A time column holds something other than plain numbers.
    #[error("time column '{column}' in {table} table must be numeric, found {dtype}")]
    NonNumericTime {
        column: String,
        table: TableRole,
        dtype: String,
    },

    /// A bound or column name failed validation.
    #[error(transparent)]
    InvalidParameter(#[from] ParameterError),

    /// A per-group operation added or removed rows.
    #[error("group '{group}' returned {actual} rows, expected {expected}")]
    GroupRowCountChanged {
        group: String,
        expected: usize,
        actual: usize,
    },

    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
}
