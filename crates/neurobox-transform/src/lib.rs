//! Single-table transforms for neural time-series data.
//!
//! Every transform is a pure function `(&DataFrame, &Params) -> Result<DataFrame>`
//! that leaves its input untouched. Parameter records are serde types so the
//! pipeline can build and edit them by name.
//!
//! - [`generics`]: column and row selection usable on any table
//! - [`long`]: long-format tables and pivoting to wide format
//! - [`wide`]: wide-format tables with one time column and one column per unit
//! - [`correlations`]: unit-to-unit correlation matrices

pub mod correlations;
mod error;
mod frame;
pub mod generics;
pub mod long;
pub mod wide;

pub use correlations::{
    CorrelationParams, NEURON_LABEL_COL, TidyParams, correlation_matrix_to_tidy,
    pairwise_correlation,
};
pub use error::TransformError;
pub use generics::{
    ColumnsParams, CombineColsParams, Comparison, FilterRowsParams, RenameParams, combine_cols,
    drop_cols, dropna_rows, filter_rows, rename, select_cols,
};
pub use long::{BaselineParams, PivotParams, exclude_baseline_long, pivot};
pub use wide::{
    Aggregation, ExcludeAfterParams, MAX_KERNEL_RADIUS, MAX_RESAMPLE_BINS, ResampleParams, SmoothParams, SortByActivityParams,
    StandardizeParams, exclude_after, exclude_baseline_wide, gaussian_smooth, resample,
    sort_by_activity_in_range, standardize,
};
