//! DataFrame helpers shared by the transforms.

use neurobox_common::{column_f64, has_column};
use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};

use crate::error::TransformError;

pub(crate) fn require_column(df: &DataFrame, name: &str) -> Result<(), TransformError> {
    if has_column(df, name) {
        Ok(())
    } else {
        Err(TransformError::ColumnNotFound(name.to_string()))
    }
}

pub(crate) fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

/// Every column except the time column, in table order.
pub(crate) fn unit_columns(df: &DataFrame, time_col: &str) -> Vec<String> {
    column_names(df)
        .into_iter()
        .filter(|name| name != time_col)
        .collect()
}

/// The time column as floats; fails if it is absent.
pub(crate) fn time_values(df: &DataFrame, time_col: &str) -> Result<Vec<Option<f64>>, TransformError> {
    require_column(df, time_col)?;
    Ok(column_f64(df, time_col)?)
}

/// Keep the rows whose mask entry is true.
pub(crate) fn keep_rows(df: &DataFrame, mask: Vec<bool>) -> Result<DataFrame, TransformError> {
    let mask = Series::new("mask".into(), mask);
    Ok(df.filter(mask.bool()?)?)
}

pub(crate) fn float_column(name: &str, values: Vec<Option<f64>>) -> Column {
    Series::new(name.into(), values).into_column()
}

/// Replace NaN with null so callers see a single missing marker.
pub(crate) fn nan_to_none(value: f64) -> Option<f64> {
    if value.is_nan() { None } else { Some(value) }
}
