//! Generic table operations usable as pipeline steps.
//!
//! These are thin, non-mutating wrappers around column and row selection.

use std::collections::{BTreeMap, BTreeSet};

use neurobox_common::{any_is_missing, any_to_f64, any_to_string};
use neurobox_model::{ParameterError, StepParams, require_column_name};
use polars::prelude::{Column, DataFrame, NamedFrom, Series};
use serde::{Deserialize, Serialize};

use crate::error::TransformError;
use crate::frame::{column_names, keep_rows, require_column};

/// Parameters for [`rename`]: old column name to new column name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameParams {
    pub columns: BTreeMap<String, String>,
}

impl RenameParams {
    pub fn single(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            columns: BTreeMap::from([(from.into(), to.into())]),
        }
    }
}

impl StepParams for RenameParams {
    fn validate(&self) -> neurobox_model::Result<()> {
        for target in self.columns.values() {
            require_column_name("columns", target)?;
        }
        Ok(())
    }
}

/// Rename columns. All renames apply at once, so two columns may swap names.
///
/// # Errors
///
/// [`TransformError::ColumnNotFound`] for an unknown source column and
/// [`TransformError::ColumnExists`] if the result would hold two columns of
/// the same name.
pub fn rename(df: &DataFrame, params: &RenameParams) -> Result<DataFrame, TransformError> {
    for source in params.columns.keys() {
        require_column(df, source)?;
    }
    let mut seen = BTreeSet::new();
    let mut columns: Vec<Column> = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let name = column.name().as_str();
        let target = params.columns.get(name).map_or(name, String::as_str);
        if !seen.insert(target.to_string()) {
            return Err(TransformError::ColumnExists(target.to_string()));
        }
        columns.push(column.clone().with_name(target.into()));
    }
    Ok(DataFrame::new(columns)?)
}

/// Parameters for [`drop_cols`] and [`select_cols`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnsParams {
    pub columns: Vec<String>,
}

impl ColumnsParams {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

impl StepParams for ColumnsParams {}

/// Drop the listed columns.
pub fn drop_cols(df: &DataFrame, params: &ColumnsParams) -> Result<DataFrame, TransformError> {
    for name in &params.columns {
        require_column(df, name)?;
    }
    let remaining: Vec<String> = column_names(df)
        .into_iter()
        .filter(|name| !params.columns.contains(name))
        .collect();
    Ok(df.select(remaining)?)
}

/// Keep only the listed columns, in the listed order.
pub fn select_cols(df: &DataFrame, params: &ColumnsParams) -> Result<DataFrame, TransformError> {
    for name in &params.columns {
        require_column(df, name)?;
    }
    Ok(df.select(params.columns.iter().map(String::as_str))?)
}

/// Drop every row holding a null or NaN in any column.
pub fn dropna_rows(df: &DataFrame) -> Result<DataFrame, TransformError> {
    let mut mask = vec![true; df.height()];
    for column in df.get_columns() {
        for (idx, keep) in mask.iter_mut().enumerate() {
            if *keep && any_is_missing(&column.get(idx)?) {
                *keep = false;
            }
        }
    }
    let dropped = mask.iter().filter(|keep| !**keep).count();
    tracing::debug!(dropped, "dropped rows with missing values");
    keep_rows(df, mask)
}

/// Comparison used by [`filter_rows`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Comparison {
    pub fn holds(self, left: f64, right: f64) -> bool {
        match self {
            Self::Lt => left < right,
            Self::Le => left <= right,
            Self::Gt => left > right,
            Self::Ge => left >= right,
            Self::Eq => left == right,
            Self::Ne => left != right,
        }
    }
}

/// Parameters for [`filter_rows`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRowsParams {
    pub column: String,
    pub op: Comparison,
    pub value: f64,
}

impl StepParams for FilterRowsParams {
    fn validate(&self) -> neurobox_model::Result<()> {
        require_column_name("column", &self.column)?;
        if self.value.is_nan() {
            return Err(ParameterError::invalid("value", "must not be NaN"));
        }
        Ok(())
    }
}

/// Keep rows where `column op value` holds. Missing values never pass.
pub fn filter_rows(df: &DataFrame, params: &FilterRowsParams) -> Result<DataFrame, TransformError> {
    require_column(df, &params.column)?;
    let column = df.column(&params.column)?;
    let mut mask = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let keep = any_to_f64(column.get(idx)?).is_some_and(|v| params.op.holds(v, params.value));
        mask.push(keep);
    }
    keep_rows(df, mask)
}

/// Parameters for [`combine_cols`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombineColsParams {
    pub first: String,
    pub second: String,
    /// Defaults to `<first>_<second>`.
    #[serde(default)]
    pub returned_colname: Option<String>,
    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_separator() -> String {
    "_".to_string()
}

impl CombineColsParams {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
            returned_colname: None,
            separator: default_separator(),
        }
    }

    pub fn output_name(&self) -> String {
        self.returned_colname
            .clone()
            .unwrap_or_else(|| format!("{}_{}", self.first, self.second))
    }
}

impl StepParams for CombineColsParams {
    fn validate(&self) -> neurobox_model::Result<()> {
        require_column_name("first", &self.first)?;
        require_column_name("second", &self.second)?;
        if let Some(name) = &self.returned_colname {
            require_column_name("returned_colname", name)?;
        }
        Ok(())
    }
}

/// Append a text column joining two existing columns, e.g. `unit_3` from
/// `unit` and `3`.
pub fn combine_cols(df: &DataFrame, params: &CombineColsParams) -> Result<DataFrame, TransformError> {
    require_column(df, &params.first)?;
    require_column(df, &params.second)?;
    let first = df.column(&params.first)?;
    let second = df.column(&params.second)?;
    let mut values = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        values.push(format!(
            "{}{}{}",
            any_to_string(first.get(idx)?),
            params.separator,
            any_to_string(second.get(idx)?)
        ));
    }
    let mut out = df.clone();
    out.with_column(Series::new(params.output_name().into(), values))?;
    Ok(out)
}
