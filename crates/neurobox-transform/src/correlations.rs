//! Unit-to-unit correlation matrices and their tidy form.

use neurobox_common::{any_to_string, column_f64, has_column};
use neurobox_model::{DEFAULT_TIME_COL, ParameterError, StepParams, require_column_name};
use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};
use serde::{Deserialize, Serialize};

use crate::error::TransformError;
use crate::frame::{float_column, require_column, unit_columns};

/// Name of the label column written by [`pairwise_correlation`].
pub const NEURON_LABEL_COL: &str = "neuron";

fn default_time_col() -> String {
    DEFAULT_TIME_COL.to_string()
}

fn default_true() -> bool {
    true
}

fn default_label_col() -> String {
    NEURON_LABEL_COL.to_string()
}

/// Parameters for [`pairwise_correlation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationParams {
    #[serde(default = "default_time_col")]
    pub time_col: String,
    /// Clamp negative coefficients to zero.
    #[serde(default)]
    pub rectify: bool,
    #[serde(default = "default_true")]
    pub zero_diag: bool,
    /// Replace missing values before correlating.
    #[serde(default)]
    pub fillna: Option<f64>,
}

impl Default for CorrelationParams {
    fn default() -> Self {
        Self {
            time_col: default_time_col(),
            rectify: false,
            zero_diag: true,
            fillna: None,
        }
    }
}

impl StepParams for CorrelationParams {
    fn validate(&self) -> neurobox_model::Result<()> {
        require_column_name("time_col", &self.time_col)?;
        if let Some(fill) = self.fillna
            && !fill.is_finite()
        {
            return Err(ParameterError::invalid("fillna", "must be finite"));
        }
        Ok(())
    }
}

/// Pearson correlation between every pair of unit columns of a wide table.
///
/// The result has a `neuron` label column followed by one column per unit,
/// in the input's unit order. Missing values are dropped pairwise unless
/// `fillna` is set. A pair with fewer than two shared samples or without
/// variance correlates to null. The time column is ignored when present.
pub fn pairwise_correlation(
    df: &DataFrame,
    params: &CorrelationParams,
) -> Result<DataFrame, TransformError> {
    let units = if has_column(df, &params.time_col) {
        unit_columns(df, &params.time_col)
    } else {
        crate::frame::column_names(df)
    };
    let mut series = Vec::with_capacity(units.len());
    for unit in &units {
        let mut values = column_f64(df, unit)?;
        if let Some(fill) = params.fillna {
            values.iter_mut().for_each(|v| *v = Some(v.unwrap_or(fill)));
        }
        series.push(values);
    }

    let n = units.len();
    let mut matrix = vec![vec![None; n]; n];
    for i in 0..n {
        for j in i..n {
            let mut r = if i == j {
                Some(1.0)
            } else {
                pearson(&series[i], &series[j])
            };
            if params.rectify {
                r = r.map(|r| r.max(0.0));
            }
            if i == j && params.zero_diag {
                r = Some(0.0);
            }
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }
    tracing::debug!(units = n, "computed pairwise correlations");

    let mut columns: Vec<Column> = Vec::with_capacity(n + 1);
    columns.push(Series::new(NEURON_LABEL_COL.into(), units.clone()).into_column());
    for (unit, values) in units.iter().zip(matrix) {
        columns.push(float_column(unit, values));
    }
    Ok(DataFrame::new(columns)?)
}

fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_a = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;
    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        cov += (x - mean_a) * (y - mean_b);
        var_a += (x - mean_a).powi(2);
        var_b += (y - mean_b).powi(2);
    }
    let denom = (var_a * var_b).sqrt();
    if denom == 0.0 {
        return None;
    }
    Some((cov / denom).clamp(-1.0, 1.0))
}

/// Parameters for [`correlation_matrix_to_tidy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TidyParams {
    #[serde(default = "default_label_col")]
    pub label_col: String,
}

impl Default for TidyParams {
    fn default() -> Self {
        Self {
            label_col: default_label_col(),
        }
    }
}

impl StepParams for TidyParams {
    fn validate(&self) -> neurobox_model::Result<()> {
        require_column_name("label_col", &self.label_col)
    }
}

/// Flatten a square correlation matrix to one row per unordered unit pair.
///
/// Output columns are `neuron_1`, `neuron_2`, `value` and
/// `neuron_combination` (`"<neuron_1>_<neuron_2>"`). Pairs are listed column
/// by column, each column paired with the rows above the diagonal.
pub fn correlation_matrix_to_tidy(
    df: &DataFrame,
    params: &TidyParams,
) -> Result<DataFrame, TransformError> {
    require_column(df, &params.label_col)?;
    let units = unit_columns(df, &params.label_col);
    if units.len() != df.height() {
        return Err(ParameterError::invalid(
            "label_col",
            format!(
                "matrix is not square: {} rows and {} unit columns",
                df.height(),
                units.len()
            ),
        )
        .into());
    }
    let labels = df.column(&params.label_col)?;
    let mut row_labels = Vec::with_capacity(units.len());
    for idx in 0..df.height() {
        row_labels.push(any_to_string(labels.get(idx)?));
    }

    let mut first = Vec::new();
    let mut second = Vec::new();
    let mut values = Vec::new();
    let mut combined = Vec::new();
    for (j, unit) in units.iter().enumerate() {
        let column = column_f64(df, unit)?;
        for (i, label) in row_labels.iter().enumerate().take(j) {
            first.push(label.clone());
            second.push(unit.clone());
            values.push(column[i]);
            combined.push(format!("{label}_{unit}"));
        }
    }

    Ok(DataFrame::new(vec![
        Series::new("neuron_1".into(), first).into_column(),
        Series::new("neuron_2".into(), second).into_column(),
        float_column("value", values),
        Series::new("neuron_combination".into(), combined).into_column(),
    ])?)
}
