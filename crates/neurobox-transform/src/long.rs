//! Transforms for long-format tables (one row per time, unit and value).

use std::cmp::Ordering;
use std::collections::HashMap;

use neurobox_common::{column_f64, column_keys, parse_f64};
use neurobox_model::{DEFAULT_TIME_COL, StepParams, require_column_name};
use polars::prelude::{Column, DataFrame};
use serde::{Deserialize, Serialize};

use crate::error::TransformError;
use crate::frame::{float_column, keep_rows, require_column, time_values};

fn default_time_col() -> String {
    DEFAULT_TIME_COL.to_string()
}

fn default_neuron_col() -> String {
    "neuron_id".to_string()
}

fn default_value_col() -> String {
    "value".to_string()
}

/// Parameters for [`pivot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotParams {
    #[serde(default = "default_neuron_col")]
    pub neuron_col: String,
    #[serde(default = "default_value_col")]
    pub value_col: String,
    #[serde(default = "default_time_col")]
    pub time_col: String,
}

impl Default for PivotParams {
    fn default() -> Self {
        Self {
            neuron_col: default_neuron_col(),
            value_col: default_value_col(),
            time_col: default_time_col(),
        }
    }
}

impl StepParams for PivotParams {
    fn validate(&self) -> neurobox_model::Result<()> {
        require_column_name("neuron_col", &self.neuron_col)?;
        require_column_name("value_col", &self.value_col)?;
        require_column_name("time_col", &self.time_col)
    }
}

/// Pivot a long table into a wide one: a time column followed by one column
/// per unit.
///
/// Rows are sorted by time. Unit columns are sorted numerically when every
/// unit id parses as a number, otherwise lexically. Cells with no
/// observation are null. Rows with a null time or unit are skipped.
///
/// # Errors
///
/// [`TransformError::DuplicateEntry`] when two rows share a time and unit.
pub fn pivot(df: &DataFrame, params: &PivotParams) -> Result<DataFrame, TransformError> {
    require_column(df, &params.neuron_col)?;
    require_column(df, &params.value_col)?;
    let times = time_values(df, &params.time_col)?;
    let units = column_keys(df, &params.neuron_col)?;
    let values = column_f64(df, &params.value_col)?;

    let mut rows = Vec::with_capacity(df.height());
    let mut skipped = 0usize;
    for ((time, unit), value) in times.into_iter().zip(units).zip(values) {
        match (time, unit) {
            (Some(time), Some(unit)) => {
                // -0.0 and 0.0 are one time point
                let time = if time == 0.0 { 0.0 } else { time };
                rows.push((time, unit, value));
            }
            _ => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::warn!(skipped, "pivot skipped rows with a missing time or unit");
    }

    let mut time_axis: Vec<f64> = rows.iter().map(|(t, _, _)| *t).collect();
    time_axis.sort_by(f64::total_cmp);
    time_axis.dedup_by(|a, b| a.total_cmp(b) == Ordering::Equal);

    let mut unit_axis: Vec<String> = rows.iter().map(|(_, u, _)| u.clone()).collect();
    unit_axis.sort();
    unit_axis.dedup();
    sort_unit_ids(&mut unit_axis);
    let unit_pos: HashMap<&str, usize> = unit_axis
        .iter()
        .enumerate()
        .map(|(pos, unit)| (unit.as_str(), pos))
        .collect();

    let mut cells: Vec<Vec<Option<f64>>> = vec![vec![None; time_axis.len()]; unit_axis.len()];
    let mut filled: Vec<Vec<bool>> = vec![vec![false; time_axis.len()]; unit_axis.len()];
    for (time, unit, value) in &rows {
        let row = time_axis.partition_point(|t| t.total_cmp(time) == Ordering::Less);
        let col = unit_pos[unit.as_str()];
        if filled[col][row] {
            return Err(TransformError::DuplicateEntry {
                time: *time,
                unit: unit.clone(),
            });
        }
        filled[col][row] = true;
        cells[col][row] = *value;
    }

    let mut columns: Vec<Column> = Vec::with_capacity(unit_axis.len() + 1);
    columns.push(float_column(
        &params.time_col,
        time_axis.into_iter().map(Some).collect(),
    ));
    for (unit, values) in unit_axis.iter().zip(cells) {
        columns.push(float_column(unit, values));
    }
    tracing::debug!(units = unit_axis.len(), "pivoted long table");
    Ok(DataFrame::new(columns)?)
}

/// Sort numerically if every id is a number; `ids` is already lexically sorted.
fn sort_unit_ids(ids: &mut [String]) {
    let numeric: Option<Vec<f64>> = ids.iter().map(|id| parse_f64(id)).collect();
    if numeric.is_some() {
        ids.sort_by(|a, b| {
            let a = parse_f64(a).unwrap_or(f64::NAN);
            let b = parse_f64(b).unwrap_or(f64::NAN);
            a.total_cmp(&b)
        });
    }
}

/// Parameters for the baseline filters of both long and wide tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineParams {
    #[serde(default = "default_time_col")]
    pub time_col: String,
    #[serde(default)]
    pub baseline_before: f64,
}

impl Default for BaselineParams {
    fn default() -> Self {
        Self {
            time_col: default_time_col(),
            baseline_before: 0.0,
        }
    }
}

impl StepParams for BaselineParams {
    fn validate(&self) -> neurobox_model::Result<()> {
        require_column_name("time_col", &self.time_col)?;
        if !self.baseline_before.is_finite() {
            return Err(neurobox_model::ParameterError::invalid(
                "baseline_before",
                "must be finite",
            ));
        }
        Ok(())
    }
}

/// Keep rows at or after `baseline_before`.
pub fn exclude_baseline_long(
    df: &DataFrame,
    params: &BaselineParams,
) -> Result<DataFrame, TransformError> {
    keep_from(df, &params.time_col, params.baseline_before)
}

pub(crate) fn keep_from(
    df: &DataFrame,
    time_col: &str,
    start: f64,
) -> Result<DataFrame, TransformError> {
    let mask = time_values(df, time_col)?
        .into_iter()
        .map(|t| t.is_some_and(|t| t >= start))
        .collect();
    keep_rows(df, mask)
}

#[cfg(test)]
mod tests {
    use polars::prelude::{NamedFrom, Series};

    use super::*;

    #[test]
    fn numeric_unit_ids_sort_by_value() {
        let mut ids = vec!["10".to_string(), "2".to_string(), "1".to_string()];
        ids.sort();
        sort_unit_ids(&mut ids);
        assert_eq!(ids, vec!["1", "2", "10"]);
    }

    #[test]
    fn signed_zero_times_share_a_row() {
        let df = DataFrame::new(vec![
            Series::new("neuron_id".into(), vec!["a", "b"]).into(),
            Series::new("time".into(), vec![-0.0, 0.0]).into(),
            Series::new("value".into(), vec![1.0, 2.0]).into(),
        ])
        .unwrap();

        let out = pivot(&df, &PivotParams::default()).unwrap();

        assert_eq!(out.height(), 1);
        let time = out.column("time").unwrap().f64().unwrap().get(0).unwrap();
        assert_eq!(time.to_bits(), 0.0f64.to_bits());
        assert_eq!(out.column("a").unwrap().f64().unwrap().get(0), Some(1.0));
        assert_eq!(out.column("b").unwrap().f64().unwrap().get(0), Some(2.0));
    }

    #[test]
    fn signed_zero_times_collide_for_one_unit() {
        let df = DataFrame::new(vec![
            Series::new("neuron_id".into(), vec!["a", "a"]).into(),
            Series::new("time".into(), vec![-0.0, 0.0]).into(),
            Series::new("value".into(), vec![1.0, 2.0]).into(),
        ])
        .unwrap();

        let err = pivot(&df, &PivotParams::default()).unwrap_err();
        assert!(matches!(err, TransformError::DuplicateEntry { .. }));
    }

    #[test]
    fn mixed_unit_ids_stay_lexical() {
        let mut ids = vec!["b".to_string(), "10".to_string(), "a".to_string()];
        ids.sort();
        sort_unit_ids(&mut ids);
        assert_eq!(ids, vec!["10", "a", "b"]);
    }
}
