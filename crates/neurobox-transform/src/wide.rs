//! Transforms for wide-format tables.
//!
//! A wide table holds one time column and one numeric column per unit. The
//! time column keeps its position; every other column is treated as a unit.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use neurobox_common::column_f64;
use neurobox_model::{
    DEFAULT_TIME_COL, ParameterError, StepParams, require_column_name, require_non_negative,
    require_positive,
};
use polars::prelude::{Column, DataFrame};
use serde::{Deserialize, Serialize};

use crate::error::TransformError;
use crate::frame::{float_column, keep_rows, nan_to_none, time_values, unit_columns};
use crate::long::{BaselineParams, keep_from};

fn default_time_col() -> String {
    DEFAULT_TIME_COL.to_string()
}

/// Keep rows at or after `baseline_before`.
pub fn exclude_baseline_wide(
    df: &DataFrame,
    params: &BaselineParams,
) -> Result<DataFrame, TransformError> {
    keep_from(df, &params.time_col, params.baseline_before)
}

/// Parameters for [`exclude_after`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludeAfterParams {
    #[serde(default = "default_time_col")]
    pub time_col: String,
    pub max_time: f64,
}

impl StepParams for ExcludeAfterParams {
    fn validate(&self) -> neurobox_model::Result<()> {
        require_column_name("time_col", &self.time_col)?;
        if !self.max_time.is_finite() {
            return Err(ParameterError::invalid("max_time", "must be finite"));
        }
        Ok(())
    }
}

/// Keep rows at or before `max_time`.
pub fn exclude_after(
    df: &DataFrame,
    params: &ExcludeAfterParams,
) -> Result<DataFrame, TransformError> {
    let mask = time_values(df, &params.time_col)?
        .into_iter()
        .map(|t| t.is_some_and(|t| t <= params.max_time))
        .collect();
    keep_rows(df, mask)
}

/// Parameters for [`standardize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardizeParams {
    #[serde(default = "default_time_col")]
    pub time_col: String,
    /// Take mean and deviation from rows before this time only.
    #[serde(default)]
    pub baseline_before: Option<f64>,
}

impl Default for StandardizeParams {
    fn default() -> Self {
        Self {
            time_col: default_time_col(),
            baseline_before: None,
        }
    }
}

impl StepParams for StandardizeParams {
    fn validate(&self) -> neurobox_model::Result<()> {
        require_column_name("time_col", &self.time_col)?;
        if let Some(baseline) = self.baseline_before
            && !baseline.is_finite()
        {
            return Err(ParameterError::invalid("baseline_before", "must be finite"));
        }
        Ok(())
    }
}

/// Z-score every unit column using the population standard deviation.
///
/// With `baseline_before` the statistics come from rows with an earlier time
/// and are applied to the whole column. Nulls are left out of the statistics
/// and stay null. A column without variance becomes null.
pub fn standardize(
    df: &DataFrame,
    params: &StandardizeParams,
) -> Result<DataFrame, TransformError> {
    let times = time_values(df, &params.time_col)?;
    let in_reference: Vec<bool> = match params.baseline_before {
        Some(baseline) => times
            .iter()
            .map(|t| t.is_some_and(|t| t < baseline))
            .collect(),
        None => vec![true; times.len()],
    };

    map_units(df, &params.time_col, |values| {
        let reference: Vec<f64> = values
            .iter()
            .zip(&in_reference)
            .filter_map(|(v, keep)| if *keep { *v } else { None })
            .collect();
        let Some((mean, std)) = mean_and_std(&reference) else {
            return vec![None; values.len()];
        };
        if std == 0.0 {
            return vec![None; values.len()];
        }
        values
            .iter()
            .map(|v| v.map(|v| (v - mean) / std))
            .collect()
    })
}

fn mean_and_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, variance.sqrt()))
}

/// Parameters for [`gaussian_smooth`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothParams {
    #[serde(default = "default_time_col")]
    pub time_col: String,
    pub sigma: f64,
}

impl StepParams for SmoothParams {
    fn validate(&self) -> neurobox_model::Result<()> {
        require_column_name("time_col", &self.time_col)?;
        require_non_negative("sigma", self.sigma)
    }
}

/// Kernel radius in standard deviations.
const TRUNCATE: f64 = 4.0;

/// Largest kernel radius, in samples, that [`gaussian_smooth`] will build.
pub const MAX_KERNEL_RADIUS: i64 = 1_000_000;

/// Smooth every unit column with a 1-D gaussian kernel.
///
/// The kernel is cut at four standard deviations and the signal is mirrored
/// at both ends (`d c b a | a b c d | d c b a`). A null anywhere under the
/// kernel makes the output null. `sigma == 0` returns the table unchanged.
pub fn gaussian_smooth(df: &DataFrame, params: &SmoothParams) -> Result<DataFrame, TransformError> {
    time_values(df, &params.time_col)?;
    if params.sigma == 0.0 {
        return Ok(df.clone());
    }
    let kernel = gaussian_kernel(params.sigma)?;
    map_units(df, &params.time_col, |values| convolve_reflect(values, &kernel))
}

fn gaussian_kernel(sigma: f64) -> Result<Vec<f64>, ParameterError> {
    let radius = (TRUNCATE * sigma + 0.5).floor();
    if radius > MAX_KERNEL_RADIUS as f64 {
        return Err(ParameterError::invalid(
            "sigma",
            format!("kernel radius {radius} exceeds {MAX_KERNEL_RADIUS} samples"),
        ));
    }
    let radius = radius as i64;
    let weights: Vec<f64> = (-radius..=radius)
        .map(|x| (-0.5 * (x as f64 / sigma).powi(2)).exp())
        .collect();
    let total: f64 = weights.iter().sum();
    Ok(weights.into_iter().map(|w| w / total).collect())
}

fn reflect_index(idx: i64, len: i64) -> usize {
    let period = 2 * len;
    let mut i = idx.rem_euclid(period);
    if i >= len {
        i = period - i - 1;
    }
    i as usize
}

fn convolve_reflect(values: &[Option<f64>], kernel: &[f64]) -> Vec<Option<f64>> {
    let len = values.len() as i64;
    let radius = (kernel.len() / 2) as i64;
    (0..len)
        .map(|center| {
            let mut acc = 0.0;
            for (offset, weight) in (-radius..=radius).zip(kernel) {
                acc += values[reflect_index(center + offset, len)]? * weight;
            }
            Some(acc)
        })
        .collect()
}

/// How [`sort_by_activity_in_range`] summarises a unit's activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    #[default]
    Mean,
    Median,
    Min,
    Max,
    Sum,
}

impl Aggregation {
    /// `None` for an empty slice.
    pub fn apply(self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let value = match self {
            Self::Mean => values.iter().sum::<f64>() / values.len() as f64,
            Self::Sum => values.iter().sum(),
            Self::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Self::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Self::Median => {
                let mut sorted = values.to_vec();
                sorted.sort_by(f64::total_cmp);
                let mid = sorted.len() / 2;
                if sorted.len() % 2 == 0 {
                    (sorted[mid - 1] + sorted[mid]) / 2.0
                } else {
                    sorted[mid]
                }
            }
        };
        Some(value)
    }
}

/// Parameters for [`sort_by_activity_in_range`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortByActivityParams {
    #[serde(default = "default_time_col")]
    pub time_col: String,
    pub t_start: f64,
    pub t_stop: f64,
    #[serde(default)]
    pub aggregation: Aggregation,
}

impl StepParams for SortByActivityParams {
    fn validate(&self) -> neurobox_model::Result<()> {
        require_column_name("time_col", &self.time_col)?;
        if !(self.t_start.is_finite() && self.t_stop.is_finite()) {
            return Err(ParameterError::invalid("t_start", "range bounds must be finite"));
        }
        if self.t_start > self.t_stop {
            return Err(ParameterError::invalid(
                "t_stop",
                format!("{} is before t_start {}", self.t_stop, self.t_start),
            ));
        }
        Ok(())
    }
}

/// Reorder unit columns so the most active in `[t_start, t_stop]` come first.
///
/// Units without values in the range go last. Ties keep their original order.
pub fn sort_by_activity_in_range(
    df: &DataFrame,
    params: &SortByActivityParams,
) -> Result<DataFrame, TransformError> {
    let in_range: Vec<bool> = time_values(df, &params.time_col)?
        .into_iter()
        .map(|t| t.is_some_and(|t| t >= params.t_start && t <= params.t_stop))
        .collect();

    let mut scored = Vec::new();
    for unit in unit_columns(df, &params.time_col) {
        let values: Vec<f64> = column_f64(df, &unit)?
            .into_iter()
            .zip(&in_range)
            .filter_map(|(v, keep)| if *keep { v } else { None })
            .collect();
        scored.push((params.aggregation.apply(&values), unit));
    }
    scored.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    let mut order = vec![params.time_col.clone()];
    order.extend(scored.into_iter().map(|(_, unit)| unit));
    Ok(df.select(order)?)
}

/// Parameters for [`resample`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResampleParams {
    #[serde(default = "default_time_col")]
    pub time_col: String,
    /// Bin width in the units of the time column.
    pub interval: f64,
}

impl StepParams for ResampleParams {
    fn validate(&self) -> neurobox_model::Result<()> {
        require_column_name("time_col", &self.time_col)?;
        require_positive("interval", self.interval)
    }
}

/// Largest number of bins [`resample`] will emit.
pub const MAX_RESAMPLE_BINS: i64 = 10_000_000;

/// Average rows into fixed-width time bins labelled by their start.
///
/// Every bin from the first to the last populated one is emitted; bins with
/// no values hold null. Rows with a null time are dropped.
///
/// # Errors
///
/// [`TransformError::InvalidParameter`] when `interval` is so small relative
/// to the time span that more than [`MAX_RESAMPLE_BINS`] bins would be needed.
pub fn resample(df: &DataFrame, params: &ResampleParams) -> Result<DataFrame, TransformError> {
    let bins: Vec<Option<i64>> = time_values(df, &params.time_col)?
        .into_iter()
        .map(|t| t.map(|t| (t / params.interval).floor() as i64))
        .collect();
    let dropped = bins.iter().filter(|b| b.is_none()).count();
    if dropped > 0 {
        tracing::warn!(dropped, "resample dropped rows without a time");
    }
    let (Some(first), Some(last)) = (
        bins.iter().flatten().min().copied(),
        bins.iter().flatten().max().copied(),
    ) else {
        return Ok(df.clear());
    };
    let span = last.checked_sub(first).and_then(|d| d.checked_add(1));
    if !span.is_some_and(|n| n <= MAX_RESAMPLE_BINS) {
        return Err(ParameterError::invalid(
            "interval",
            format!(
                "{} is too small for the time span; more than {MAX_RESAMPLE_BINS} bins",
                params.interval
            ),
        )
        .into());
    }

    let mut columns: Vec<Column> = Vec::with_capacity(df.width());
    columns.push(float_column(
        &params.time_col,
        (first..=last)
            .map(|bin| Some(bin as f64 * params.interval))
            .collect(),
    ));
    for unit in unit_columns(df, &params.time_col) {
        let mut sums: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
        for (bin, value) in bins.iter().zip(column_f64(df, &unit)?) {
            if let (Some(bin), Some(value)) = (bin, value) {
                let entry = sums.entry(*bin).or_insert((0.0, 0));
                entry.0 += value;
                entry.1 += 1;
            }
        }
        let means = (first..=last)
            .map(|bin| sums.get(&bin).map(|(sum, n)| sum / *n as f64))
            .collect();
        columns.push(float_column(&unit, means));
    }
    Ok(DataFrame::new(columns)?)
}

/// Rebuild the table with `f` applied to every unit column.
fn map_units<F>(df: &DataFrame, time_col: &str, f: F) -> Result<DataFrame, TransformError>
where
    F: Fn(&[Option<f64>]) -> Vec<Option<f64>>,
{
    let mut out = df.clone();
    for unit in unit_columns(df, time_col) {
        let values = column_f64(df, &unit)?;
        let mapped = f(&values)
            .into_iter()
            .map(|v| v.and_then(nan_to_none))
            .collect();
        out.with_column(float_column(&unit, mapped))?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_is_normalised_and_symmetric() {
        let kernel = gaussian_kernel(1.0).unwrap();
        assert_eq!(kernel.len(), 9);
        assert!((kernel.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((kernel[0] - kernel[8]).abs() < 1e-15);
    }

    #[test]
    fn oversized_kernel_is_rejected() {
        assert!(gaussian_kernel(1e300).is_err());
        assert!(gaussian_kernel(f64::INFINITY).is_err());
        let widest = (MAX_KERNEL_RADIUS as f64 - 0.5) / TRUNCATE;
        assert!(gaussian_kernel(widest / 2.0).is_ok());
    }

    #[test]
    fn reflect_mirrors_about_the_edge() {
        assert_eq!(reflect_index(-1, 4), 0);
        assert_eq!(reflect_index(-2, 4), 1);
        assert_eq!(reflect_index(4, 4), 3);
        assert_eq!(reflect_index(5, 4), 2);
        assert_eq!(reflect_index(9, 4), 1);
    }

    #[test]
    fn median_of_even_count_averages_middle() {
        assert_eq!(Aggregation::Median.apply(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(Aggregation::Max.apply(&[]), None);
    }
}
