//! Pipeline steps: one transform bound to its parameter record.

use std::fmt;
use std::sync::Arc;

use neurobox_align::{align_to_events, get_closest_event, get_closest_event_idx};
use neurobox_model::{AlignOptions, ClosestEventOptions, ParameterError, StepParams};
use neurobox_transform::{
    BaselineParams, ColumnsParams, CombineColsParams, CorrelationParams, ExcludeAfterParams,
    FilterRowsParams, PivotParams, RenameParams, ResampleParams, SmoothParams,
    SortByActivityParams, StandardizeParams, TidyParams,
};
use polars::prelude::DataFrame;
use serde_json::{Map, Value};

use crate::error::PipelineError;

/// Signature of a user-supplied step.
pub type CustomFn = dyn Fn(&DataFrame) -> anyhow::Result<DataFrame> + Send + Sync;

/// A named closure used as a pipeline step.
///
/// Clones share the closure, which is immutable, so they stay independent.
#[derive(Clone)]
pub struct CustomStep {
    name: String,
    func: Arc<CustomFn>,
}

impl fmt::Debug for CustomStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomStep")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// One transform with its bound parameters.
#[derive(Debug, Clone)]
pub enum Step {
    Rename(RenameParams),
    DropCols(ColumnsParams),
    SelectCols(ColumnsParams),
    DropnaRows,
    FilterRows(FilterRowsParams),
    CombineCols(CombineColsParams),
    Pivot(PivotParams),
    ExcludeBaselineLong(BaselineParams),
    ExcludeBaselineWide(BaselineParams),
    ExcludeAfter(ExcludeAfterParams),
    Standardize(StandardizeParams),
    GaussianSmooth(SmoothParams),
    SortByActivityInRange(SortByActivityParams),
    Resample(ResampleParams),
    PairwiseCorrelation(CorrelationParams),
    CorrelationMatrixToTidy(TidyParams),
    AlignToEvents {
        events: DataFrame,
        options: AlignOptions,
    },
    ClosestEvent {
        events: DataFrame,
        options: ClosestEventOptions,
    },
    ClosestEventIdx {
        events: DataFrame,
        options: ClosestEventOptions,
    },
    Custom(CustomStep),
}

/// Names accepted by [`Step::from_params`].
pub const STEP_NAMES: &[&str] = &[
    "rename",
    "drop_cols",
    "select_cols",
    "dropna_rows",
    "filter_rows",
    "combine_cols",
    "pivot",
    "exclude_baseline_long",
    "exclude_baseline_wide",
    "exclude_after",
    "standardize",
    "gaussian_smooth",
    "sort_by_activity_in_range",
    "resample",
    "pairwise_correlation",
    "correlation_matrix_to_tidy",
    "align_to_events",
    "get_closest_event",
    "get_closest_event_idx",
];

impl Step {
    /// Wrap a closure as a step.
    pub fn custom<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&DataFrame) -> anyhow::Result<DataFrame> + Send + Sync + 'static,
    {
        Self::Custom(CustomStep {
            name: name.into(),
            func: Arc::new(func),
        })
    }

    pub fn align_to_events(events: DataFrame, options: AlignOptions) -> Self {
        Self::AlignToEvents { events, options }
    }

    pub fn closest_event(events: DataFrame, options: ClosestEventOptions) -> Self {
        Self::ClosestEvent { events, options }
    }

    pub fn closest_event_idx(events: DataFrame, options: ClosestEventOptions) -> Self {
        Self::ClosestEventIdx { events, options }
    }

    /// Build a step from its name and a JSON parameter object.
    ///
    /// Missing parameters take their defaults; `null` counts as an empty
    /// object. The three event steps need `events`, all others refuse it.
    ///
    /// # Errors
    ///
    /// [`PipelineError::UnknownStep`] for an unrecognised name,
    /// [`PipelineError::UnknownParameter`] for a key the step does not take and
    /// [`PipelineError::InvalidParameter`] when the parameters do not
    /// deserialize or fail validation.
    pub fn from_params(
        name: &str,
        params: Value,
        events: Option<DataFrame>,
    ) -> Result<Self, PipelineError> {
        let is_event_step = matches!(
            name,
            "align_to_events" | "get_closest_event" | "get_closest_event_idx"
        );
        let events = match (is_event_step, events) {
            (true, Some(events)) => Some(events),
            (true, None) => return Err(PipelineError::EventsRequired(name.to_string())),
            (false, Some(_)) => return Err(PipelineError::UnexpectedEvents(name.to_string())),
            (false, None) => None,
        };

        let step = match (name, events) {
            ("rename", _) => Self::Rename(parse(name, params)?),
            ("drop_cols", _) => Self::DropCols(parse(name, params)?),
            ("select_cols", _) => Self::SelectCols(parse(name, params)?),
            ("dropna_rows", _) => {
                if let Some(key) = object_of(name, params)?.keys().next() {
                    return Err(PipelineError::UnknownParameter {
                        step: name.to_string(),
                        name: key.clone(),
                    });
                }
                Self::DropnaRows
            }
            ("filter_rows", _) => Self::FilterRows(parse(name, params)?),
            ("combine_cols", _) => Self::CombineCols(parse(name, params)?),
            ("pivot", _) => Self::Pivot(parse(name, params)?),
            ("exclude_baseline_long", _) => Self::ExcludeBaselineLong(parse(name, params)?),
            ("exclude_baseline_wide", _) => Self::ExcludeBaselineWide(parse(name, params)?),
            ("exclude_after", _) => Self::ExcludeAfter(parse(name, params)?),
            ("standardize", _) => Self::Standardize(parse(name, params)?),
            ("gaussian_smooth", _) => Self::GaussianSmooth(parse(name, params)?),
            ("sort_by_activity_in_range", _) => {
                Self::SortByActivityInRange(parse(name, params)?)
            }
            ("resample", _) => Self::Resample(parse(name, params)?),
            ("pairwise_correlation", _) => Self::PairwiseCorrelation(parse(name, params)?),
            ("correlation_matrix_to_tidy", _) => {
                Self::CorrelationMatrixToTidy(parse(name, params)?)
            }
            ("align_to_events", Some(events)) => Self::AlignToEvents {
                events,
                options: overlay(name, &AlignOptions::default(), params)?,
            },
            ("get_closest_event", Some(events)) => Self::ClosestEvent {
                events,
                options: overlay(name, &ClosestEventOptions::event(), params)?,
            },
            ("get_closest_event_idx", Some(events)) => Self::ClosestEventIdx {
                events,
                options: overlay(name, &ClosestEventOptions::index(), params)?,
            },
            _ => return Err(PipelineError::UnknownStep(name.to_string())),
        };
        Ok(step)
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Rename(_) => "rename",
            Self::DropCols(_) => "drop_cols",
            Self::SelectCols(_) => "select_cols",
            Self::DropnaRows => "dropna_rows",
            Self::FilterRows(_) => "filter_rows",
            Self::CombineCols(_) => "combine_cols",
            Self::Pivot(_) => "pivot",
            Self::ExcludeBaselineLong(_) => "exclude_baseline_long",
            Self::ExcludeBaselineWide(_) => "exclude_baseline_wide",
            Self::ExcludeAfter(_) => "exclude_after",
            Self::Standardize(_) => "standardize",
            Self::GaussianSmooth(_) => "gaussian_smooth",
            Self::SortByActivityInRange(_) => "sort_by_activity_in_range",
            Self::Resample(_) => "resample",
            Self::PairwiseCorrelation(_) => "pairwise_correlation",
            Self::CorrelationMatrixToTidy(_) => "correlation_matrix_to_tidy",
            Self::AlignToEvents { .. } => "align_to_events",
            Self::ClosestEvent { .. } => "get_closest_event",
            Self::ClosestEventIdx { .. } => "get_closest_event_idx",
            Self::Custom(custom) => &custom.name,
        }
    }

    /// The events table bound to an alignment step.
    pub fn events(&self) -> Option<&DataFrame> {
        match self {
            Self::AlignToEvents { events, .. }
            | Self::ClosestEvent { events, .. }
            | Self::ClosestEventIdx { events, .. } => Some(events),
            _ => None,
        }
    }

    /// Check the bound parameter record.
    pub fn validate(&self) -> Result<(), ParameterError> {
        match self {
            Self::Rename(p) => p.validate(),
            Self::DropCols(p) | Self::SelectCols(p) => p.validate(),
            Self::FilterRows(p) => p.validate(),
            Self::CombineCols(p) => p.validate(),
            Self::Pivot(p) => p.validate(),
            Self::ExcludeBaselineLong(p) | Self::ExcludeBaselineWide(p) => p.validate(),
            Self::ExcludeAfter(p) => p.validate(),
            Self::Standardize(p) => p.validate(),
            Self::GaussianSmooth(p) => p.validate(),
            Self::SortByActivityInRange(p) => p.validate(),
            Self::Resample(p) => p.validate(),
            Self::PairwiseCorrelation(p) => p.validate(),
            Self::CorrelationMatrixToTidy(p) => p.validate(),
            Self::AlignToEvents { options, .. } => options.validate(),
            Self::ClosestEvent { options, .. } | Self::ClosestEventIdx { options, .. } => {
                options.validate()
            }
            Self::DropnaRows | Self::Custom(_) => Ok(()),
        }
    }

    /// The parameters as a JSON object keyed by parameter name.
    pub fn params(&self) -> Result<Value, PipelineError> {
        let name = self.name();
        match self {
            Self::Rename(p) => to_json(name, p),
            Self::DropCols(p) | Self::SelectCols(p) => to_json(name, p),
            Self::FilterRows(p) => to_json(name, p),
            Self::CombineCols(p) => to_json(name, p),
            Self::Pivot(p) => to_json(name, p),
            Self::ExcludeBaselineLong(p) | Self::ExcludeBaselineWide(p) => to_json(name, p),
            Self::ExcludeAfter(p) => to_json(name, p),
            Self::Standardize(p) => to_json(name, p),
            Self::GaussianSmooth(p) => to_json(name, p),
            Self::SortByActivityInRange(p) => to_json(name, p),
            Self::Resample(p) => to_json(name, p),
            Self::PairwiseCorrelation(p) => to_json(name, p),
            Self::CorrelationMatrixToTidy(p) => to_json(name, p),
            Self::AlignToEvents { options, .. } => to_json(name, options),
            Self::ClosestEvent { options, .. } | Self::ClosestEventIdx { options, .. } => {
                to_json(name, options)
            }
            Self::DropnaRows | Self::Custom(_) => Ok(Value::Object(Map::new())),
        }
    }

    /// Parameters as `(name, value)` pairs sorted by name.
    pub fn param_pairs(&self) -> Result<Vec<(String, Value)>, PipelineError> {
        let mut pairs: Vec<(String, Value)> = match self.params()? {
            Value::Object(map) => map.into_iter().collect(),
            _ => Vec::new(),
        };
        pairs.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(pairs)
    }

    /// Replace one named parameter.
    ///
    /// The record is rebuilt and validated before it replaces the old one,
    /// so a rejected edit leaves the step unchanged.
    pub fn set_param(&mut self, param: &str, value: Value) -> Result<(), PipelineError> {
        let step = self.name().to_string();
        match self {
            Self::Rename(p) => edit(&step, p, param, value),
            Self::DropCols(p) | Self::SelectCols(p) => edit(&step, p, param, value),
            Self::FilterRows(p) => edit(&step, p, param, value),
            Self::CombineCols(p) => edit(&step, p, param, value),
            Self::Pivot(p) => edit(&step, p, param, value),
            Self::ExcludeBaselineLong(p) | Self::ExcludeBaselineWide(p) => {
                edit(&step, p, param, value)
            }
            Self::ExcludeAfter(p) => edit(&step, p, param, value),
            Self::Standardize(p) => edit(&step, p, param, value),
            Self::GaussianSmooth(p) => edit(&step, p, param, value),
            Self::SortByActivityInRange(p) => edit(&step, p, param, value),
            Self::Resample(p) => edit(&step, p, param, value),
            Self::PairwiseCorrelation(p) => edit(&step, p, param, value),
            Self::CorrelationMatrixToTidy(p) => edit(&step, p, param, value),
            Self::AlignToEvents { options, .. } => edit(&step, options, param, value),
            Self::ClosestEvent { options, .. } | Self::ClosestEventIdx { options, .. } => {
                edit(&step, options, param, value)
            }
            Self::DropnaRows | Self::Custom(_) => Err(PipelineError::UnknownParameter {
                step,
                name: param.to_string(),
            }),
        }
    }

    /// Run the step on `df`, returning a new table.
    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame, PipelineError> {
        use neurobox_transform as t;

        let out = match self {
            Self::Rename(p) => t::rename(df, p)?,
            Self::DropCols(p) => t::drop_cols(df, p)?,
            Self::SelectCols(p) => t::select_cols(df, p)?,
            Self::DropnaRows => t::dropna_rows(df)?,
            Self::FilterRows(p) => t::filter_rows(df, p)?,
            Self::CombineCols(p) => t::combine_cols(df, p)?,
            Self::Pivot(p) => t::pivot(df, p)?,
            Self::ExcludeBaselineLong(p) => t::exclude_baseline_long(df, p)?,
            Self::ExcludeBaselineWide(p) => t::exclude_baseline_wide(df, p)?,
            Self::ExcludeAfter(p) => t::exclude_after(df, p)?,
            Self::Standardize(p) => t::standardize(df, p)?,
            Self::GaussianSmooth(p) => t::gaussian_smooth(df, p)?,
            Self::SortByActivityInRange(p) => t::sort_by_activity_in_range(df, p)?,
            Self::Resample(p) => t::resample(df, p)?,
            Self::PairwiseCorrelation(p) => t::pairwise_correlation(df, p)?,
            Self::CorrelationMatrixToTidy(p) => t::correlation_matrix_to_tidy(df, p)?,
            Self::AlignToEvents { events, options } => align_to_events(df, events, options)?,
            Self::ClosestEvent { events, options } => get_closest_event(df, events, options)?,
            Self::ClosestEventIdx { events, options } => {
                get_closest_event_idx(df, events, options)?
            }
            Self::Custom(custom) => (custom.func)(df).map_err(PipelineError::Custom)?,
        };
        Ok(out)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;
        match self.param_pairs() {
            Ok(pairs) => {
                for (name, value) in pairs {
                    write!(f, " {name}={value}")?;
                }
            }
            Err(_) => write!(f, " <unprintable parameters>")?,
        }
        if let Some(events) = self.events() {
            write!(f, " [events: {} rows]", events.height())?;
        }
        Ok(())
    }
}

fn object_of(step: &str, params: Value) -> Result<Map<String, Value>, PipelineError> {
    match params {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => Ok(map),
        other => Err(ParameterError::invalid(
            step,
            format!("parameters must be an object, got {other}"),
        )
        .into()),
    }
}

/// Deserialize a record, rejecting keys it does not have.
fn parse<P: StepParams>(step: &str, params: Value) -> Result<P, PipelineError> {
    let fields = object_of(step, params)?;
    let keys: Vec<String> = fields.keys().cloned().collect();
    let record: P = serde_json::from_value(Value::Object(fields))
        .map_err(|err| ParameterError::invalid(step, err.to_string()))?;
    if let Value::Object(known) = to_json(step, &record)?
        && let Some(key) = keys.into_iter().find(|key| !known.contains_key(key))
    {
        return Err(PipelineError::UnknownParameter {
            step: step.to_string(),
            name: key,
        });
    }
    record.validate()?;
    Ok(record)
}

/// Apply `params` on top of `base`; keys not given keep their base value.
fn overlay<P: StepParams>(step: &str, base: &P, params: Value) -> Result<P, PipelineError> {
    let provided = object_of(step, params)?;
    let Value::Object(mut fields) = to_json(step, base)? else {
        return Err(ParameterError::invalid(step, "parameters are not a record").into());
    };
    for (key, value) in provided {
        let Some(slot) = fields.get_mut(&key) else {
            return Err(PipelineError::UnknownParameter {
                step: step.to_string(),
                name: key,
            });
        };
        *slot = value;
    }
    let record: P = serde_json::from_value(Value::Object(fields))
        .map_err(|err| ParameterError::invalid(step, err.to_string()))?;
    record.validate()?;
    Ok(record)
}

fn to_json<P: StepParams>(step: &str, record: &P) -> Result<Value, PipelineError> {
    serde_json::to_value(record)
        .map_err(|err| ParameterError::invalid(step, err.to_string()).into())
}

fn edit<P: StepParams>(
    step: &str,
    record: &mut P,
    param: &str,
    value: Value,
) -> Result<(), PipelineError> {
    let mut change = Map::new();
    change.insert(param.to_string(), value);
    *record = overlay(step, record, Value::Object(change))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn from_params_fills_defaults() {
        let step = Step::from_params("pivot", Value::Null, None).unwrap();
        assert_eq!(step.params().unwrap()["neuron_col"], json!("neuron_id"));
    }

    #[test]
    fn every_listed_name_is_known() {
        for name in STEP_NAMES {
            let err = Step::from_params(name, json!({"not_a_param": 1}), None);
            assert!(!matches!(err, Err(PipelineError::UnknownStep(_))), "{name}");
        }
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Step::from_params("pivot", json!({"neuron": "unit"}), None).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::UnknownParameter { ref name, .. } if name == "neuron"
        ));
    }

    #[test]
    fn index_lookup_keeps_its_default_column() {
        let step = Step::from_params(
            "get_closest_event_idx",
            json!({"time_before": 1.0}),
            Some(DataFrame::empty()),
        )
        .unwrap();
        let params = step.params().unwrap();
        assert_eq!(params["returned_colname"], json!("event_index"));
        assert_eq!(params["time_before"], json!(1.0));
    }

    #[test]
    fn event_steps_require_events() {
        let err = Step::from_params("align_to_events", Value::Null, None).unwrap_err();
        assert!(matches!(err, PipelineError::EventsRequired(_)));

        let err = Step::from_params("rename", Value::Null, Some(DataFrame::empty())).unwrap_err();
        assert!(matches!(err, PipelineError::UnexpectedEvents(_)));
    }

    #[test]
    fn rejected_edit_keeps_record() {
        let mut step = Step::from_params("gaussian_smooth", json!({"sigma": 1.0}), None).unwrap();

        let err = step.set_param("sigma", json!(-2.0)).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidParameter(_)));
        assert_eq!(step.params().unwrap()["sigma"], json!(1.0));

        step.set_param("sigma", json!(2.5)).unwrap();
        assert_eq!(step.params().unwrap()["sigma"], json!(2.5));
    }

    #[test]
    fn flattened_column_roles_are_editable() {
        let mut step = Step::align_to_events(DataFrame::empty(), AlignOptions::default());
        step.set_param("data_group_col", json!("session")).unwrap();
        assert_eq!(step.params().unwrap()["data_group_col"], json!("session"));
    }
}
