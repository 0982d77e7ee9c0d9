//! Nearest-event alignment.
//!
//! Three lookups share one matching rule (see [`crate::binning`]) and differ
//! only in what they write into the result column:
//!
//! | operation | result column | dtype |
//! |---|---|---|
//! | [`align_to_events`] | observation time minus event time | Float64 |
//! | [`get_closest_event`] | event timestamp | Float64 |
//! | [`get_closest_event_idx`] | event row position within its group | Int64 |
//!
//! Rows without a governing event, including every row of a group absent from
//! the event table, get a null in the result column. Row count and order of
//! the observation table are preserved.

use neurobox_common::{column_f64, has_column};
use neurobox_model::{AlignOptions, ClosestEventOptions, EventColumns, StepParams};
use polars::prelude::{DataFrame, DataType, IntoColumn, NamedFrom, Series};

use crate::binning::{EventEdges, Window};
use crate::error::{AlignError, TableRole};
use crate::group::{GroupOperation, apply_by_group};

/// What a lookup reports for each observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Latency,
    EventTime,
    EventIndex,
}

/// Per-group lookup, applied through [`apply_by_group`].
#[derive(Debug, Clone)]
pub struct EventLookup<'a> {
    pub kind: LookupKind,
    pub window: Window,
    pub columns: &'a EventColumns,
    pub returned_colname: &'a str,
}

impl GroupOperation for EventLookup<'_> {
    fn apply_group(&self, data: DataFrame, events: &DataFrame) -> Result<DataFrame, AlignError> {
        let queries = column_f64(&data, &self.columns.data_time_col)?;
        let edges = EventEdges::new(&column_f64(events, &self.columns.events_time_col)?);
        let name = self.returned_colname.into();
        let column = match self.kind {
            LookupKind::Latency => Series::new(name, edges.latencies(&queries, self.window)),
            LookupKind::EventTime => Series::new(name, edges.edges_for(&queries, self.window)),
            LookupKind::EventIndex => {
                Series::new(name, edges.positions_for(&queries, self.window))
            }
        };
        let mut out = data;
        out.with_column(column.into_column())?;
        Ok(out)
    }
}

/// Attach each observation's latency to its governing event.
///
/// Latency is `observation time - event time`: positive after the event, zero
/// on it, and negative (down to `-time_before_event`) for observations inside
/// the look-ahead window before an event.
///
/// The governing event is the most recent preceding one, not the nearest: with
/// events at 4 and 10 an observation at 9 gets latency 5 (event index 0), even
/// though 10 is closer. Use `time_before_event` to let a later event claim it.
///
/// # Errors
///
/// Returns [`AlignError::InvalidParameter`] for negative or non-finite bounds,
/// [`AlignError::ColumnNotFound`] when a group or time column is missing and
/// [`AlignError::NonNumericTime`] when a time column is not numeric.
pub fn align_to_events(
    data: &DataFrame,
    events: &DataFrame,
    options: &AlignOptions,
) -> Result<DataFrame, AlignError> {
    options.validate()?;
    let lookup = EventLookup {
        kind: LookupKind::Latency,
        window: Window::new(options.time_before_event, options.max_latency),
        columns: &options.columns,
        returned_colname: &options.returned_colname,
    };
    run_lookup(data, events, &lookup)
}

/// Attach the timestamp of each observation's governing event.
///
/// `time_before` acts as the look-ahead and `time_after` as the maximum
/// distance, with the same semantics as [`align_to_events`].
pub fn get_closest_event(
    data: &DataFrame,
    events: &DataFrame,
    options: &ClosestEventOptions,
) -> Result<DataFrame, AlignError> {
    options.validate()?;
    let lookup = EventLookup {
        kind: LookupKind::EventTime,
        window: Window::new(options.time_before, options.time_after),
        columns: &options.columns,
        returned_colname: &options.returned_colname,
    };
    run_lookup(data, events, &lookup)
}

/// Attach the zero-based position of each observation's governing event
/// within its group's rows of the event table.
///
/// The index can be used to join other event columns back onto observations.
pub fn get_closest_event_idx(
    data: &DataFrame,
    events: &DataFrame,
    options: &ClosestEventOptions,
) -> Result<DataFrame, AlignError> {
    options.validate()?;
    let lookup = EventLookup {
        kind: LookupKind::EventIndex,
        window: Window::new(options.time_before, options.time_after),
        columns: &options.columns,
        returned_colname: &options.returned_colname,
    };
    run_lookup(data, events, &lookup)
}

fn run_lookup(
    data: &DataFrame,
    events: &DataFrame,
    lookup: &EventLookup<'_>,
) -> Result<DataFrame, AlignError> {
    let columns = lookup.columns;
    for (column, table, df) in [
        (&columns.data_group_col, TableRole::Data, data),
        (&columns.data_time_col, TableRole::Data, data),
        (&columns.events_group_col, TableRole::Events, events),
        (&columns.events_time_col, TableRole::Events, events),
    ] {
        if !has_column(df, column) {
            return Err(AlignError::ColumnNotFound {
                column: column.clone(),
                table,
            });
        }
    }
    for (column, table, df) in [
        (&columns.data_time_col, TableRole::Data, data),
        (&columns.events_time_col, TableRole::Events, events),
    ] {
        let dtype = df.column(column)?.dtype();
        if !is_numeric_time(dtype) {
            return Err(AlignError::NonNumericTime {
                column: column.clone(),
                table,
                dtype: dtype.to_string(),
            });
        }
    }

    tracing::debug!(
        kind = ?lookup.kind,
        look_ahead = lookup.window.look_ahead,
        max_latency = ?lookup.window.max_latency,
        returned = %lookup.returned_colname,
        "aligning observations to events"
    );
    apply_by_group(
        data,
        events,
        &columns.data_group_col,
        &columns.events_group_col,
        lookup,
    )
}

/// Integer, float and all-null columns.
fn is_numeric_time(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
            | DataType::Null
    )
}
