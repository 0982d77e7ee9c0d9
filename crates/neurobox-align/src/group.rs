//! Group matching across two tables.
//!
//! [`apply_by_group`] partitions an observation table and an event table by
//! their group columns, hands each observation partition together with the
//! event partition of the same key to a [`GroupOperation`], and stitches the
//! results back together in the original row order of the observation table.
//!
//! Observation groups without a counterpart (including rows whose key is
//! null) are still passed to the operation, paired with an empty event table
//! that keeps the event schema. No row is ever dropped.

use std::collections::BTreeMap;

use neurobox_common::{column_keys, has_column};
use polars::prelude::{DataFrame, IdxCa, IdxSize};

use crate::error::{AlignError, TableRole};

/// Work done on one matched pair of partitions.
///
/// The returned table must contain exactly the rows of `data`, in the same
/// order; operations are expected to append or replace columns only.
pub trait GroupOperation {
    fn apply_group(&self, data: DataFrame, events: &DataFrame) -> Result<DataFrame, AlignError>;
}

impl<F> GroupOperation for F
where
    F: Fn(DataFrame, &DataFrame) -> Result<DataFrame, AlignError>,
{
    fn apply_group(&self, data: DataFrame, events: &DataFrame) -> Result<DataFrame, AlignError> {
        self(data, events)
    }
}

/// Apply `operation` to every group of `data`, paired with the matching group of `events`.
///
/// # Errors
///
/// - [`AlignError::ColumnNotFound`] if either group column is missing.
/// - [`AlignError::GroupRowCountChanged`] if the operation adds or removes rows.
/// - Any error returned by the operation itself, unchanged.
pub fn apply_by_group<O>(
    data: &DataFrame,
    events: &DataFrame,
    data_group_col: &str,
    events_group_col: &str,
    operation: &O,
) -> Result<DataFrame, AlignError>
where
    O: GroupOperation + ?Sized,
{
    require_column(data, data_group_col, TableRole::Data)?;
    require_column(events, events_group_col, TableRole::Events)?;

    let empty_events = events.clear();
    if data.height() == 0 {
        return checked_apply(operation, data.clone(), &empty_events, "<empty>");
    }

    let data_groups = partition(&column_keys(data, data_group_col)?);
    let mut event_groups: BTreeMap<String, Vec<IdxSize>> = BTreeMap::new();
    for (key, rows) in partition(&column_keys(events, events_group_col)?) {
        if let Some(key) = key {
            event_groups.insert(key, rows);
        }
    }

    let mut order: Vec<usize> = Vec::with_capacity(data.height());
    let mut stacked: Option<DataFrame> = None;
    let mut unmatched = 0usize;

    for (key, rows) in &data_groups {
        let part = data.take(&row_index(rows))?;
        let label = key.as_deref().unwrap_or("<null>");
        let result = match key.as_ref().and_then(|k| event_groups.get(k)) {
            Some(event_rows) => {
                let event_part = events.take(&row_index(event_rows))?;
                checked_apply(operation, part, &event_part, label)?
            }
            None => {
                unmatched += 1;
                tracing::debug!(group = %label, "no matching event group");
                checked_apply(operation, part, &empty_events, label)?
            }
        };
        order.extend(rows.iter().map(|&row| row as usize));
        match stacked.as_mut() {
            Some(acc) => {
                acc.vstack_mut(&result)?;
            }
            None => stacked = Some(result),
        }
    }

    tracing::debug!(
        groups = data_groups.len(),
        unmatched,
        rows = data.height(),
        "applied operation by group"
    );

    let Some(stacked) = stacked else {
        return Ok(data.clone());
    };
    // `order[i]` is the original row of stacked row `i`; invert it.
    let mut restore = vec![0 as IdxSize; order.len()];
    for (stacked_row, &original_row) in order.iter().enumerate() {
        restore[original_row] = stacked_row as IdxSize;
    }
    Ok(stacked.take(&IdxCa::from_vec("restore".into(), restore))?)
}

fn require_column(df: &DataFrame, column: &str, table: TableRole) -> Result<(), AlignError> {
    if has_column(df, column) {
        Ok(())
    } else {
        Err(AlignError::ColumnNotFound {
            column: column.to_string(),
            table,
        })
    }
}

/// Row positions per key, keys in sorted order, positions ascending.
fn partition(keys: &[Option<String>]) -> BTreeMap<Option<String>, Vec<IdxSize>> {
    let mut groups: BTreeMap<Option<String>, Vec<IdxSize>> = BTreeMap::new();
    for (row, key) in keys.iter().enumerate() {
        groups.entry(key.clone()).or_default().push(row as IdxSize);
    }
    groups
}

fn row_index(rows: &[IdxSize]) -> IdxCa {
    IdxCa::from_vec("idx".into(), rows.to_vec())
}

fn checked_apply<O>(
    operation: &O,
    part: DataFrame,
    events: &DataFrame,
    label: &str,
) -> Result<DataFrame, AlignError>
where
    O: GroupOperation + ?Sized,
{
    let expected = part.height();
    let result = operation.apply_group(part, events)?;
    if result.height() != expected {
        return Err(AlignError::GroupRowCountChanged {
            group: label.to_string(),
            expected,
            actual: result.height(),
        });
    }
    Ok(result)
}
