//! Property tests for alignment invariants.

use neurobox_align::align_to_events;
use neurobox_model::AlignOptions;
use polars::prelude::{DataFrame, IntoColumn, NamedFrom, Series};
use proptest::prelude::*;

const GROUPS: [&str; 3] = ["a", "b", "c"];

fn table(rows: &[(usize, f64)], with_id: bool) -> DataFrame {
    let mut columns = vec![
        Series::new(
            "group".into(),
            rows.iter().map(|(g, _)| GROUPS[*g]).collect::<Vec<_>>(),
        )
        .into_column(),
        Series::new(
            "time".into(),
            rows.iter().map(|(_, t)| *t).collect::<Vec<_>>(),
        )
        .into_column(),
    ];
    if with_id {
        columns.push(
            Series::new("row_id".into(), (0..rows.len() as i64).collect::<Vec<_>>()).into_column(),
        );
    }
    DataFrame::new(columns).unwrap()
}

/// Brute-force distance to the latest event at or before `t`.
fn reference_latency(t: f64, group: usize, events: &[(usize, f64)]) -> Option<f64> {
    events
        .iter()
        .filter(|(g, e)| *g == group && *e <= t)
        .map(|(_, e)| t - e)
        .fold(None, |best: Option<f64>, d| Some(best.map_or(d, |b| b.min(d))))
}

fn row_strategy() -> impl Strategy<Value = (usize, f64)> {
    (0..GROUPS.len(), (0i32..200).prop_map(|t| f64::from(t) / 4.0))
}

proptest! {
    #[test]
    fn preserves_row_count_and_order(
        data in prop::collection::vec(row_strategy(), 0..40),
        events in prop::collection::vec(row_strategy(), 0..10),
    ) {
        let data_df = table(&data, true);
        let events_df = table(&events, false);

        let out = align_to_events(&data_df, &events_df, &AlignOptions::default()).unwrap();

        prop_assert_eq!(out.height(), data_df.height());
        let ids: Vec<Option<i64>> = out.column("row_id").unwrap().i64().unwrap().into_iter().collect();
        let expected: Vec<Option<i64>> = (0..data.len() as i64).map(Some).collect();
        prop_assert_eq!(ids, expected);
    }

    #[test]
    fn groups_without_events_are_null(
        data in prop::collection::vec(row_strategy(), 1..40),
        events in prop::collection::vec((0..2usize, (0i32..200).prop_map(|t| f64::from(t) / 4.0)), 0..10),
    ) {
        // Events never use group "c".
        let out = align_to_events(&table(&data, false), &table(&events, false), &AlignOptions::default()).unwrap();
        let aligned: Vec<Option<f64>> = out.column("aligned").unwrap().f64().unwrap().into_iter().collect();
        for ((group, _), value) in data.iter().zip(aligned) {
            if *group == 2 {
                prop_assert!(value.is_none());
            }
        }
    }

    #[test]
    fn max_latency_bounds_results(
        data in prop::collection::vec(row_strategy(), 1..40),
        events in prop::collection::vec(row_strategy(), 1..10),
        max_latency in (0i32..40).prop_map(|m| f64::from(m) / 2.0),
    ) {
        let options = AlignOptions::default().with_max_latency(max_latency);
        let out = align_to_events(&table(&data, false), &table(&events, false), &options).unwrap();
        let aligned: Vec<Option<f64>> = out.column("aligned").unwrap().f64().unwrap().into_iter().collect();

        for ((group, t), value) in data.iter().zip(aligned) {
            match reference_latency(*t, *group, &events) {
                Some(distance) if distance <= max_latency => prop_assert_eq!(value, Some(distance)),
                _ => prop_assert!(value.is_none()),
            }
        }
    }
}
