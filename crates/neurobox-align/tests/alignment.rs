//! Tests for the event alignment operations.

use neurobox_align::{
    AlignError, TableRole, align_to_events, get_closest_event, get_closest_event_idx,
};
use neurobox_model::{AlignOptions, ClosestEventOptions, EventColumns};
use polars::prelude::{DataFrame, DataType, IntoColumn, NamedFrom, Series, TimeUnit};

fn observations(groups: Vec<&str>, times: Vec<f64>) -> DataFrame {
    let value: Vec<f64> = (0..times.len()).map(|i| i as f64 * 10.0).collect();
    DataFrame::new(vec![
        Series::new("group".into(), groups).into_column(),
        Series::new("time".into(), times).into_column(),
        Series::new("value".into(), value).into_column(),
    ])
    .unwrap()
}

fn events(groups: Vec<&str>, times: Vec<f64>) -> DataFrame {
    DataFrame::new(vec![
        Series::new("group".into(), groups).into_column(),
        Series::new("time".into(), times).into_column(),
    ])
    .unwrap()
}

fn float_column(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name).unwrap().f64().unwrap().into_iter().collect()
}

fn int_column(df: &DataFrame, name: &str) -> Vec<Option<i64>> {
    df.column(name).unwrap().i64().unwrap().into_iter().collect()
}

fn scenario() -> (DataFrame, DataFrame) {
    (
        observations(vec!["A"; 4], vec![0.0, 5.0, 9.0, 15.0]),
        events(vec!["A", "A"], vec![4.0, 10.0]),
    )
}

#[test]
fn latency_without_bounds() {
    let (data, ev) = scenario();
    let out = align_to_events(&data, &ev, &AlignOptions::default()).unwrap();

    assert_eq!(
        float_column(&out, "aligned"),
        vec![None, Some(1.0), Some(5.0), Some(5.0)]
    );
    // Input columns are untouched.
    assert_eq!(float_column(&out, "value"), float_column(&data, "value"));
    assert!(data.column("aligned").is_err());
}

#[test]
fn latency_with_max_latency() {
    let (data, ev) = scenario();
    let options = AlignOptions::default().with_max_latency(3.0);
    let out = align_to_events(&data, &ev, &options).unwrap();

    assert_eq!(
        float_column(&out, "aligned"),
        vec![None, Some(1.0), None, None]
    );
}

#[test]
fn latency_with_look_ahead_is_signed() {
    let (data, ev) = scenario();
    let options = AlignOptions::default().with_time_before_event(1.0);
    let out = align_to_events(&data, &ev, &options).unwrap();
    assert_eq!(
        float_column(&out, "aligned"),
        vec![None, Some(1.0), Some(-1.0), Some(5.0)]
    );

    let options = options.with_max_latency(3.0);
    let out = align_to_events(&data, &ev, &options).unwrap();
    assert_eq!(
        float_column(&out, "aligned"),
        vec![None, Some(1.0), Some(-1.0), None]
    );
}

#[test]
fn closest_event_index_is_most_recent_preceding() {
    let (data, ev) = scenario();
    let out = get_closest_event_idx(&data, &ev, &ClosestEventOptions::index()).unwrap();
    assert_eq!(
        int_column(&out, "event_index"),
        vec![None, Some(0), Some(0), Some(1)]
    );

    let options = ClosestEventOptions::index().with_time_before(1.0);
    let out = get_closest_event_idx(&data, &ev, &options).unwrap();
    assert_eq!(
        int_column(&out, "event_index"),
        vec![None, Some(0), Some(1), Some(1)]
    );
}

#[test]
fn closest_event_reports_event_time() {
    let (data, ev) = scenario();
    let options = ClosestEventOptions::event().with_time_after(4.0);
    let out = get_closest_event(&data, &ev, &options).unwrap();
    assert_eq!(
        float_column(&out, "event"),
        vec![None, Some(4.0), None, None]
    );
}

#[test]
fn groups_are_aligned_independently() {
    let data = observations(vec!["A", "B", "A", "B"], vec![1.0, 1.0, 6.0, 6.0]);
    let ev = events(vec!["A", "B", "B"], vec![0.0, 2.0, 5.0]);

    let out = align_to_events(&data, &ev, &AlignOptions::default()).unwrap();
    assert_eq!(
        float_column(&out, "aligned"),
        vec![Some(1.0), None, Some(6.0), Some(1.0)]
    );

    let out = get_closest_event_idx(&data, &ev, &ClosestEventOptions::index()).unwrap();
    // Index is relative to each group's own event rows.
    assert_eq!(
        int_column(&out, "event_index"),
        vec![Some(0), None, Some(0), Some(1)]
    );
}

#[test]
fn group_missing_from_events_is_all_null() {
    let data = observations(vec!["A", "C", "C"], vec![5.0, 5.0, 50.0]);
    let ev = events(vec!["A"], vec![0.0]);

    let out = align_to_events(&data, &ev, &AlignOptions::default()).unwrap();
    assert_eq!(out.height(), 3);
    assert_eq!(
        float_column(&out, "aligned"),
        vec![Some(5.0), None, None]
    );
}

#[test]
fn integer_and_float_group_keys_match() {
    let data = DataFrame::new(vec![
        Series::new("session".into(), vec![1i64, 2]).into_column(),
        Series::new("t".into(), vec![3.0, 3.0]).into_column(),
    ])
    .unwrap();
    let ev = DataFrame::new(vec![
        Series::new("session".into(), vec![1.0f64, 2.0]).into_column(),
        Series::new("onset".into(), vec![1.0, 2.0]).into_column(),
    ])
    .unwrap();
    let columns = EventColumns {
        data_group_col: "session".to_string(),
        events_group_col: "session".to_string(),
        events_time_col: "onset".to_string(),
        data_time_col: "t".to_string(),
    };
    let options = AlignOptions::default()
        .with_columns(columns)
        .with_returned_colname("latency");

    let out = align_to_events(&data, &ev, &options).unwrap();
    assert_eq!(float_column(&out, "latency"), vec![Some(2.0), Some(1.0)]);
}

#[test]
fn missing_time_column_is_input_error() {
    let (data, _) = scenario();
    let ev = DataFrame::new(vec![Series::new("group".into(), vec!["A"]).into_column()]).unwrap();

    let err = align_to_events(&data, &ev, &AlignOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        AlignError::ColumnNotFound {
            table: TableRole::Events,
            ref column,
        } if column == "time"
    ));
}

#[test]
fn datetime_time_column_is_rejected() {
    let times = Series::new("time".into(), vec![5000i64, 9000])
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .unwrap();
    let data = DataFrame::new(vec![
        Series::new("group".into(), vec!["A", "A"]).into_column(),
        times.into_column(),
    ])
    .unwrap();
    let ev = events(vec!["A"], vec![4000.0]);

    let err = align_to_events(&data, &ev, &AlignOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        AlignError::NonNumericTime {
            table: TableRole::Data,
            ref column,
            ..
        } if column == "time"
    ));
}

#[test]
fn string_event_times_are_rejected() {
    let (data, _) = scenario();
    let ev = DataFrame::new(vec![
        Series::new("group".into(), vec!["A"]).into_column(),
        Series::new("time".into(), vec!["4s"]).into_column(),
    ])
    .unwrap();

    let err = get_closest_event_idx(&data, &ev, &ClosestEventOptions::index()).unwrap_err();
    assert!(matches!(
        err,
        AlignError::NonNumericTime {
            table: TableRole::Events,
            ..
        }
    ));
}

#[test]
fn integer_time_columns_align() {
    let data = DataFrame::new(vec![
        Series::new("group".into(), vec!["A", "A"]).into_column(),
        Series::new("time".into(), vec![5i64, 9]).into_column(),
    ])
    .unwrap();
    let ev = DataFrame::new(vec![
        Series::new("group".into(), vec!["A"]).into_column(),
        Series::new("time".into(), vec![4i32]).into_column(),
    ])
    .unwrap();

    let out = align_to_events(&data, &ev, &AlignOptions::default()).unwrap();
    assert_eq!(float_column(&out, "aligned"), vec![Some(1.0), Some(5.0)]);
}

#[test]
fn negative_bound_is_value_error() {
    let (data, ev) = scenario();
    let options = ClosestEventOptions::event().with_time_after(-1.0);
    let err = get_closest_event(&data, &ev, &options).unwrap_err();
    assert!(matches!(err, AlignError::InvalidParameter(_)));
}

#[test]
fn empty_observations_gain_result_column() {
    let data = observations(vec![], vec![]);
    let ev = events(vec!["A"], vec![1.0]);

    let out = align_to_events(&data, &ev, &AlignOptions::default()).unwrap();
    assert_eq!(out.height(), 0);
    assert!(out.column("aligned").is_ok());
}
