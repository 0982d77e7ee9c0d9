use neurobox_model::{AlignOptions, ClosestEventOptions, EventColumns, StepParams};

#[test]
fn align_options_defaults_match_column_conventions() {
    let options = AlignOptions::default();
    assert_eq!(options.returned_colname, "aligned");
    assert_eq!(options.columns.data_group_col, "group");
    assert_eq!(options.columns.events_group_col, "group");
    assert_eq!(options.columns.data_time_col, "time");
    assert_eq!(options.columns.events_time_col, "time");
    assert!(options.time_before_event.is_none());
    assert!(options.max_latency.is_none());
}

#[test]
fn closest_event_defaults_differ_by_lookup() {
    assert_eq!(ClosestEventOptions::event().returned_colname, "event");
    assert_eq!(ClosestEventOptions::index().returned_colname, "event_index");
    assert_eq!(ClosestEventOptions::default(), ClosestEventOptions::event());
}

#[test]
fn negative_bounds_are_rejected() {
    let options = AlignOptions::default().with_max_latency(-1.0);
    let err = options.validate().unwrap_err();
    assert!(err.to_string().contains("max_latency"));

    let options = ClosestEventOptions::index().with_time_before(-0.5);
    assert!(options.validate().is_err());
}

#[test]
fn blank_column_names_are_rejected() {
    let options = AlignOptions::default().with_columns(EventColumns::default().with_group_col(""));
    assert!(options.validate().is_err());
}

#[test]
fn options_serialize_flat() {
    let options = AlignOptions::default()
        .with_time_before_event(1.0)
        .with_columns(EventColumns::default().with_group_col("session"));
    let json = serde_json::to_value(&options).expect("serialize options");

    assert_eq!(json["time_before_event"], 1.0);
    assert_eq!(json["data_group_col"], "session");
    assert_eq!(json["events_group_col"], "session");
    assert!(json["max_latency"].is_null());

    let round: AlignOptions = serde_json::from_value(json).expect("deserialize options");
    assert_eq!(round, options);
}
