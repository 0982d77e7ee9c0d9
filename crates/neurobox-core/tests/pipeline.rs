//! Integration tests for pipeline composition and execution.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use neurobox_core::{Pipeline, PipelineError, Step};
use neurobox_model::AlignOptions;
use neurobox_transform::{ColumnsParams, RenameParams, TransformError};
use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};
use serde_json::{Value, json};

fn test_df(columns: Vec<(&str, Vec<f64>)>) -> DataFrame {
    let cols: Vec<Column> = columns
        .into_iter()
        .map(|(name, values)| Series::new(name.into(), values).into_column())
        .collect();
    DataFrame::new(cols).unwrap()
}

fn abc() -> DataFrame {
    test_df(vec![
        ("a", vec![1.0, 2.0]),
        ("b", vec![3.0, 4.0]),
        ("c", vec![5.0, 6.0]),
    ])
}

fn names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|n| n.to_string()).collect()
}

fn rename_then_drop(from: &str, to: &str) -> Pipeline {
    Pipeline::new(vec![
        Step::Rename(RenameParams::single(from, to)),
        Step::DropCols(ColumnsParams::new(["c"])),
    ])
    .unwrap()
}

#[test]
fn test_rename_collision_aborts_pipeline() {
    let pipeline = rename_then_drop("a", "b");

    let err = pipeline.transform(&abc()).unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Transform(TransformError::ColumnExists(ref name)) if name == "b"
    ));
}

#[test]
fn test_steps_run_in_order() {
    let pipeline = rename_then_drop("a", "x");

    let out = pipeline.transform(&abc()).unwrap();

    assert_eq!(names(&out), vec!["x", "b"]);
    assert_eq!(pipeline.step_names(), vec!["rename", "drop_cols"]);
}

#[test]
fn test_transform_leaves_input_unchanged() {
    let input = abc();
    let pipeline = rename_then_drop("a", "x");

    pipeline.transform(&input).unwrap();

    assert_eq!(names(&input), vec!["a", "b", "c"]);
}

#[test]
fn test_empty_pipeline_returns_copy() {
    let input = abc();
    let out = Pipeline::default().transform(&input).unwrap();
    assert!(out.equals(&input));
}

#[test]
fn test_clone_runs_identically() {
    let pipeline = rename_then_drop("a", "x");
    let copy = pipeline.clone();

    let first = pipeline.transform(&abc()).unwrap();
    let second = copy.transform(&abc()).unwrap();

    assert!(first.equals_missing(&second));
}

#[test]
fn test_editing_clone_leaves_original() {
    let original = rename_then_drop("a", "x");
    let mut copy = original.clone();

    copy.edit_step_param(1, "columns", json!(["b"])).unwrap();

    assert_eq!(original.steps()[1].params().unwrap()["columns"], json!(["c"]));
    assert_eq!(copy.steps()[1].params().unwrap()["columns"], json!(["b"]));
    assert_eq!(names(&original.transform(&abc()).unwrap()), vec!["x", "b"]);
    assert_eq!(names(&copy.transform(&abc()).unwrap()), vec!["x", "c"]);
}

#[test]
fn test_insert_step_positions() {
    let mut pipeline = rename_then_drop("a", "x");

    pipeline.insert_step(0, Step::DropnaRows).unwrap();
    pipeline.insert_step(3, Step::DropnaRows).unwrap();

    assert_eq!(
        pipeline.step_names(),
        vec!["dropna_rows", "rename", "drop_cols", "dropna_rows"]
    );
    let err = pipeline.insert_step(9, Step::DropnaRows).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::StepIndexOutOfRange { index: 9, len: 4 }
    ));
}

#[test]
fn test_remove_step() {
    let mut pipeline = rename_then_drop("a", "x");

    let removed = pipeline.remove_step(0).unwrap();

    assert_eq!(removed.name(), "rename");
    assert_eq!(pipeline.len(), 1);
    assert!(pipeline.remove_step(1).is_err());
}

#[test]
fn test_edit_step_param_errors() {
    let mut pipeline = rename_then_drop("a", "x");

    let err = pipeline
        .edit_step_param(2, "columns", json!(["a"]))
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::StepIndexOutOfRange { index: 2, len: 2 }
    ));

    let err = pipeline
        .edit_step_param(0, "colums", json!({}))
        .unwrap_err();
    assert!(matches!(err, PipelineError::UnknownParameter { ref name, .. } if name == "colums"));

    let err = pipeline
        .edit_step_param(1, "columns", json!("c"))
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidParameter(_)));
}

#[test]
fn test_failing_step_stops_the_run() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let pipeline = Pipeline::new(vec![
        Step::custom("fail", |_df: &DataFrame| Err(anyhow::anyhow!("boom"))),
        Step::custom("count", move |df: &DataFrame| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(df.clone())
        }),
    ])
    .unwrap();

    let err = pipeline.transform(&abc()).unwrap_err();

    assert!(matches!(err, PipelineError::Custom(_)));
    assert_eq!(err.to_string(), "boom");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_alignment_step_in_pipeline() {
    let data = DataFrame::new(vec![
        Series::new("group".into(), vec!["A"; 4]).into_column(),
        Series::new("time".into(), vec![0.0, 5.0, 9.0, 15.0]).into_column(),
    ])
    .unwrap();
    let events = DataFrame::new(vec![
        Series::new("group".into(), vec!["A", "A"]).into_column(),
        Series::new("time".into(), vec![4.0, 10.0]).into_column(),
    ])
    .unwrap();
    let mut pipeline =
        Pipeline::new(vec![Step::align_to_events(events, AlignOptions::default())]).unwrap();

    pipeline
        .edit_step_param(0, "max_latency", json!(3.0))
        .unwrap();
    let out = pipeline.transform(&data).unwrap();

    let aligned: Vec<Option<f64>> = out
        .column("aligned")
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(aligned, vec![None, Some(1.0), None, None]);

    let err = pipeline
        .edit_step_param(0, "max_latency", json!(-1.0))
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidParameter(_)));
}

#[test]
fn test_pipeline_from_params() {
    let pipeline = Pipeline::new(vec![
        Step::from_params("select_cols", json!({"columns": ["c", "a"]}), None).unwrap(),
        Step::from_params("dropna_rows", Value::Null, None).unwrap(),
    ])
    .unwrap();

    let out = pipeline.transform(&abc()).unwrap();

    assert_eq!(names(&out), vec!["c", "a"]);
}

#[test]
fn test_pipeline_display() {
    let events = test_df(vec![("group", vec![1.0, 2.0]), ("time", vec![0.5, 1.5])]);
    let pipeline = Pipeline::new(vec![
        Step::Rename(RenameParams::single("a", "x")),
        Step::DropnaRows,
        Step::align_to_events(events, AlignOptions::default().with_max_latency(3.0)),
    ])
    .unwrap();

    insta::assert_snapshot!(pipeline.to_string().trim_end(), @r#"
    0: rename columns={"a":"x"}
    1: dropna_rows
    2: align_to_events data_group_col="group" data_time_col="time" events_group_col="group" events_time_col="time" max_latency=3.0 returned_colname="aligned" time_before_event=null [events: 2 rows]
    "#);
}
