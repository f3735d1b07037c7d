#![allow(clippy::unwrap_used, clippy::expect_used)]

use saverestore_core::errors::SaveRestoreError;
use saverestore_core::logging_facility::test_capture::init_test_capture;
use saverestore_core::{log_op_end, log_op_error, log_op_start};
use saverestore_core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name);

    capture.assert_event_exists(op_name, EVENT_START);
}

#[test]
fn test_log_op_start_carries_extra_fields() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_fields_unique_2";

    log_op_start!(op_name, node_id = 12_i64);

    let events = capture.events_for_op(op_name);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].field("node_id"), Some("12"));
    assert!(events[0].field("component").is_some());
}

#[test]
fn test_log_op_end_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_3";

    log_op_end!(op_name, duration_ms = 42_u64);

    let end_events: Vec<_> = capture
        .events_for_op(op_name)
        .into_iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_END))
        .collect();

    assert_eq!(end_events.len(), 1, "Should have exactly one end event");
    assert_eq!(end_events[0].field("duration_ms"), Some("42"));
}

#[test]
fn test_log_op_error_includes_kind_and_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_4";

    let err = SaveRestoreError::ConfigurationNotFound { node_id: 7 };
    log_op_error!(op_name, err, duration_ms = 10_u64);

    let error_events: Vec<_> = capture
        .events_for_op(op_name)
        .into_iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_END_ERROR))
        .collect();

    assert_eq!(error_events.len(), 1, "Should have exactly one error event");
    let event = &error_events[0];
    assert_eq!(event.level, tracing::Level::ERROR);
    assert_eq!(event.field("err_code"), Some("ERR_NOT_FOUND"));
    assert_eq!(event.field("err_kind"), Some("NotFound"));
}

#[test]
fn test_boundary_single_start_end() {
    let capture = init_test_capture();
    let op_name = "test_boundary_unique_5";

    log_op_start!(op_name, node_id = 1_i64);
    log_op_end!(op_name, duration_ms = 1_u64);

    let starts = capture.count_events(|e| {
        e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_START)
    });
    let ends = capture.count_events(|e| {
        e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END)
    });

    assert_eq!(starts, 1);
    assert_eq!(ends, 1);
}
