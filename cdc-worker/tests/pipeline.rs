use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time;

use assert_json_diff::assert_json_eq;
use cdc_common::change_event::ChangeType;
use cdc_common::transport::{TransportBatch, TransportRecord};
use cdc_worker::error::PipelineError;
use cdc_worker::fields::FieldResolver;
use cdc_worker::pipeline::{BatchSummary, Pipeline};
use cdc_worker::planner::BatchQueryPlanner;
use cdc_worker::publisher::Publisher;
use serde_json::json;

mod common;
use common::{change_event, contact_source, MemorySink, MemorySource, RecordingThrottle};

fn pipeline(
    source: &MemorySource,
    sink: &MemorySink,
    throttle: &RecordingThrottle,
    batch_size: usize,
    interval_seconds: u64,
) -> Pipeline {
    Pipeline::new(
        Arc::new(source.clone()),
        Arc::new(sink.clone()),
        Arc::new(throttle.clone()),
        NonZeroUsize::new(batch_size).unwrap(),
        time::Duration::from_secs(interval_seconds),
    )
}

fn batch(events: &[String]) -> TransportBatch {
    TransportBatch {
        records: events
            .iter()
            .map(|event| TransportRecord::from_change_event(event))
            .collect(),
    }
}

#[tokio::test]
async fn it_publishes_deduplicated_records_in_one_window() {
    let source = contact_source();
    let sink = MemorySink::default();
    let throttle = RecordingThrottle::default();
    let pipeline = pipeline(&source, &sink, &throttle, 2, 1);

    let summary = pipeline
        .process_batch(&batch(&[change_event(
            "Contact",
            "UPDATE",
            &["001", "002", "001"],
        )]))
        .await
        .expect("failed to process batch");

    assert_eq!(
        summary,
        BatchSummary {
            notifications: 1,
            records: 2
        }
    );
    assert_eq!(source.describes(), vec!["Contact"]);
    assert_eq!(
        source.queries(),
        vec!["SELECT Id,FirstName,LastName FROM Contact WHERE Id IN ('001','002')"]
    );
    assert_json_eq!(
        json!(sink.records()),
        json!([
            {
                "attributes": {"type": "Contact", "url": "/services/data/v59.0/sobjects/Contact/001"},
                "Id": "001",
                "FirstName": "Ada",
                "LastName": "Lovelace",
                "UIND": "UPDATE"
            },
            {
                "attributes": {"type": "Contact", "url": "/services/data/v59.0/sobjects/Contact/002"},
                "Id": "002",
                "FirstName": "Grace",
                "LastName": "Hopper",
                "UIND": "UPDATE"
            }
        ])
    );
    assert!(throttle.pauses().is_empty());
}

#[tokio::test]
async fn it_pauses_between_windows_only() {
    let source = contact_source();
    let sink = MemorySink::default();
    let throttle = RecordingThrottle::default();
    let pipeline = pipeline(&source, &sink, &throttle, 1, 3);

    pipeline
        .process_batch(&batch(&[change_event(
            "Contact",
            "CREATE",
            &["001", "002", "003"],
        )]))
        .await
        .expect("failed to process batch");

    assert_eq!(source.queries().len(), 3);
    assert_eq!(sink.len(), 3);
    assert_eq!(
        throttle.pauses(),
        vec![time::Duration::from_secs(3), time::Duration::from_secs(3)]
    );
}

#[tokio::test]
async fn it_pauses_between_notifications() {
    let source = contact_source();
    let sink = MemorySink::default();
    let throttle = RecordingThrottle::default();
    let pipeline = pipeline(&source, &sink, &throttle, 1, 1);

    let summary = pipeline
        .process_batch(&batch(&[
            change_event("Contact", "UPDATE", &["001"]),
            change_event("Contact", "UPDATE", &[]),
            change_event("Contact", "UPDATE", &["002"]),
            change_event("Contact", "DELETE", &["003"]),
        ]))
        .await
        .expect("failed to process batch");

    assert_eq!(summary.records, 3);
    assert_eq!(source.queries().len(), 3);
    assert_eq!(
        throttle.pauses(),
        vec![time::Duration::from_secs(1), time::Duration::from_secs(1)]
    );
}

#[tokio::test]
async fn it_does_not_pause_with_zero_interval() {
    let source = contact_source();
    let sink = MemorySink::default();
    let throttle = RecordingThrottle::default();
    let pipeline = pipeline(&source, &sink, &throttle, 1, 0);

    pipeline
        .process_batch(&batch(&[change_event(
            "Contact",
            "UPDATE",
            &["001", "002", "003"],
        )]))
        .await
        .expect("failed to process batch");

    assert_eq!(sink.len(), 3);
    assert!(throttle.pauses().is_empty());
}

#[tokio::test]
async fn it_processes_notifications_in_order() {
    let source = contact_source();
    let sink = MemorySink::default();
    let throttle = RecordingThrottle::default();
    let pipeline = pipeline(&source, &sink, &throttle, 10, 0);

    let summary = pipeline
        .process_batch(&batch(&[
            change_event("Contact", "CREATE", &["003"]),
            change_event("Contact", "DELETE", &["001"]),
        ]))
        .await
        .expect("failed to process batch");

    assert_eq!(summary.notifications, 2);
    let published: Vec<_> = sink
        .records()
        .iter()
        .map(|record| (record["Id"].clone(), record["UIND"].clone()))
        .collect();
    assert_eq!(
        published,
        vec![(json!("003"), json!("CREATE")), (json!("001"), json!("DELETE"))]
    );
    // One describe per notification, as nothing is cached.
    assert_eq!(source.describes(), vec!["Contact", "Contact"]);
}

#[tokio::test]
async fn it_reuses_cached_field_lists() {
    let source = contact_source();
    let sink = MemorySink::default();
    let throttle = RecordingThrottle::default();
    let pipeline = pipeline(&source, &sink, &throttle, 10, 0)
        .with_field_resolver(FieldResolver::cached(time::Duration::from_secs(60)));

    pipeline
        .process_batch(&batch(&[
            change_event("Contact", "UPDATE", &["001"]),
            change_event("Contact", "UPDATE", &["002"]),
        ]))
        .await
        .expect("failed to process batch");

    assert_eq!(source.describes(), vec!["Contact"]);
    assert_eq!(sink.len(), 2);
}

#[tokio::test]
async fn it_skips_notifications_without_record_ids() {
    let source = contact_source();
    let sink = MemorySink::default();
    let throttle = RecordingThrottle::default();
    let pipeline = pipeline(&source, &sink, &throttle, 1, 1);

    let summary = pipeline
        .process_batch(&batch(&[change_event("Contact", "UPDATE", &[])]))
        .await
        .expect("failed to process batch");

    assert_eq!(summary.records, 0);
    assert!(source.describes().is_empty());
    assert!(source.queries().is_empty());
    assert_eq!(sink.len(), 0);
}

#[tokio::test]
async fn it_fails_on_malformed_payload_before_querying() {
    let source = contact_source();
    let sink = MemorySink::default();
    let throttle = RecordingThrottle::default();
    let pipeline = pipeline(&source, &sink, &throttle, 1, 1);

    let mut malformed = TransportRecord::from_change_event("{}");
    malformed.kinesis.data = "%%% not base64 %%%".to_owned();
    let batch = TransportBatch {
        records: vec![
            malformed,
            TransportRecord::from_change_event(&change_event("Contact", "UPDATE", &["001"])),
        ],
    };

    let result = pipeline.process_batch(&batch).await;

    match result {
        Err(error @ PipelineError::Decode(_)) => assert!(!error.is_retryable()),
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(source.describes().is_empty());
    assert!(source.queries().is_empty());
    assert_eq!(sink.len(), 0);
}

#[tokio::test]
async fn it_stops_remaining_windows_on_query_failure() {
    let source = contact_source().failing();
    let sink = MemorySink::default();
    let throttle = RecordingThrottle::default();
    let pipeline = pipeline(&source, &sink, &throttle, 1, 1);

    let result = pipeline
        .process_batch(&batch(&[change_event(
            "Contact",
            "UPDATE",
            &["001", "002", "003"],
        )]))
        .await;

    assert!(matches!(result, Err(PipelineError::Query(_))));
    assert_eq!(source.queries().len(), 1);
    assert!(throttle.pauses().is_empty());
}

#[tokio::test]
async fn it_stops_remaining_windows_on_publish_failure() {
    let source = contact_source();
    let sink = MemorySink::failing_after(1);
    let throttle = RecordingThrottle::default();
    let pipeline = pipeline(&source, &sink, &throttle, 1, 1);

    let result = pipeline
        .process_batch(&batch(&[change_event(
            "Contact",
            "UPDATE",
            &["001", "002", "003"],
        )]))
        .await;

    assert!(matches!(result, Err(PipelineError::Publish(_))));
    assert_eq!(source.queries().len(), 2);
    assert_eq!(sink.len(), 1);
    assert_eq!(throttle.pauses().len(), 1);
}

#[tokio::test]
async fn it_publishes_windows_directly() {
    let source = contact_source();
    let sink = MemorySink::default();
    let throttle = RecordingThrottle::default();
    let publisher = Publisher::new(&source, &sink, &throttle, time::Duration::from_secs(1));

    let ids = vec!["'001'".to_owned(), "'002'".to_owned(), "'404'".to_owned()];
    let fields = vec!["Id".to_owned()];
    let planner = BatchQueryPlanner::new("Contact", &fields, &ids, NonZeroUsize::new(2).unwrap());

    let published = publisher
        .publish_windows(planner.windows(), ChangeType::Undelete)
        .await
        .expect("failed to publish windows");

    assert_eq!(published, 2);
    assert_eq!(
        source.queries(),
        vec![
            "SELECT Id FROM Contact WHERE Id IN ('001','002')",
            "SELECT Id FROM Contact WHERE Id IN ('404')",
        ]
    );
    assert_eq!(throttle.pauses(), vec![time::Duration::from_secs(1)]);
    assert!(sink
        .records()
        .iter()
        .all(|record| record["UIND"] == json!("UNDELETE")));
}
