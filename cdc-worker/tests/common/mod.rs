#![allow(dead_code)]
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time;

use async_trait::async_trait;
use axum::http::StatusCode;
use cdc_common::error::{PublishError, QueryError};
use cdc_common::record::SourceRecord;
use cdc_common::salesforce::RecordSource;
use cdc_common::sink::RecordSink;
use cdc_worker::publisher::Throttle;
use serde_json::{json, Value};

/// Serves records from memory, answering `Id IN (...)` queries with the records whose Id is listed.
#[derive(Clone, Default)]
pub struct MemorySource {
    fields: HashMap<String, Vec<String>>,
    records: HashMap<String, SourceRecord>,
    pub queries: Arc<Mutex<Vec<String>>>,
    pub describes: Arc<Mutex<Vec<String>>>,
    fail_queries: Option<StatusCode>,
}

impl MemorySource {
    pub fn with_entity(mut self, entity: &str, fields: &[&str]) -> Self {
        self.fields.insert(
            entity.to_owned(),
            fields.iter().map(|field| field.to_string()).collect(),
        );
        self
    }

    pub fn with_record(mut self, record: Value) -> Self {
        let Value::Object(record) = record else {
            panic!("records must be JSON objects");
        };
        let id = record["Id"].as_str().expect("records must have an Id").to_owned();
        self.records.insert(id, record);
        self
    }

    /// Answer every query as an unavailable instance would.
    pub fn failing(mut self) -> Self {
        self.fail_queries = Some(StatusCode::SERVICE_UNAVAILABLE);
        self
    }

    /// Answer every query as Salesforce answers a malformed one.
    pub fn rejecting(mut self) -> Self {
        self.fail_queries = Some(StatusCode::BAD_REQUEST);
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn describes(&self) -> Vec<String> {
        self.describes.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    async fn describe_fields(&self, entity: &str) -> Result<Vec<String>, QueryError> {
        self.describes.lock().unwrap().push(entity.to_owned());
        self.fields
            .get(entity)
            .cloned()
            .ok_or_else(|| QueryError::InvalidResponse(format!("unknown entity {}", entity)))
    }

    async fn query_all(&self, soql: &str) -> Result<Vec<SourceRecord>, QueryError> {
        self.queries.lock().unwrap().push(soql.to_owned());
        if let Some(status) = self.fail_queries {
            return Err(QueryError::Status {
                status,
                body: r#"[{"message":"query failed","errorCode":"MALFORMED_QUERY"}]"#.to_owned(),
            });
        }

        let start = soql.find("IN (").expect("query has no IN clause") + 4;
        let ids = &soql[start..soql.len() - 1];

        Ok(ids
            .split(',')
            .map(|id| id.trim_matches('\''))
            .filter_map(|id| self.records.get(id).cloned())
            .collect())
    }
}

/// Keeps every published record in memory. Can be told to fail after a number of writes.
#[derive(Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<Vec<u8>>>>,
    fail_after: Option<usize>,
}

impl MemorySink {
    pub fn failing_after(writes: usize) -> Self {
        Self {
            fail_after: Some(writes),
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn records(&self) -> Vec<Value> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .map(|data| serde_json::from_slice(data).expect("published record is not JSON"))
            .collect()
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn put_record(&self, data: Vec<u8>) -> Result<(), PublishError> {
        let mut records = self.records.lock().unwrap();
        if Some(records.len()) == self.fail_after {
            return Err(PublishError::Put {
                stream: "memory".to_owned(),
                error: "ServiceUnavailableException".to_owned(),
            });
        }
        records.push(data);
        Ok(())
    }
}

/// Records pauses instead of sleeping.
#[derive(Clone, Default)]
pub struct RecordingThrottle {
    pauses: Arc<Mutex<Vec<time::Duration>>>,
}

impl RecordingThrottle {
    pub fn pauses(&self) -> Vec<time::Duration> {
        self.pauses.lock().unwrap().clone()
    }
}

#[async_trait]
impl Throttle for RecordingThrottle {
    async fn pause(&self, interval: time::Duration) {
        self.pauses.lock().unwrap().push(interval);
    }
}

pub fn contact_source() -> MemorySource {
    MemorySource::default()
        .with_entity("Contact", &["Id", "FirstName", "LastName"])
        .with_record(json!({
            "attributes": {"type": "Contact", "url": "/services/data/v59.0/sobjects/Contact/001"},
            "Id": "001",
            "FirstName": "Ada",
            "LastName": "Lovelace"
        }))
        .with_record(json!({
            "attributes": {"type": "Contact", "url": "/services/data/v59.0/sobjects/Contact/002"},
            "Id": "002",
            "FirstName": "Grace",
            "LastName": "Hopper"
        }))
        .with_record(json!({
            "attributes": {"type": "Contact", "url": "/services/data/v59.0/sobjects/Contact/003"},
            "Id": "003",
            "FirstName": "Edsger",
            "LastName": "Dijkstra"
        }))
}

pub fn change_event(entity: &str, change_type: &str, ids: &[&str]) -> String {
    json!({
        "schema": "IeRuaY6cbI_HsV8Rv1Mc5g",
        "payload": {
            "ChangeEventHeader": {
                "entityName": entity,
                "changeType": change_type,
                "recordIds": ids,
                "commitTimestamp": 1612912679000_i64,
                "transactionKey": "0002343d-9d90-e395-ed20-cf416ba652ad"
            }
        },
        "event": {"replayId": 42}
    })
    .to_string()
}
