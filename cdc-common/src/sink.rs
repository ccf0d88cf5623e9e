use async_trait::async_trait;
use aws_sdk_firehose::error::DisplayErrorContext;
use aws_sdk_firehose::primitives::Blob;
use aws_sdk_firehose::types::Record;
use metrics::counter;
use tracing::{debug, error, info};

use crate::error::PublishError;

/// The output stream enriched records are delivered to, one record per call.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn put_record(&self, data: Vec<u8>) -> Result<(), PublishError>;
}

/// Writes records to an Amazon Kinesis Data Firehose delivery stream.
#[derive(Clone)]
pub struct FirehoseSink {
    client: aws_sdk_firehose::Client,
    delivery_stream: String,
}

impl FirehoseSink {
    pub fn new(client: aws_sdk_firehose::Client, delivery_stream: &str) -> Self {
        info!("writing enriched records to delivery stream {}", delivery_stream);

        Self {
            client,
            delivery_stream: delivery_stream.to_owned(),
        }
    }

    pub fn delivery_stream(&self) -> &str {
        &self.delivery_stream
    }
}

#[async_trait]
impl RecordSink for FirehoseSink {
    async fn put_record(&self, data: Vec<u8>) -> Result<(), PublishError> {
        let record = Record::builder()
            .data(Blob::new(data))
            .build()
            .map_err(|e| PublishError::Build(e.to_string()))?;

        let output = self
            .client
            .put_record()
            .delivery_stream_name(&self.delivery_stream)
            .record(record)
            .send()
            .await
            .map_err(|e| {
                counter!("cdc_firehose_put_errors_total").increment(1);
                let error = DisplayErrorContext(&e).to_string();
                error!("failed to put record on {}: {}", self.delivery_stream, error);
                PublishError::Put {
                    stream: self.delivery_stream.clone(),
                    error,
                }
            })?;

        debug!(
            "put record {} on {}",
            output.record_id(),
            self.delivery_stream
        );

        Ok(())
    }
}

/// Logs records instead of delivering them, for local runs without AWS access.
pub struct PrintSink {}

#[async_trait]
impl RecordSink for PrintSink {
    async fn put_record(&self, data: Vec<u8>) -> Result<(), PublishError> {
        info!("record: {}", String::from_utf8_lossy(&data));

        Ok(())
    }
}
