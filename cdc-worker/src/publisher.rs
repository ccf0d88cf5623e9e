use std::sync::atomic::{AtomicBool, Ordering};
use std::time;

use async_trait::async_trait;
use cdc_common::change_event::ChangeType;
use cdc_common::record::EnrichedRecord;
use cdc_common::salesforce::RecordSource;
use cdc_common::sink::RecordSink;
use metrics::{counter, histogram};
use tracing::info;

use crate::error::PipelineError;
use crate::planner::QueryWindow;

/// Delays processing between two query windows.
#[async_trait]
pub trait Throttle: Send + Sync {
    async fn pause(&self, interval: time::Duration);
}

/// Sleeps on the tokio timer.
pub struct TokioThrottle;

#[async_trait]
impl Throttle for TokioThrottle {
    async fn pause(&self, interval: time::Duration) {
        tokio::time::sleep(interval).await;
    }
}

/// Runs windowed queries against the source and writes every returned record, tagged with its
/// change type, to the sink.
///
/// Every window after the first one a publisher runs is preceded by a pause, whichever
/// notification or entity it belongs to.
pub struct Publisher<'p> {
    source: &'p dyn RecordSource,
    sink: &'p dyn RecordSink,
    throttle: &'p dyn Throttle,
    interval: time::Duration,
    started: AtomicBool,
}

impl<'p> Publisher<'p> {
    pub fn new(
        source: &'p dyn RecordSource,
        sink: &'p dyn RecordSink,
        throttle: &'p dyn Throttle,
        interval: time::Duration,
    ) -> Self {
        Self {
            source,
            sink,
            throttle,
            interval,
            started: AtomicBool::new(false),
        }
    }

    /// Fetch the records of one window and publish each of them, returning how many were published.
    pub async fn publish_window(
        &self,
        soql: &str,
        change_type: ChangeType,
    ) -> Result<usize, PipelineError> {
        counter!("cdc_queries_total").increment(1);
        let records = self.source.query_all(soql).await?;
        let fetched = records.len();

        for record in records {
            let record = EnrichedRecord::new(record, change_type);
            let data = record.to_bytes().map_err(cdc_common::error::PublishError::from)?;

            info!(record = %String::from_utf8_lossy(&data), "publishing record");
            self.sink.put_record(data).await?;
            counter!("cdc_records_published_total", "change_type" => change_type.as_str())
                .increment(1);
        }

        Ok(fetched)
    }

    /// Publish every window in order. The first failure stops processing of the remaining windows.
    pub async fn publish_windows<'a, I>(
        &self,
        windows: I,
        change_type: ChangeType,
    ) -> Result<usize, PipelineError>
    where
        I: IntoIterator<Item = QueryWindow<'a>>,
    {
        let mut published = 0;

        for window in windows {
            let resumed = self.started.swap(true, Ordering::Relaxed);
            if resumed && !self.interval.is_zero() {
                self.throttle.pause(self.interval).await;
            }

            let start = tokio::time::Instant::now();
            let count = self.publish_window(&window.soql, change_type).await?;
            histogram!("cdc_window_duration_seconds").record(start.elapsed().as_secs_f64());

            info!(
                ids = window.ids.len(),
                records = count,
                "published query window"
            );
            published += count;
        }

        Ok(published)
    }
}
