//! Drive change notifications through collection, query planning and publishing.
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time;

use cdc_common::change_event::ChangeEventHeader;
use cdc_common::salesforce::RecordSource;
use cdc_common::sink::RecordSink;
use cdc_common::transport::{TransportBatch, TransportRecord};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::collector::EntityIdentifierSet;
use crate::error::PipelineError;
use crate::fields::FieldResolver;
use crate::planner::BatchQueryPlanner;
use crate::publisher::{Publisher, Throttle};

/// What a successfully processed batch amounted to.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct BatchSummary {
    pub notifications: usize,
    pub records: usize,
}

pub struct Pipeline {
    source: Arc<dyn RecordSource>,
    sink: Arc<dyn RecordSink>,
    throttle: Arc<dyn Throttle>,
    fields: FieldResolver,
    batch_size: NonZeroUsize,
    interval: time::Duration,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn RecordSource>,
        sink: Arc<dyn RecordSink>,
        throttle: Arc<dyn Throttle>,
        batch_size: NonZeroUsize,
        interval: time::Duration,
    ) -> Self {
        Self {
            source,
            sink,
            throttle,
            fields: FieldResolver::uncached(),
            batch_size,
            interval,
        }
    }

    pub fn with_field_resolver(mut self, fields: FieldResolver) -> Self {
        self.fields = fields;
        self
    }

    fn publisher(&self) -> Publisher<'_> {
        Publisher::new(
            self.source.as_ref(),
            self.sink.as_ref(),
            self.throttle.as_ref(),
            self.interval,
        )
    }

    /// Process every notification of `batch` in order. The first failure aborts the rest of the batch.
    /// Windows are throttled across the whole batch, not only within one notification.
    #[instrument(skip_all, fields(notifications = batch.records.len()))]
    pub async fn process_batch(&self, batch: &TransportBatch) -> Result<BatchSummary, PipelineError> {
        let publisher = self.publisher();
        let mut summary = BatchSummary::default();

        for record in &batch.records {
            match self.process_notification(&publisher, record).await {
                Ok(published) => {
                    summary.notifications += 1;
                    summary.records += published;
                }
                Err(error) => {
                    counter!("cdc_batch_failures_total", "cause" => error.cause()).increment(1);
                    error!(
                        event_id = record.event_id.as_deref().unwrap_or("unknown"),
                        "failed to process change notification: {}", error
                    );
                    return Err(error);
                }
            }
        }

        info!(
            notifications = summary.notifications,
            records = summary.records,
            "processed batch"
        );

        Ok(summary)
    }

    /// Decode one notification and publish the current state of every record it references.
    pub async fn process_notification(
        &self,
        publisher: &Publisher<'_>,
        record: &TransportRecord,
    ) -> Result<usize, PipelineError> {
        let header = record.decode()?;
        counter!("cdc_notifications_total").increment(1);

        self.process_header(publisher, &header).await
    }

    #[instrument(
        skip_all,
        fields(
            entity = %header.entity_name,
            change_type = %header.change_type,
            transaction_key = header.transaction_key.as_deref()
        )
    )]
    pub async fn process_header(
        &self,
        publisher: &Publisher<'_>,
        header: &ChangeEventHeader,
    ) -> Result<usize, PipelineError> {
        let identifiers = EntityIdentifierSet::from_header(header);
        let mut published = 0;

        for (entity_name, ids) in identifiers.iter() {
            if ids.is_empty() {
                info!("{} change holds no record ids, skipping", entity_name);
                continue;
            }

            let fields = self.fields.resolve(self.source.as_ref(), entity_name).await?;
            let planner = BatchQueryPlanner::new(entity_name, &fields, ids, self.batch_size);

            info!(
                "publishing {} {} records in {} windows",
                ids.len(),
                entity_name,
                planner.window_count()
            );

            published += publisher
                .publish_windows(planner.windows(), header.change_type)
                .await?;
        }

        Ok(published)
    }
}
