use std::sync::Arc;

use anyhow::Error;
use aws_config::BehaviorVersion;
use cdc_common::salesforce::SalesforceClient;
use cdc_common::sink::{FirehoseSink, PrintSink, RecordSink};
use tokio::sync::Mutex;
use tracing::info;

use crate::config::Config;
use crate::fields::FieldResolver;
use crate::pipeline::Pipeline;
use crate::publisher::TokioThrottle;

/// Process-wide state, built once at startup and shared by every request.
pub struct AppContext {
    /// Batches run one at a time, so the pipeline sits behind a lock.
    pub pipeline: Mutex<Pipeline>,
}

impl AppContext {
    pub fn from_pipeline(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Mutex::new(pipeline),
        }
    }

    pub async fn new(config: &Config) -> Result<Self, Error> {
        let source = SalesforceClient::connect(&config.salesforce).await?;
        info!(
            "connected to Salesforce instance {}",
            source.session().await.instance_url
        );

        let sink: Arc<dyn RecordSink> = if config.print_sink {
            Arc::new(PrintSink {})
        } else {
            let aws_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
            Arc::new(FirehoseSink::new(
                aws_sdk_firehose::Client::new(&aws_config),
                config.target_delivery_stream.as_str(),
            ))
        };

        let pipeline = Pipeline::new(
            Arc::new(source),
            sink,
            Arc::new(TokioThrottle),
            config.batch_size,
            config.interval(),
        )
        .with_field_resolver(FieldResolver::from_ttl(config.field_cache_ttl()));

        Ok(Self::from_pipeline(pipeline))
    }
}
