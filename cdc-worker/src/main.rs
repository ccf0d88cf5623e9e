//! Re-query Salesforce records named by CDC notifications and deliver them to Firehose.
use std::sync::Arc;

use anyhow::Error;
use cdc_common::metrics::{serve, setup_metrics_routes};
use cdc_worker::config::Config;
use cdc_worker::context::AppContext;
use cdc_worker::router::router;
use envconfig::Envconfig;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

fn setup_tracing() {
    let log_layer = tracing_subscriber::fmt::layer().with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(log_layer).init();
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    setup_tracing();
    info!("Starting up...");

    let config = Config::init_from_env()?;
    info!(
        batch_size = config.batch_size.get(),
        interval_seconds = config.interval().as_secs(),
        delivery_stream = config.target_delivery_stream.as_str(),
        "loaded configuration"
    );

    let context = Arc::new(AppContext::new(&config).await?);

    let router = if config.export_prometheus {
        setup_metrics_routes(router(context))?
    } else {
        router(context)
    };

    let bind = config.bind();
    info!("listening on {}", bind);
    serve(router, &bind).await?;

    Ok(())
}
