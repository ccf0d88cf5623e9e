use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use cdc_common::transport::TransportBatch;
use tracing::instrument;

use crate::context::AppContext;
use crate::error::PipelineError;
use crate::pipeline::BatchSummary;

pub async fn index() -> &'static str {
    "salesforce cdc worker"
}

/// Process a batch of change notifications. Decode errors answer 400, everything else that
/// fails answers 503 so the transport delivers the batch again.
#[instrument(skip_all)]
pub async fn process(
    State(context): State<Arc<AppContext>>,
    Json(batch): Json<TransportBatch>,
) -> Result<Json<BatchSummary>, PipelineError> {
    let pipeline = context.pipeline.lock().await;
    let summary = pipeline.process_batch(&batch).await?;

    Ok(Json(summary))
}

pub fn router(context: Arc<AppContext>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/_readiness", get(index))
        .route("/_liveness", get(index))
        .route("/process", post(process))
        .with_state(context)
}
